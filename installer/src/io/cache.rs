//! CI cache registration for the Pods directory.
//!
//! The CI cache step reads newline separated `<path> -> <indicator>` entries
//! from an environment variable; we export the merged list with `envman`.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::io::config::CacheConfig;
use crate::io::runner::{CommandRunner, CommandSpec};
use crate::io::step_log::StepLog;

/// `<Pods dir> -> <Podfile.lock>`: the Pods cache is invalidated when the lockfile changes.
pub fn pods_cache_entry(podfile_dir: &Path) -> Result<String> {
    let podfile_dir = std::path::absolute(podfile_dir)
        .with_context(|| format!("expand {}", podfile_dir.display()))?;
    let pods_dir = podfile_dir.join("Pods");
    let podfile_lock = podfile_dir.join("Podfile.lock");
    Ok(format!("{} -> {}", pods_dir.display(), podfile_lock.display()))
}

/// Append `entry` to the existing include list unless it is already there.
pub fn merge_include_paths(existing: &str, entry: &str) -> Option<String> {
    if existing.lines().any(|line| line.trim() == entry) {
        return None;
    }
    let existing = existing.trim_end_matches('\n');
    if existing.is_empty() {
        Some(entry.to_string())
    } else {
        Some(format!("{existing}\n{entry}"))
    }
}

/// Register the Pods directory for caching.
///
/// `existing` is the current value of `config.env_key`. Failures are logged
/// as warnings and never fail the step.
pub fn register_pods_cache<R, L>(
    runner: &R,
    log: &L,
    config: &CacheConfig,
    existing: &str,
    podfile_dir: &Path,
) where
    R: CommandRunner + ?Sized,
    L: StepLog + ?Sized,
{
    log.info("Collecting Pod cache...");
    if !config.enabled {
        log.print("Cache collection disabled");
        return;
    }

    let entry = match pods_cache_entry(podfile_dir) {
        Ok(entry) => entry,
        Err(err) => {
            log.warn(&format!(
                "Cache collection skipped: failed to determine (Pods) dir path: {err:#}"
            ));
            return;
        }
    };

    let Some(value) = merge_include_paths(existing, &entry) else {
        debug!(entry = %entry, "cache path already registered");
        return;
    };

    let args: Vec<String> = vec![
        "envman".into(),
        "add".into(),
        "--key".into(),
        config.env_key.clone(),
        "--value".into(),
        value,
    ];
    let committed = CommandSpec::from_args(&args)
        .map_err(anyhow::Error::from)
        .and_then(|spec| runner.output(&spec).map_err(anyhow::Error::from));
    match committed {
        Ok(_) => log.done(&format!("Cache path registered: {entry}")),
        Err(err) => {
            debug!(err = %format!("{err:#}"), "envman add failed");
            log.warn("Cache collection skipped: failed to commit cache paths.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{LogLevel, RecordingLog, ScriptedRun, ScriptedRunner};

    #[test]
    fn merge_into_empty_list() {
        assert_eq!(
            merge_include_paths("", "/p/Pods -> /p/Podfile.lock").as_deref(),
            Some("/p/Pods -> /p/Podfile.lock")
        );
    }

    #[test]
    fn merge_appends_and_deduplicates() {
        let existing = "/p/node_modules -> /p/package-lock.json\n";
        assert_eq!(
            merge_include_paths(existing, "/p/Pods -> /p/Podfile.lock").as_deref(),
            Some("/p/node_modules -> /p/package-lock.json\n/p/Pods -> /p/Podfile.lock")
        );
        assert_eq!(
            merge_include_paths("/p/Pods -> /p/Podfile.lock", "/p/Pods -> /p/Podfile.lock"),
            None
        );
    }

    #[test]
    fn registers_with_envman() {
        let runner = ScriptedRunner::new();
        let log = RecordingLog::new();
        register_pods_cache(
            &runner,
            &log,
            &CacheConfig::default(),
            "",
            Path::new("/project/ios"),
        );
        let argvs = runner.argvs();
        assert_eq!(argvs.len(), 1);
        assert_eq!(&argvs[0][..4], ["envman", "add", "--key", "BITRISE_CACHE_INCLUDE_PATHS"]);
        assert_eq!(argvs[0][5], "/project/ios/Pods -> /project/ios/Podfile.lock");
    }

    #[test]
    fn envman_failure_is_only_a_warning() {
        let runner = ScriptedRunner::new().respond(
            &[
                "envman",
                "add",
                "--key",
                "BITRISE_CACHE_INCLUDE_PATHS",
                "--value",
                "/project/Pods -> /project/Podfile.lock",
            ],
            ScriptedRun::spawn_failure(),
        );
        let log = RecordingLog::new();
        register_pods_cache(&runner, &log, &CacheConfig::default(), "", Path::new("/project"));
        assert_eq!(
            log.at(LogLevel::Warn),
            vec!["Cache collection skipped: failed to commit cache paths.".to_string()]
        );
    }

    #[test]
    fn disabled_cache_runs_nothing() {
        let runner = ScriptedRunner::new();
        let log = RecordingLog::new();
        let config = CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        };
        register_pods_cache(&runner, &log, &config, "", Path::new("/project"));
        assert!(runner.calls().is_empty());
    }
}
