//! Ruby tooling: probing the environment and installing CocoaPods.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::args::{bundle_install_args, gem_install_commands};
use crate::core::lockfile::installed_cocoapods_versions;
use crate::core::types::RubyInstallType;
use crate::io::config::InstallerConfig;
use crate::io::runner::{CommandRunner, CommandSpec, run_echoed};
use crate::io::step_log::StepLog;

fn spec(args: &[&str]) -> Result<CommandSpec> {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    CommandSpec::from_args(&args)
}

/// Print the CocoaPods version found on `PATH`.
pub fn print_system_pod_version<R, L>(runner: &R, log: &L) -> Result<()>
where
    R: CommandRunner + ?Sized,
    L: StepLog + ?Sized,
{
    log.print("System installed cocoapods version:");
    run_echoed(runner, log, &spec(&["pod", "--version"])?, None)
        .context("read system cocoapods version")?;
    Ok(())
}

/// Whether `gem list` reports cocoapods at exactly `version`.
#[instrument(skip(runner))]
pub fn is_cocoapods_installed<R>(runner: &R, version: &str) -> Result<bool>
where
    R: CommandRunner + ?Sized,
{
    let out = runner
        .output(&spec(&["gem", "list"])?)
        .context("list installed gems")?;
    let versions = installed_cocoapods_versions(&out);
    debug!(?versions, "installed cocoapods versions");
    Ok(versions.iter().any(|v| v == version))
}

/// Work out how Ruby is installed.
///
/// Fails when no `ruby` is on `PATH`.
pub fn detect_ruby_install_type<R>(runner: &R) -> Result<RubyInstallType>
where
    R: CommandRunner + ?Sized,
{
    let which_ruby = runner
        .output(&spec(&["which", "ruby"])?)
        .context("no ruby is available")?;
    let detected = RubyInstallType::detect(&which_ruby, false, false);
    if detected != RubyInstallType::Unknown {
        return Ok(detected);
    }
    let rvm = runner.output(&spec(&["rvm", "-v"])?).is_ok();
    let rbenv = !rvm && runner.output(&spec(&["rbenv", "-v"])?).is_ok();
    Ok(RubyInstallType::detect(&which_ruby, rvm, rbenv))
}

/// Make sure cocoapods `version` is installed as a gem.
pub fn ensure_cocoapods_gem<R, L>(runner: &R, log: &L, version: &str, workdir: &Path) -> Result<()>
where
    R: CommandRunner + ?Sized,
    L: StepLog + ?Sized,
{
    log.print(&format!("Checking cocoapods {version} gem"));
    if is_cocoapods_installed(runner, version)? {
        log.print("Installed");
        return Ok(());
    }

    log.print("Installing");
    let ruby = detect_ruby_install_type(runner)?;
    debug!(?ruby, "ruby install type");
    for args in gem_install_commands(ruby, "cocoapods", version) {
        let cmd = CommandSpec::from_args(&args)?.in_dir(workdir);
        run_echoed(runner, log, &cmd, None)
            .with_context(|| format!("install cocoapods {version}"))?;
    }
    Ok(())
}

/// Install the bundle that pins cocoapods.
pub fn bundle_install<R, L>(
    runner: &R,
    log: &L,
    config: &InstallerConfig,
    workdir: &Path,
) -> Result<()>
where
    R: CommandRunner + ?Sized,
    L: StepLog + ?Sized,
{
    log.print("Install cocoapods with bundler");
    let args = bundle_install_args(config.bundle_install_jobs, config.bundle_install_retry);
    let cmd = CommandSpec::from_args(&args)?.in_dir(workdir);
    run_echoed(runner, log, &cmd, None).context("bundle install")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingLog, ScriptedRun, ScriptedRunner, argv};
    use std::path::PathBuf;

    #[test]
    fn installed_version_skips_gem_install() {
        let runner = ScriptedRunner::new().respond(
            &["gem", "list"],
            ScriptedRun::success_with_output("cocoapods (1.11.3, 1.10.0)\n"),
        );
        let log = RecordingLog::new();
        ensure_cocoapods_gem(&runner, &log, "1.11.3", Path::new("/project")).expect("ensure");
        assert_eq!(runner.argvs(), vec![argv(&["gem", "list"])]);
    }

    #[test]
    fn system_ruby_installs_with_sudo() {
        let runner = ScriptedRunner::new()
            .respond(
                &["gem", "list"],
                ScriptedRun::success_with_output("cocoapods (1.10.0)\n"),
            )
            .respond(
                &["which", "ruby"],
                ScriptedRun::success_with_output("/usr/bin/ruby\n"),
            );
        let log = RecordingLog::new();
        ensure_cocoapods_gem(&runner, &log, "1.11.3", Path::new("/project")).expect("ensure");

        let calls = runner.calls();
        assert_eq!(
            runner.argvs(),
            vec![
                argv(&["gem", "list"]),
                argv(&["which", "ruby"]),
                argv(&[
                    "sudo",
                    "gem",
                    "install",
                    "cocoapods",
                    "-v",
                    "1.11.3",
                    "--no-document"
                ]),
            ]
        );
        assert_eq!(calls[2].workdir, Some(PathBuf::from("/project")));
    }

    #[test]
    fn rbenv_is_probed_after_rvm_and_rehashed() {
        let runner = ScriptedRunner::new()
            .respond(
                &["which", "ruby"],
                ScriptedRun::success_with_output("/Users/vagrant/.rbenv/shims/ruby\n"),
            )
            .respond(&["rvm", "-v"], ScriptedRun::spawn_failure());
        let log = RecordingLog::new();
        ensure_cocoapods_gem(&runner, &log, "1.5.0", Path::new("/project")).expect("ensure");

        let argvs = runner.argvs();
        assert_eq!(argvs[2], argv(&["rvm", "-v"]));
        assert_eq!(argvs[3], argv(&["rbenv", "-v"]));
        assert_eq!(argvs[4][0], "gem");
        assert_eq!(argvs[5], argv(&["rbenv", "rehash"]));
    }

    #[test]
    fn missing_ruby_is_an_error() {
        let runner = ScriptedRunner::new().respond(&["which", "ruby"], ScriptedRun::exit(1, ""));
        let err = detect_ruby_install_type(&runner).unwrap_err();
        assert!(err.to_string().contains("no ruby is available"));
    }

    #[test]
    fn bundle_install_uses_config() {
        let runner = ScriptedRunner::new();
        let log = RecordingLog::new();
        let config = InstallerConfig {
            bundle_install_jobs: 8,
            bundle_install_retry: 2,
            ..InstallerConfig::default()
        };
        bundle_install(&runner, &log, &config, Path::new("/project")).expect("bundle");
        assert_eq!(
            runner.argvs(),
            vec![argv(&["bundle", "install", "--jobs", "8", "--retry", "2"])]
        );
    }

    #[test]
    fn failing_pod_version_is_fatal() {
        let runner =
            ScriptedRunner::new().respond(&["pod", "--version"], ScriptedRun::spawn_failure());
        let log = RecordingLog::new();
        let err = print_system_pod_version(&runner, &log).unwrap_err();
        assert!(format!("{err:#}").contains("failed to start `pod --version`"));
    }
}
