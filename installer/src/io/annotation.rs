//! Best-effort build annotation for Podfiles that still use the Specs repo.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::podfile::{SPECS_REPO_TIP, is_using_specs_repo};
use crate::io::runner::{CommandRunner, CommandSpec};
use crate::io::step_log::StepLog;

/// Whether the Podfile at `path` declares the git Specs repo as a source.
pub fn podfile_uses_specs_repo(path: &Path) -> Result<bool> {
    let content = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(is_using_specs_repo(&content))
}

/// Suggest switching to the CDN source when the Podfile uses the Specs repo.
///
/// Nothing here can fail the step: read errors and annotation errors are
/// logged and dropped.
pub fn suggest_cdn_source<R, L>(runner: &R, log: &L, podfile: &Path, annotate: bool)
where
    R: CommandRunner + ?Sized,
    L: StepLog + ?Sized,
{
    match podfile_uses_specs_repo(podfile) {
        Ok(true) => {}
        Ok(false) => return,
        Err(err) => {
            debug!(err = %format!("{err:#}"), "skipping specs repo check");
            return;
        }
    }

    log.warn(SPECS_REPO_TIP.trim_end());
    if !annotate {
        return;
    }

    let args: Vec<String> = vec![
        "bitrise".into(),
        ":annotations".into(),
        "annotate".into(),
        SPECS_REPO_TIP.to_string(),
        "--style".into(),
        "info".into(),
    ];
    let result = CommandSpec::from_args(&args)
        .map_err(anyhow::Error::from)
        .and_then(|spec| runner.output(&spec).map_err(anyhow::Error::from));
    if let Err(err) = result {
        debug!(err = %format!("{err:#}"), "annotation failed");
    }
}
