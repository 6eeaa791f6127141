//! `pod install` with a single repo-update retry.
//!
//! ```text
//! install --no-repo-update ──ok──────────────────────────────▶ done
//!        │ err (warn)
//!        ▼
//! repo update ──err──▶ InstallError::RepoUpdate
//!        │ ok
//!        ▼
//! install --no-repo-update ──ok──▶ done
//!                          └─err─▶ InstallError::Retry
//! ```
//!
//! The retry keeps `--no-repo-update`: the repo update already refreshed the
//! local specs, the install itself stays the same. Each invocation gets its
//! own [`CocoapodsErrorFinder`].

use std::path::Path;

use thiserror::Error;
use tracing::{info, instrument};

use crate::core::error_finder::CocoapodsErrorFinder;
use crate::core::types::{InstallRequest, PodSubcommand};
use crate::io::runner::{CommandError, CommandRunner, CommandSpec, run_echoed};
use crate::io::step_log::StepLog;

/// One failed pod invocation.
///
/// Displays the command failure itself; it is not chained as a source so the
/// rendered error chain does not repeat it.
#[derive(Debug, Error)]
#[error("{}{error}", transient_prefix(.transient))]
pub struct PodCommandError {
    /// curl reported a retryable network problem during this invocation.
    pub transient: bool,
    pub error: CommandError,
}

fn transient_prefix(transient: &bool) -> &'static str {
    if *transient { "transient error: " } else { "" }
}

/// Terminal failure of [`CocoapodsInstaller::install_pods`].
#[derive(Debug, Error)]
pub enum InstallError {
    /// The repo update run after the first failed install failed as well.
    #[error("pod repo update failed (pod install had failed with: {install})")]
    RepoUpdate {
        #[source]
        source: PodCommandError,
        install: PodCommandError,
    },
    /// The install failed again after a successful repo update.
    #[error("pod {subcommand} failed after repo update")]
    Retry {
        subcommand: PodSubcommand,
        #[source]
        source: PodCommandError,
    },
}

impl InstallError {
    /// The failure that ended the run.
    pub fn final_failure(&self) -> &PodCommandError {
        match self {
            InstallError::RepoUpdate { source, .. } | InstallError::Retry { source, .. } => source,
        }
    }

    /// Diagnostic lines of the final failure, for surfacing to the user.
    pub fn errors(&self) -> &[String] {
        self.final_failure().error.errors()
    }

    pub fn is_transient(&self) -> bool {
        self.final_failure().transient
    }
}

/// Runs pod commands through a [`CommandRunner`] and reports to a [`StepLog`].
pub struct CocoapodsInstaller<'a, R: ?Sized, L: ?Sized> {
    runner: &'a R,
    log: &'a L,
}

impl<'a, R, L> CocoapodsInstaller<'a, R, L>
where
    R: CommandRunner + ?Sized,
    L: StepLog + ?Sized,
{
    pub fn new(runner: &'a R, log: &'a L) -> Self {
        Self { runner, log }
    }

    /// Install pods, retrying once after `pod repo update` when the first attempt fails.
    ///
    /// At most three commands run: install, repo update, install.
    #[instrument(skip_all, fields(subcommand = %request.subcommand, podfile_dir = %request.podfile_dir.display()))]
    pub fn install_pods(&self, request: &InstallRequest) -> Result<(), InstallError> {
        let install_err = match self.run_pod_install(request) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        self.log.warn(&format!(
            "pod {} failed: {install_err}, retrying with repo update...",
            request.subcommand
        ));
        info!(transient = install_err.transient, "retrying after repo update");

        if let Err(source) = self.run_pod_repo_update(request) {
            return Err(InstallError::RepoUpdate {
                source,
                install: install_err,
            });
        }

        self.run_pod_install(request)
            .map_err(|source| InstallError::Retry {
                subcommand: request.subcommand,
                source,
            })
    }

    fn run_pod_install(&self, request: &InstallRequest) -> Result<(), PodCommandError> {
        self.run_pod_command(request.install_args(), &request.podfile_dir)
    }

    fn run_pod_repo_update(&self, request: &InstallRequest) -> Result<(), PodCommandError> {
        self.run_pod_command(request.repo_update_args(), &request.podfile_dir)
    }

    fn run_pod_command(&self, args: Vec<String>, workdir: &Path) -> Result<(), PodCommandError> {
        let mut args = args.into_iter();
        let spec = CommandSpec {
            program: args.next().unwrap_or_default(),
            args: args.collect(),
            workdir: Some(workdir.to_path_buf()),
        };

        let mut finder = CocoapodsErrorFinder::new();
        run_echoed(self.runner, self.log, &spec, Some(&mut finder)).map_err(|error| {
            PodCommandError {
                transient: finder.transient_problem_seen(),
                error,
            }
        })
    }
}
