//! Orchestration for the whole CocoaPods install build step.
//!
//! Resolves the Podfile, works out which CocoaPods to use from the lockfiles
//! next to it, installs that CocoaPods and finally hands over to
//! [`CocoapodsInstaller`].

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, instrument};

use crate::core::args::pod_base_args;
use crate::core::lockfile::{cocoapods_version_from_gemfile_lock, cocoapods_version_from_podfile_lock};
use crate::core::types::{CocoapodsSource, InstallRequest, PodSubcommand};
use crate::installer::CocoapodsInstaller;
use crate::io::annotation::suggest_cdn_source;
use crate::io::cache::register_pods_cache;
use crate::io::config::InstallerConfig;
use crate::io::discovery::find_most_root_podfile;
use crate::io::ruby::{bundle_install, ensure_cocoapods_gem, print_system_pod_version};
use crate::io::runner::CommandRunner;
use crate::io::step_log::StepLog;

const VERSION_SOURCE_NOTE: &str =
    "CocoaPods version is determined based on the Podfile.lock or the Gemfile.lock in the Podfile's directory.";

const TRANSIENT_FAILURE_NOTE: &str =
    "The last pod failure was a transient network problem, re-running the build may succeed.";

/// Resolved step inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepInputs {
    pub source_root_path: PathBuf,
    /// Explicit Podfile; disables discovery.
    pub podfile_path: Option<PathBuf>,
    pub pod_command: PodSubcommand,
    pub verbose: bool,
    /// Deprecated, only warned about.
    pub is_update_cocoapods: bool,
    /// Deprecated, only warned about.
    pub install_cocoapods_version: Option<String>,
    /// Current value of the cache include paths variable.
    pub cache_include_paths: String,
}

impl Default for StepInputs {
    fn default() -> Self {
        Self {
            source_root_path: PathBuf::from("."),
            podfile_path: None,
            pod_command: PodSubcommand::Install,
            verbose: false,
            is_update_cocoapods: false,
            install_cocoapods_version: None,
            cache_include_paths: String::new(),
        }
    }
}

impl StepInputs {
    pub fn validate(&self) -> Result<()> {
        if self.source_root_path.as_os_str().is_empty() {
            bail!("no SourceRootPath parameter specified");
        }
        if !self.source_root_path.is_dir() {
            bail!(
                "SourceRootPath does not exist at: {}",
                self.source_root_path.display()
            );
        }
        if let Some(podfile) = &self.podfile_path {
            if !podfile.exists() {
                bail!("PodfilePath does not exist at: {}", podfile.display());
            }
        }
        Ok(())
    }

    fn print<L: StepLog + ?Sized>(&self, log: &L) {
        log.info("Configs:");
        log.print(&format!("- SourceRootPath: {}", self.source_root_path.display()));
        log.print(&format!(
            "- PodfilePath: {}",
            self.podfile_path
                .as_deref()
                .map(|path| path.display().to_string())
                .unwrap_or_default()
        ));
        log.print(&format!("- PodCommand: {}", self.pod_command));
        log.print(&format!("- Verbose: {}", self.verbose));
        log.print(&format!("- IsUpdateCocoapods: {}", self.is_update_cocoapods));
        log.print(&format!(
            "- InstallCocoapodsVersion: {}",
            self.install_cocoapods_version.as_deref().unwrap_or_default()
        ));
    }

    fn warn_deprecated<L: StepLog + ?Sized>(&self, log: &L) {
        if self.is_update_cocoapods {
            log.warn("`is_update_cocoapods` is deprecated!");
            log.warn(VERSION_SOURCE_NOTE);
        }
        if self
            .install_cocoapods_version
            .as_deref()
            .is_some_and(|version| !version.is_empty())
        {
            log.warn("`install_cocoapods_version` is deprecated!");
            log.warn(VERSION_SOURCE_NOTE);
        }
    }
}

/// Run the build step end to end.
#[instrument(skip_all, fields(source_root = %inputs.source_root_path.display()))]
pub fn run_step<R, L>(
    inputs: &StepInputs,
    config: &InstallerConfig,
    runner: &R,
    log: &L,
) -> Result<()>
where
    R: CommandRunner + ?Sized,
    L: StepLog + ?Sized,
{
    inputs.print(log);
    inputs.validate().context("Issue with input")?;
    inputs.warn_deprecated(log);

    log.info("Checking CocoaPods");
    print_system_pod_version(runner, log)?;

    let podfile = resolve_podfile(inputs, log)?;
    let podfile_dir = podfile
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("Podfile has no parent directory: {}", podfile.display()))?;
    suggest_cdn_source(runner, log, &podfile, config.annotate_specs_repo);

    log.info("Determining required cocoapods version");
    let podfile_lock_version = podfile_lock_version(&podfile_dir, log)?;
    register_pods_cache(
        runner,
        log,
        &config.cache,
        &inputs.cache_include_paths,
        &podfile_dir,
    );
    let gemfile_lock_version = match podfile_lock_version {
        Some(_) => None,
        None => gemfile_lock_version(&podfile_dir, log)?,
    };
    let source = CocoapodsSource::from_lockfiles(
        podfile_lock_version.as_deref(),
        gemfile_lock_version.as_deref(),
    );
    debug!(?source, "cocoapods source");

    log.info("Install cocoapods version");
    match &source {
        CocoapodsSource::Bundler => bundle_install(runner, log, config, &podfile_dir)?,
        CocoapodsSource::Gem(version) => ensure_cocoapods_gem(runner, log, version, &podfile_dir)?,
        CocoapodsSource::System => log.print("Using system installed cocoapods"),
    }

    log.info("Installing Pods");
    let request = InstallRequest {
        pod_args: pod_base_args(&source),
        subcommand: inputs.pod_command,
        podfile_dir,
        verbose: inputs.verbose,
    };
    if let Err(err) = CocoapodsInstaller::new(runner, log).install_pods(&request) {
        debug!(errors = ?err.errors(), transient = err.is_transient(), "pod install failed");
        if err.is_transient() {
            log.warn(TRANSIENT_FAILURE_NOTE);
        }
        return Err(err.into());
    }

    log.done("Success!");
    Ok(())
}

fn resolve_podfile<L: StepLog + ?Sized>(inputs: &StepInputs, log: &L) -> Result<PathBuf> {
    if let Some(podfile) = &inputs.podfile_path {
        let podfile = std::path::absolute(podfile)
            .with_context(|| format!("Failed to expand ({})", podfile.display()))?;
        log.info(&format!("Using Podfile: {}", podfile.display()));
        return Ok(podfile);
    }

    log.info("Searching for Podfile");
    let podfile = find_most_root_podfile(&inputs.source_root_path)
        .context("Failed to find Podfile")?
        .ok_or_else(|| anyhow!("No Podfile found"))?;
    log.done(&format!("Found Podfile: {}", podfile.display()));
    Ok(podfile)
}

fn podfile_lock_version<L: StepLog + ?Sized>(podfile_dir: &Path, log: &L) -> Result<Option<String>> {
    log.print("Searching for Podfile.lock");
    let path = podfile_dir.join("Podfile.lock");
    if !path.exists() {
        log.warn(&format!("No Podfile.lock found at: {}", path.display()));
        log.warn("Make sure it's committed into your repository!");
        return Ok(None);
    }

    log.print(&format!("Found Podfile.lock: {}", path.display()));
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to determine CocoaPods version from {}", path.display()))?;
    let version = cocoapods_version_from_podfile_lock(&content);
    match &version {
        Some(version) => log.done(&format!(
            "Required CocoaPods version (from Podfile.lock): {version}"
        )),
        None => log.warn(&format!(
            "No CocoaPods version found in Podfile.lock! ({})",
            path.display()
        )),
    }
    Ok(version)
}

fn gemfile_lock_version<L: StepLog + ?Sized>(podfile_dir: &Path, log: &L) -> Result<Option<String>> {
    log.print("Searching for Gemfile.lock with cocoapods gem");
    let path = podfile_dir.join("Gemfile.lock");
    if !path.exists() {
        log.print(&format!(
            "No Gemfile.lock with cocoapods gem found at: {}",
            path.display()
        ));
        log.done("Using system installed CocoaPods version");
        return Ok(None);
    }

    let content = fs::read_to_string(&path).with_context(|| {
        format!("Failed to check if Gemfile.lock contains cocoapods: {}", path.display())
    })?;
    let version = cocoapods_version_from_gemfile_lock(&content);
    if let Some(version) = &version {
        log.print(&format!("Found Gemfile.lock: {}", path.display()));
        log.done(&format!("Gemfile.lock defined cocoapods version: {version}"));
    }
    Ok(version)
}
