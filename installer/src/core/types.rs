//! Shared deterministic types for the installer core.
//!
//! These types carry no I/O and are the contract between the build step,
//! the orchestrator and the argument builders.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Result, anyhow};

/// Primary pod operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PodSubcommand {
    /// `pod install`: respects the versions pinned in `Podfile.lock`.
    #[default]
    Install,
    /// `pod update`: may move pinned versions.
    Update,
}

impl PodSubcommand {
    pub fn as_str(self) -> &'static str {
        match self {
            PodSubcommand::Install => "install",
            PodSubcommand::Update => "update",
        }
    }
}

impl fmt::Display for PodSubcommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PodSubcommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "install" => Ok(PodSubcommand::Install),
            "update" => Ok(PodSubcommand::Update),
            other => Err(anyhow!(
                "invalid pod command: {other}, available: [install update]"
            )),
        }
    }
}

/// Parameters for one `install_pods` run.
///
/// `pod_args` is the invocation prefix (`["pod"]`, `["pod", "_1.11.3_"]`,
/// `["bundle", "exec", "pod"]`). It is never appended to in place; every
/// attempt builds its own argument vector from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub pod_args: Vec<String>,
    pub subcommand: PodSubcommand,
    pub podfile_dir: PathBuf,
    pub verbose: bool,
}

/// Where the CocoaPods executable used for the install comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CocoapodsSource {
    /// `Gemfile.lock` pins cocoapods: install the bundle and use `bundle exec pod`.
    Bundler,
    /// `Podfile.lock` pins a version: make sure the gem is present and use `pod _<version>_`.
    Gem(String),
    /// Nothing pinned: use whatever `pod` is on `PATH`.
    System,
}

impl CocoapodsSource {
    /// Pick the source from the versions found in the lockfiles.
    ///
    /// `Podfile.lock` wins over `Gemfile.lock`.
    pub fn from_lockfiles(
        podfile_lock_version: Option<&str>,
        gemfile_lock_version: Option<&str>,
    ) -> Self {
        match (podfile_lock_version, gemfile_lock_version) {
            (Some(version), _) => CocoapodsSource::Gem(version.to_string()),
            (None, Some(_)) => CocoapodsSource::Bundler,
            (None, None) => CocoapodsSource::System,
        }
    }
}

/// How Ruby is installed on the host; decides how `gem install` is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RubyInstallType {
    /// macOS system ruby at `/usr/bin/ruby` (gem install needs `sudo`).
    System,
    Brew,
    Rvm,
    /// rbenv shims need a `rbenv rehash` after installing a gem.
    Rbenv,
    Unknown,
}

impl RubyInstallType {
    /// Classify from the `which ruby` path and whether the version managers respond.
    pub fn detect(which_ruby: &str, rvm_available: bool, rbenv_available: bool) -> Self {
        let which_ruby = which_ruby.trim();
        if which_ruby == "/usr/bin/ruby" {
            RubyInstallType::System
        } else if which_ruby.starts_with("/usr/local/bin/")
            || which_ruby.starts_with("/opt/homebrew/")
        {
            RubyInstallType::Brew
        } else if rvm_available {
            RubyInstallType::Rvm
        } else if rbenv_available {
            RubyInstallType::Rbenv
        } else {
            RubyInstallType::Unknown
        }
    }
}
