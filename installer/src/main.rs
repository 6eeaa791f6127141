//! CocoaPods install build step.
//!
//! Finds the project's Podfile, installs the CocoaPods version its lockfiles
//! ask for and runs `pod install`, retrying once after `pod repo update`.
//! Every input can come from a flag or from the CI step's environment.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use installer::core::types::PodSubcommand;
use installer::exit_codes;
use installer::io::config::{InstallerConfig, load_config};
use installer::io::runner::SystemRunner;
use installer::io::step_log::{ConsoleLog, StepLog};
use installer::logging;
use installer::step::{StepInputs, run_step};

/// CI steps export unset inputs as empty variables, so every input is taken
/// as a string and an empty value means "use the default".
#[derive(Debug, Parser)]
#[command(
    name = "cocoapods-install",
    version,
    about = "Install CocoaPods dependencies, retrying once after a specs repo update"
)]
struct Cli {
    /// Directory searched for the most root Podfile [default: .]
    #[arg(long, env = "source_root_path")]
    source_root_path: Option<String>,

    /// Podfile to use instead of searching for one.
    #[arg(long, env = "podfile_path")]
    podfile_path: Option<String>,

    /// Pod operation to run: install or update [default: install]
    #[arg(long, env = "pod_command")]
    pod_command: Option<String>,

    /// Pass `--verbose` to pod: true or false [default: false]
    #[arg(long, env = "verbose")]
    verbose: Option<String>,

    /// Deprecated: the CocoaPods version comes from the lockfiles.
    #[arg(long, env = "is_update_cocoapods")]
    is_update_cocoapods: Option<String>,

    /// Deprecated: the CocoaPods version comes from the lockfiles.
    #[arg(long, env = "install_cocoapods_version")]
    install_cocoapods_version: Option<String>,

    /// Installer settings (TOML). Defaults apply when unset or missing.
    #[arg(long, env = "COCOAPODS_INSTALL_CONFIG")]
    config: Option<String>,
}

impl Cli {
    fn config_path(&self) -> Option<PathBuf> {
        non_empty(self.config.clone()).map(PathBuf::from)
    }

    fn into_inputs(self, cache_include_paths: String) -> Result<StepInputs> {
        let pod_command = non_empty(self.pod_command)
            .map(|command| command.parse::<PodSubcommand>())
            .transpose()?
            .unwrap_or_default();
        Ok(StepInputs {
            source_root_path: non_empty(self.source_root_path)
                .map_or_else(|| PathBuf::from("."), PathBuf::from),
            podfile_path: non_empty(self.podfile_path).map(PathBuf::from),
            pod_command,
            verbose: parse_bool_input("Verbose", self.verbose)?,
            is_update_cocoapods: parse_bool_input("IsUpdateCocoapods", self.is_update_cocoapods)?,
            install_cocoapods_version: non_empty(self.install_cocoapods_version),
            cache_include_paths,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

fn parse_bool_input(name: &str, value: Option<String>) -> Result<bool> {
    match non_empty(value).as_deref() {
        None | Some("false") => Ok(false),
        Some("true") => Ok(true),
        Some(other) => {
            bail!("invalid {name} parameter specified: {other}, available: [\"true\", \"false\"]")
        }
    }
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    let log = ConsoleLog;
    let code = match run(cli, &log) {
        Ok(()) => exit_codes::OK,
        Err(err) => {
            log.error(&format!("{err:#}"));
            exit_codes::FAILURE
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli, log: &ConsoleLog) -> Result<()> {
    let config = match cli.config_path() {
        Some(path) => load_config(&path)?,
        None => InstallerConfig::default(),
    };
    let cache_include_paths = env::var(&config.cache.env_key).unwrap_or_default();
    let inputs = cli
        .into_inputs(cache_include_paths)
        .context("Issue with input")?;
    run_step(&inputs, &config, &SystemRunner, log)
}
