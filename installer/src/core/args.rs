//! Command-line assembly for pod, gem and bundler invocations.
//!
//! Every builder returns a freshly allocated vector. Callers never extend a
//! vector that another command was built from.

use crate::core::types::{CocoapodsSource, InstallRequest, PodSubcommand, RubyInstallType};

pub const NO_REPO_UPDATE_FLAG: &str = "--no-repo-update";
pub const VERBOSE_FLAG: &str = "--verbose";

/// `[pod_args..., <subcommand>, --no-repo-update, (--verbose)]`
pub fn pod_install_args(pod_args: &[String], subcommand: PodSubcommand, verbose: bool) -> Vec<String> {
    let mut args = Vec::with_capacity(pod_args.len() + 3);
    args.extend(pod_args.iter().cloned());
    args.push(subcommand.as_str().to_string());
    args.push(NO_REPO_UPDATE_FLAG.to_string());
    if verbose {
        args.push(VERBOSE_FLAG.to_string());
    }
    args
}

/// `[pod_args..., repo, update, (--verbose)]`
pub fn pod_repo_update_args(pod_args: &[String], verbose: bool) -> Vec<String> {
    let mut args = Vec::with_capacity(pod_args.len() + 3);
    args.extend(pod_args.iter().cloned());
    args.push("repo".to_string());
    args.push("update".to_string());
    if verbose {
        args.push(VERBOSE_FLAG.to_string());
    }
    args
}

impl InstallRequest {
    pub fn install_args(&self) -> Vec<String> {
        pod_install_args(&self.pod_args, self.subcommand, self.verbose)
    }

    pub fn repo_update_args(&self) -> Vec<String> {
        pod_repo_update_args(&self.pod_args, self.verbose)
    }
}

/// Invocation prefix for the selected CocoaPods source.
pub fn pod_base_args(source: &CocoapodsSource) -> Vec<String> {
    match source {
        CocoapodsSource::Bundler => vec!["bundle".into(), "exec".into(), "pod".into()],
        CocoapodsSource::Gem(version) => vec!["pod".into(), format!("_{version}_")],
        CocoapodsSource::System => vec!["pod".into()],
    }
}

pub fn bundle_install_args(jobs: u32, retry: u32) -> Vec<String> {
    vec![
        "bundle".into(),
        "install".into(),
        "--jobs".into(),
        jobs.to_string(),
        "--retry".into(),
        retry.to_string(),
    ]
}

/// Commands that install `gem` at `version` for the given Ruby setup, in order.
pub fn gem_install_commands(
    ruby: RubyInstallType,
    gem: &str,
    version: &str,
) -> Vec<Vec<String>> {
    let mut install = Vec::new();
    if ruby == RubyInstallType::System {
        install.push("sudo".to_string());
    }
    install.extend(
        ["gem", "install", gem, "-v", version, "--no-document"]
            .iter()
            .map(|s| s.to_string()),
    );

    let mut commands = vec![install];
    if ruby == RubyInstallType::Rbenv {
        commands.push(vec!["rbenv".into(), "rehash".into()]);
    }
    commands
}

/// Shell-quoted rendering used when echoing a command to the step log.
pub fn printable_command(args: &[String]) -> String {
    shell_words::join(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn install_args_without_flags() {
        let args = pod_install_args(&strings(&["pod"]), PodSubcommand::Install, false);
        assert_eq!(args, strings(&["pod", "install", "--no-repo-update"]));
    }

    #[test]
    fn update_args_verbose() {
        let args = pod_install_args(&strings(&["pod"]), PodSubcommand::Update, true);
        assert_eq!(
            args,
            strings(&["pod", "update", "--no-repo-update", "--verbose"])
        );
    }

    #[test]
    fn repo_update_args_keep_prefix() {
        let args = pod_repo_update_args(&strings(&["bundle", "exec", "pod"]), true);
        assert_eq!(
            args,
            strings(&["bundle", "exec", "pod", "repo", "update", "--verbose"])
        );
    }

    #[test]
    fn builders_do_not_share_storage_with_prefix() {
        let mut prefix = Vec::with_capacity(16);
        prefix.push("pod".to_string());
        let install = pod_install_args(&prefix, PodSubcommand::Install, true);
        let repo = pod_repo_update_args(&prefix, false);
        assert_eq!(prefix, strings(&["pod"]));
        assert_eq!(
            install,
            strings(&["pod", "install", "--no-repo-update", "--verbose"])
        );
        assert_eq!(repo, strings(&["pod", "repo", "update"]));
    }

    #[test]
    fn base_args_per_source() {
        assert_eq!(pod_base_args(&CocoapodsSource::System), strings(&["pod"]));
        assert_eq!(
            pod_base_args(&CocoapodsSource::Gem("1.11.3".into())),
            strings(&["pod", "_1.11.3_"])
        );
        assert_eq!(
            pod_base_args(&CocoapodsSource::Bundler),
            strings(&["bundle", "exec", "pod"])
        );
    }

    #[test]
    fn gem_install_uses_sudo_for_system_ruby() {
        let cmds = gem_install_commands(RubyInstallType::System, "cocoapods", "1.11.3");
        assert_eq!(
            cmds,
            vec![strings(&[
                "sudo",
                "gem",
                "install",
                "cocoapods",
                "-v",
                "1.11.3",
                "--no-document"
            ])]
        );
    }

    #[test]
    fn gem_install_rehashes_rbenv() {
        let cmds = gem_install_commands(RubyInstallType::Rbenv, "cocoapods", "1.5.0");
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0][0], "gem");
        assert_eq!(cmds[1], strings(&["rbenv", "rehash"]));
    }

    #[test]
    fn printable_command_quotes_spaces() {
        let args = strings(&["bitrise", ":annotations", "annotate", "a tip"]);
        assert_eq!(printable_command(&args), "bitrise :annotations annotate 'a tip'");
    }
}
