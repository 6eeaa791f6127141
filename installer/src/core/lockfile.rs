//! CocoaPods version extraction from lockfiles and `gem list` output.

use std::sync::LazyLock;

use regex::Regex;

static PODFILE_LOCK_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"COCOAPODS: (.+)").expect("valid regex"));

static GEMFILE_LOCK_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"cocoapods \((.+)\)").expect("valid regex"));

static GEM_LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^cocoapods \((.*)\)").expect("valid regex"));

/// Version recorded by `pod install` at the bottom of `Podfile.lock`.
pub fn cocoapods_version_from_podfile_lock(content: &str) -> Option<String> {
    PODFILE_LOCK_VERSION_RE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches('\r').to_string())
}

/// Version of the `cocoapods` gem pinned in the first `specs:` section of `Gemfile.lock`.
///
/// Scanning stops at the first blank line, so only the leading `GEM` block is
/// considered.
pub fn cocoapods_version_from_gemfile_lock(content: &str) -> Option<String> {
    let mut in_specs = false;
    let mut relevant = Vec::new();
    for line in content.lines() {
        if line.contains("specs:") {
            in_specs = true;
        }
        if line.trim_matches(' ').is_empty() {
            break;
        }
        if in_specs {
            relevant.push(line);
        }
    }

    relevant.into_iter().find_map(|line| {
        GEMFILE_LOCK_VERSION_RE
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Installed cocoapods versions listed by `gem list`.
///
/// `cocoapods (1.11.3, default: 1.10.0)` yields `["1.11.3", "1.10.0"]`.
pub fn installed_cocoapods_versions(gem_list_output: &str) -> Vec<String> {
    let Some(caps) = GEM_LIST_RE.captures(gem_list_output) else {
        return Vec::new();
    };
    let Some(versions) = caps.get(1) else {
        return Vec::new();
    };
    versions
        .as_str()
        .split(", ")
        .map(|v| v.trim_start_matches("default: ").trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn podfile_lock_with_version() {
        let content = "PODS:
  - Alamofire (3.4.0)

DEPENDENCIES:
  - Alamofire (~> 3.4)

SPEC CHECKSUMS:
  Alamofire: c19a627cefd6a95f840401c49ab1f124e07f54ee

PODFILE CHECKSUM: f2a6f4eed25b89d16fc8e906af222b4e63afa6c3

COCOAPODS: 1.0.0
";
        assert_eq!(
            cocoapods_version_from_podfile_lock(content).as_deref(),
            Some("1.0.0")
        );
    }

    #[test]
    fn podfile_lock_without_version() {
        let content = "PODS:
  - Alamofire (3.4.0)

PODFILE CHECKSUM: f2a6f4eed25b89d16fc8e906af222b4e63afa6c3
";
        assert_eq!(cocoapods_version_from_podfile_lock(content), None);
    }

    #[test]
    fn gemfile_lock_with_cocoapods() {
        let content = "GEM
  remote: https://rubygems.org/
  specs:
    activesupport (4.2.7.1)
    claide (1.0.1)
    cocoapods (1.1.0)
      activesupport (>= 4.0.2, < 5)
      cocoapods-core (= 1.1.0)
    cocoapods-core (1.1.0)

PLATFORMS
  ruby

DEPENDENCIES
  cocoapods (~> 1.1.0)

BUNDLED WITH
   1.13.6
";
        assert_eq!(
            cocoapods_version_from_gemfile_lock(content).as_deref(),
            Some("1.1.0")
        );
    }

    #[test]
    fn gemfile_lock_only_in_dependencies_is_ignored() {
        let content = "GEM
  remote: https://rubygems.org/
  specs:
    fastlane (2.210.0)

DEPENDENCIES
  cocoapods (~> 1.1.0)
";
        assert_eq!(cocoapods_version_from_gemfile_lock(content), None);
    }

    #[test]
    fn gemfile_lock_leading_blank_line_stops_scan() {
        let content = "\nGEM\n  specs:\n    cocoapods (1.1.0)\n";
        assert_eq!(cocoapods_version_from_gemfile_lock(content), None);
    }

    #[test]
    fn gem_list_versions() {
        let output = "claide (1.1.0)\ncocoapods (1.11.3, 1.10.1, default: 1.9.0)\ncocoapods-core (1.11.3)\n";
        assert_eq!(
            installed_cocoapods_versions(output),
            vec!["1.11.3", "1.10.1", "1.9.0"]
        );
    }

    #[test]
    fn gem_list_without_cocoapods() {
        let output = "claide (1.1.0)\ncocoapods-core (1.11.3)\n";
        assert!(installed_cocoapods_versions(output).is_empty());
    }
}
