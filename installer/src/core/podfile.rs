//! Podfile selection and content checks.

use std::path::{Component, Path, PathBuf};

/// Directories that never hold the project's own Podfile.
const FORBIDDEN_COMPONENTS: &[&str] = &[".git", "Pods", "Carthage"];

/// The legacy git source, normalised (quotes unified, lowercase).
const SPECS_REPO_SOURCE: &str = "source 'https://github.com/cocoapods/specs.git'";

pub const SPECS_REPO_TIP: &str = "### CocoaPods tip
Your Podfile is still using the Specs repo. Switch to the CDN source for faster and more reliable dependency installs!
Learn more about the one-line change [here](https://blog.cocoapods.org/CocoaPods-1.8.0-beta/).
";

/// Whether `path` names a Podfile that belongs to the project itself.
pub fn is_podfile_candidate(path: &Path) -> bool {
    let is_podfile = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.eq_ignore_ascii_case("podfile"));
    if !is_podfile {
        return false;
    }

    !path.components().any(|component| match component {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            FORBIDDEN_COMPONENTS.iter().any(|forbidden| name == *forbidden)
                || name.ends_with(".framework")
        }
        _ => false,
    })
}

fn depth(path: &Path) -> usize {
    path.components()
        .filter(|component| matches!(component, Component::Normal(_) | Component::ParentDir))
        .count()
}

/// Pick the Podfile closest to the search root.
///
/// Candidates are ordered by depth, then by file name, then by full path.
pub fn most_root_podfile<P: AsRef<Path>>(paths: &[P]) -> Option<PathBuf> {
    let mut podfiles: Vec<&Path> = paths
        .iter()
        .map(|path| path.as_ref())
        .filter(|path| is_podfile_candidate(path))
        .collect();
    podfiles.sort_by(|a, b| {
        depth(a)
            .cmp(&depth(b))
            .then_with(|| a.file_name().cmp(&b.file_name()))
            .then_with(|| a.cmp(b))
    });
    podfiles.first().map(|path| path.to_path_buf())
}

/// Whether the Podfile declares the git-based Specs repo as a source.
///
/// The CDN source and third-party spec repos return false.
pub fn is_using_specs_repo(content: &str) -> bool {
    content.lines().any(|line| {
        let normalized = line.trim().replace('"', "'").to_lowercase();
        normalized == SPECS_REPO_SOURCE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_podfile() {
        let found = most_root_podfile(&["./Podfile"]);
        assert_eq!(found, Some(PathBuf::from("./Podfile")));
    }

    #[test]
    fn podfile_name_is_case_insensitive() {
        for name in ["/Users/bitrise/my/podfile/dir/podfile", "/Users/bitrise/my/podfile/dir/poDfile"] {
            assert_eq!(most_root_podfile(&[name]), Some(PathBuf::from(name)));
        }
    }

    #[test]
    fn shallowest_podfile_wins() {
        let found = most_root_podfile(&[
            "/Users/bitrise/my/podfile/dir/Podfile",
            "/Users/bitrise/my/dir/Podfile",
            "/Users/bitrise/dir/Podfile",
        ]);
        assert_eq!(found, Some(PathBuf::from("/Users/bitrise/dir/Podfile")));

        let found = most_root_podfile(&[
            "./my/podfile/dir/Podfile",
            "./my/dir/Podfile",
            "./dir/Podfile",
            "./",
        ]);
        assert_eq!(found, Some(PathBuf::from("./dir/Podfile")));
    }

    #[test]
    fn forbidden_directories_are_skipped() {
        let found = most_root_podfile(&[
            "/project/.git/Podfile",
            "/project/Pods/Podfile",
            "/project/Carthage/Checkouts/lib/Podfile",
            "/project/Vendor/Lib.framework/Podfile",
            "/project/ios/app/Podfile",
        ]);
        assert_eq!(found, Some(PathBuf::from("/project/ios/app/Podfile")));
    }

    #[test]
    fn no_podfile() {
        let paths: Vec<PathBuf> = vec![PathBuf::from("/project/Podfile.lock"), PathBuf::from("/project/Gemfile")];
        assert_eq!(most_root_podfile(&paths), None);
    }

    #[test]
    fn specs_repo_detection() {
        assert!(!is_using_specs_repo(""));
        assert!(is_using_specs_repo(
            "platform :ios, '13.0'\nsource 'https://github.com/CocoaPods/Specs.git'\ntarget 'App' do\nend\n"
        ));
        assert!(is_using_specs_repo(
            "  source \"https://github.com/CocoaPods/Specs.git\"  \n"
        ));
        assert!(is_using_specs_repo(
            "source 'https://github.com/cocoapods/specs.git'\n"
        ));
        assert!(!is_using_specs_repo("source 'https://cdn.cocoapods.org/'\n"));
        assert!(!is_using_specs_repo(
            "source 'https://github.com/artsy/Specs.git'\n"
        ));
    }
}
