//! Podfile discovery under the source root.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, instrument};
use walkdir::{DirEntry, WalkDir};

use crate::core::podfile::most_root_podfile;

/// Directories whose contents never count as the project's Podfile.
fn is_pruned_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    matches!(name.as_ref(), ".git" | "Pods" | "Carthage") || name.ends_with(".framework")
}

/// Find the Podfile closest to `search_dir`.
///
/// Returns an absolute path, or `None` when the tree has no Podfile.
#[instrument(skip_all, fields(search_dir = %search_dir.display()))]
pub fn find_most_root_podfile(search_dir: &Path) -> Result<Option<PathBuf>> {
    let root = std::path::absolute(search_dir)
        .with_context(|| format!("expand {}", search_dir.display()))?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_pruned_dir(entry))
    {
        let entry = entry.with_context(|| format!("walk {}", root.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    debug!(files = files.len(), "walked source root");

    Ok(most_root_podfile(&files))
}
