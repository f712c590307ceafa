//! Source file enumeration.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::DiscoverError;

/// Directory names that never hold user declarations.
const EXCLUDED_DIRS: &[&str] = &["target", "tests", "testdata", "vendor"];

/// Enumerate the `.rs` files to scan under `root`, in sorted path order.
///
/// Hidden directories, build output and test trees are skipped, as are
/// `*_test.rs` files. An unreadable subtree is logged and skipped; only a
/// root that cannot be walked at all is an error.
pub fn source_files(root: &Path) -> Result<Vec<PathBuf>, DiscoverError> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(keep_entry);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(DiscoverError::Walk {
                    path: root.to_path_buf(),
                    source: err,
                });
            }
            Err(err) => {
                warn!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if entry.file_type().is_file() && is_source_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn keep_entry(entry: &walkdir::DirEntry) -> bool {
    // The root is always visited, even when its own name would be excluded.
    if entry.depth() == 0 {
        return true;
    }
    if !entry.file_type().is_dir() {
        return true;
    }
    let name = entry.file_name().to_str().unwrap_or("");
    !name.starts_with('.') && !EXCLUDED_DIRS.contains(&name)
}

fn is_source_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    name.ends_with(".rs") && !name.ends_with("_test.rs")
}
