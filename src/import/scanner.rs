//! Recursive discovery of `main_assets` bundle directories.
//!
//! A directory is a bundle when its base name equals the marker exactly.
//! Matched directories are leaves: the walk does not descend into them.
//! Unreadable subdirectories are skipped with a warning; only an unreadable
//! root aborts the scan.

use crate::import::types::Bundle;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Directory name that marks a bundle.
pub const BUNDLE_MARKER: &str = "main_assets";

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read root directory {path:?}: {source}")]
    Root {
        path: PathBuf,
        source: io::Error,
    },
}

/// Scan a root directory for bundles.
///
/// Returns bundles sorted by path for deterministic processing order.
pub fn scan_for_bundles(root: &Path) -> Result<Vec<Bundle>, ScanError> {
    debug!("scanning for bundles in {:?}", root);

    // The root itself must be readable; everything below degrades to warnings.
    fs::read_dir(root).map_err(|source| ScanError::Root {
        path: root.to_path_buf(),
        source,
    })?;

    let mut bundles = Vec::new();
    scan_recursive(root, &mut bundles);
    bundles.sort_by(|a, b| a.path.cmp(&b.path));

    debug!("found {} bundle(s)", bundles.len());
    Ok(bundles)
}

fn scan_recursive(dir: &Path, bundles: &mut Vec<Bundle>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("skipping unreadable directory {:?}: {}", dir, err);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        if path.file_name().and_then(|n| n.to_str()) == Some(BUNDLE_MARKER) {
            debug!("found bundle: {:?}", path);
            if let Some(bundle) = Bundle::new(path) {
                bundles.push(bundle);
            }
        } else {
            scan_recursive(&path, bundles);
        }
    }
}

/// List files directly inside `dir` (payload candidates), sorted by name.
pub fn list_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
