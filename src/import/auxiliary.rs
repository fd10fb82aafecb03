//! Sibling `main_assets_others` resolution and mirroring into item storage.
//!
//! A missing sibling is trivial success. A present one is mirrored whole,
//! preserving relative structure; the first copy failure aborts the step.
//! Partial output may remain on disk — the failure is surfaced to the caller
//! and blocks cleanup instead of being rolled back.

use crate::import::types::AuxiliaryInfo;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Sibling directory holding auxiliary files that belong with the payload.
pub const AUXILIARY_DIR: &str = "main_assets_others";

#[derive(Debug, Error)]
pub enum CopyError {
    #[error("failed to read auxiliary directory {path:?}: {source}")]
    ReadDir {
        path: PathBuf,
        source: io::Error,
    },
    #[error("failed to create destination directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        source: io::Error,
    },
    #[error("failed to copy {from:?} to {to:?}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

/// Inspect the sibling auxiliary directory next to a bundle.
///
/// Enumerates the whole subtree up front so a later mirror works from a
/// stable, sorted file list.
pub fn resolve_auxiliary(bundle_path: &Path) -> Result<AuxiliaryInfo, CopyError> {
    let Some(parent) = bundle_path.parent() else {
        return Ok(AuxiliaryInfo::default());
    };

    let dir = parent.join(AUXILIARY_DIR);
    if !dir.is_dir() {
        return Ok(AuxiliaryInfo::default());
    }

    let mut files = Vec::new();
    collect_relative_files(&dir, &dir, &mut files)?;
    files.sort();

    Ok(AuxiliaryInfo {
        exists: true,
        source_dir: Some(dir),
        files,
    })
}

fn collect_relative_files(
    current: &Path,
    root: &Path,
    files: &mut Vec<PathBuf>,
) -> Result<(), CopyError> {
    let entries = fs::read_dir(current).map_err(|source| CopyError::ReadDir {
        path: current.to_path_buf(),
        source,
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_relative_files(&path, root, files)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }

    Ok(())
}

/// Mirror the resolved auxiliary subtree into `dest`, creating directories as
/// needed. A no-op when nothing was resolved.
pub async fn copy_auxiliary(info: &AuxiliaryInfo, dest: &Path) -> Result<(), CopyError> {
    let Some(source) = &info.source_dir else {
        return Ok(());
    };
    if info.files.is_empty() {
        return Ok(());
    }

    tokio::fs::create_dir_all(dest)
        .await
        .map_err(|source| CopyError::CreateDir {
            path: dest.to_path_buf(),
            source,
        })?;

    for relative in &info.files {
        let from = source.join(relative);
        let to = dest.join(relative);

        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| CopyError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::copy(&from, &to)
            .await
            .map_err(|source| CopyError::Copy {
                from: from.clone(),
                to: to.clone(),
                source,
            })?;

        debug!("copied auxiliary file {:?}", relative);
    }

    Ok(())
}
