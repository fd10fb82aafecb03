//! Per-bundle import workflow and the cleanup decision.
//!
//! Every error below this boundary is converted into a logged, bundle-scoped
//! outcome; nothing propagates far enough to stop the batch.

use crate::config::ImportConfig;
use crate::events::{ReportLevel, Reporter};
use crate::host::HostLibrary;
use crate::import::auxiliary::{copy_auxiliary, resolve_auxiliary};
use crate::import::cleanup::trash_parent;
use crate::import::scanner::list_files;
use crate::import::tags::{derive_tags, NO_THUMBNAIL_TAG};
use crate::import::thumbnail::{generate_into_dir, resolve_thumbnail, THUMBNAIL_DIR};
use crate::import::types::{Bundle, BundleOutcome};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("bundle {0:?} contains no files")]
    EmptyBundle(PathBuf),
    #[error("bundle {path:?} contains {count} files, expected exactly one")]
    AmbiguousBundle {
        path: PathBuf,
        count: usize,
    },
    #[error("failed to list bundle {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        source: io::Error,
    },
}

/// Exactly one payload file is required.
fn validate_payload(bundle_path: &Path) -> Result<PathBuf, ValidationError> {
    let mut files = list_files(bundle_path).map_err(|source| ValidationError::Unreadable {
        path: bundle_path.to_path_buf(),
        source,
    })?;

    match files.len() {
        0 => Err(ValidationError::EmptyBundle(bundle_path.to_path_buf())),
        1 => Ok(files.remove(0)),
        count => Err(ValidationError::AmbiguousBundle {
            path: bundle_path.to_path_buf(),
            count,
        }),
    }
}

/// Run the import workflow for one bundle.
///
/// The sequence is validate → finalize tags (with the generation fallback,
/// when configured) → create → settle → fetch → attach thumbnail → mirror
/// auxiliary files → cleanup decision. Thumbnail-attach and auxiliary-copy
/// failures degrade the outcome instead of aborting; creation and fetch
/// failures abort this bundle only.
pub async fn import_bundle(
    host: &dyn HostLibrary,
    config: &ImportConfig,
    reporter: &Reporter,
    root: &Path,
    bundle: &Bundle,
    folders: &[String],
) -> BundleOutcome {
    reporter.log(
        ReportLevel::Info,
        format!("processing {}", bundle.path.display()),
    );

    // Discovered -> Validated. Skipped bundles never reach the host.
    let payload = match validate_payload(&bundle.path) {
        Ok(payload) => payload,
        Err(err) => {
            reporter.log(ReportLevel::Warning, err.to_string());
            return BundleOutcome::not_imported(bundle);
        }
    };

    // Tags must be final at creation, so the generation fallback runs before
    // the import call; it only needs the payload and the sibling directory.
    let mut tags = derive_tags(&bundle.path, root);
    let thumbnail = resolve_thumbnail(&bundle.path);
    let mut thumbnail_set = true;
    let mut generated = None;

    if thumbnail.best_candidate().is_none() {
        if let Some(tool) = &config.thumbnail_tool {
            let thumbnail_dir = bundle.parent.join(THUMBNAIL_DIR);
            match generate_into_dir(tool, &payload, &thumbnail_dir, config.thumbnail_size).await {
                Ok(path) => {
                    reporter.log(
                        ReportLevel::Info,
                        format!("generated thumbnail {}", path.display()),
                    );
                    generated = Some(path);
                }
                Err(err) => {
                    reporter.log(
                        ReportLevel::Error,
                        format!("thumbnail generation failed: {err}"),
                    );
                    thumbnail_set = false;
                }
            }
        }
    }

    let attach_path = thumbnail.best_candidate().or(generated);
    if attach_path.is_none() {
        tags.push(NO_THUMBNAIL_TAG.to_string());
    }

    // Validated -> Imported
    let name = payload
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string());
    reporter.log(
        ReportLevel::Info,
        format!("importing {} with tags [{}]", name, tags.join(", ")),
    );

    let item_id = match host
        .add_item_from_path(&payload, &name, &tags, folders)
        .await
    {
        Ok(id) => id,
        Err(err) => {
            reporter.log(
                ReportLevel::Error,
                format!("failed to import {}: {}", bundle.path.display(), err),
            );
            return BundleOutcome::not_imported(bundle);
        }
    };

    // Bounded wait for host-side indexing, then fetch. A fetch failure is a
    // hard failure for this bundle; there is no retry.
    tokio::time::sleep(config.settle_delay).await;

    let item = match host.get_item_by_id(&item_id).await {
        Ok(item) => item,
        Err(err) => {
            reporter.log(
                ReportLevel::Error,
                format!("imported item {item_id} could not be fetched: {err}"),
            );
            return BundleOutcome {
                bundle: bundle.path.clone(),
                item_id: Some(item_id),
                imported: true,
                thumbnail_set: false,
                auxiliary_copied: false,
                cleaned: false,
            };
        }
    };
    reporter.log(
        ReportLevel::Info,
        format!("imported {} (id {})", item.name, item.id),
    );

    // Imported -> ThumbnailResolved. Attach failure degrades, never aborts.
    if let Some(path) = &attach_path {
        match host.set_item_thumbnail(&item.id, path).await {
            Ok(()) => {
                reporter.log(
                    ReportLevel::Info,
                    format!("set thumbnail {}", path.display()),
                );
            }
            Err(err) => {
                reporter.log(ReportLevel::Error, format!("failed to set thumbnail: {err}"));
                thumbnail_set = false;
            }
        }
    }

    // ThumbnailResolved -> AuxiliaryResolved
    let auxiliary_copied = mirror_auxiliary(host, reporter, bundle, &item.id).await;

    // AuxiliaryResolved -> CleanupDecided
    let mut outcome = BundleOutcome {
        bundle: bundle.path.clone(),
        item_id: Some(item.id),
        imported: true,
        thumbnail_set,
        auxiliary_copied,
        cleaned: false,
    };

    if outcome.deletable() {
        reporter.log(
            ReportLevel::Info,
            format!("deleting source folder {}", bundle.parent.display()),
        );
        trash_parent(&config.trash_command, &bundle.parent, reporter);
        outcome.cleaned = true;
    } else {
        reporter.log(
            ReportLevel::Warning,
            format!(
                "skipping cleanup of {}: {}",
                bundle.parent.display(),
                failed_steps(&outcome)
            ),
        );
    }

    outcome
}

/// Copy the auxiliary sibling into the item's storage folder. Returns whether
/// the step counts as succeeded (trivially true when nothing to copy).
async fn mirror_auxiliary(
    host: &dyn HostLibrary,
    reporter: &Reporter,
    bundle: &Bundle,
    item_id: &str,
) -> bool {
    let info = match resolve_auxiliary(&bundle.path) {
        Ok(info) => info,
        Err(err) => {
            reporter.log(
                ReportLevel::Error,
                format!("failed to inspect auxiliary files: {err}"),
            );
            return false;
        }
    };

    if !info.exists || info.files.is_empty() {
        return true;
    }

    let library = match host.library_path().await {
        Ok(path) => path,
        Err(err) => {
            reporter.log(
                ReportLevel::Error,
                format!("failed to resolve library path: {err}"),
            );
            return false;
        }
    };

    let dest = library.join("images").join(format!("{item_id}.info"));
    match copy_auxiliary(&info, &dest).await {
        Ok(()) => {
            reporter.log(
                ReportLevel::Info,
                format!("copied {} auxiliary file(s)", info.files.len()),
            );
            true
        }
        Err(err) => {
            reporter.log(
                ReportLevel::Error,
                format!("failed to copy auxiliary files: {err}"),
            );
            false
        }
    }
}

fn failed_steps(outcome: &BundleOutcome) -> &'static str {
    match (outcome.thumbnail_set, outcome.auxiliary_copied) {
        (false, false) => "thumbnail and auxiliary copy failed",
        (false, true) => "thumbnail step failed",
        (true, false) => "auxiliary copy failed",
        (true, true) => "import incomplete",
    }
}
