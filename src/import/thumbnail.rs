//! Sibling `thumbnail` directory resolution and the external generator bridge.
//!
//! The resolver only inspects the filesystem. Generation is a fallback
//! decision made by the orchestrator: it shells out to a platform tool that
//! renders a shell thumbnail for an arbitrary file, then verifies the output
//! actually landed on disk before trusting the exit status.

use crate::import::types::ThumbnailInfo;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Sibling directory holding pre-rendered thumbnails for a bundle.
pub const THUMBNAIL_DIR: &str = "thumbnail";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

#[derive(Debug, Error)]
pub enum ThumbnailError {
    /// The tool could not be spawned at all (missing, permission denied).
    #[error("failed to launch thumbnail tool {tool:?}: {source}")]
    Launch {
        tool: PathBuf,
        source: io::Error,
    },
    /// The tool ran but reported failure.
    #[error("thumbnail tool failed ({status}): {detail}")]
    Generation { status: String, detail: String },
    /// Zero exit status, but no output file on disk.
    #[error("thumbnail tool reported success but wrote no file at {0:?}")]
    Incomplete(PathBuf),
    #[error("failed to create thumbnail directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        source: io::Error,
    },
}

/// Check if a file is a usable thumbnail image based on extension
fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Inspect `parent(bundle)/thumbnail` for usable images.
///
/// A missing or unreadable directory is not an error; it simply means no
/// pre-rendered thumbnail exists.
pub fn resolve_thumbnail(bundle_path: &Path) -> ThumbnailInfo {
    let Some(parent) = bundle_path.parent() else {
        return ThumbnailInfo::default();
    };

    let dir = parent.join(THUMBNAIL_DIR);
    if !dir.is_dir() {
        return ThumbnailInfo::default();
    }

    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("failed to read thumbnail directory {:?}: {}", dir, err);
            return ThumbnailInfo::default();
        }
    };

    let mut candidates = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() && is_image_file(&path) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                candidates.push(name.to_string());
            }
        }
    }
    candidates.sort();

    ThumbnailInfo {
        exists: true,
        source_dir: Some(dir),
        candidates,
    }
}

/// Render a shell thumbnail for `input` into `output` at `size` pixels.
///
/// The tool is invoked as `<tool> <input> <output> <size>`. Success requires a
/// zero exit status, an empty error stream, and the output file existing
/// afterwards.
pub async fn generate_thumbnail(
    tool: &Path,
    input: &Path,
    output: &Path,
    size: u32,
) -> Result<(), ThumbnailError> {
    debug!("generating thumbnail for {:?} into {:?}", input, output);

    let result = Command::new(tool)
        .arg(input)
        .arg(output)
        .arg(size.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await;

    match result {
        Ok(out) => {
            let stderr = str::from_utf8(&out.stderr).unwrap_or_default().trim();
            if !out.status.success() || !stderr.is_empty() {
                let detail = if stderr.is_empty() {
                    str::from_utf8(&out.stdout).unwrap_or_default().trim().to_string()
                } else {
                    stderr.to_string()
                };
                Err(ThumbnailError::Generation {
                    status: out.status.to_string(),
                    detail,
                })
            } else if !output.exists() {
                Err(ThumbnailError::Incomplete(output.to_path_buf()))
            } else {
                Ok(())
            }
        }
        Err(source) => Err(ThumbnailError::Launch {
            tool: tool.to_path_buf(),
            source,
        }),
    }
}

/// Generate a thumbnail for `payload` into the bundle's `thumbnail` sibling
/// directory, creating it if needed. Returns the generated file's path, so a
/// re-run of the scan finds it as a normal candidate.
pub async fn generate_into_dir(
    tool: &Path,
    payload: &Path,
    thumbnail_dir: &Path,
    size: u32,
) -> Result<PathBuf, ThumbnailError> {
    fs::create_dir_all(thumbnail_dir).map_err(|source| ThumbnailError::CreateDir {
        path: thumbnail_dir.to_path_buf(),
        source,
    })?;

    let stem = payload
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("thumbnail");
    let output = thumbnail_dir.join(format!("{stem}.png"));

    generate_thumbnail(tool, payload, &output, size).await?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("cover.jpg")));
        assert!(is_image_file(Path::new("cover.JPEG")));
        assert!(is_image_file(Path::new("cover.webp")));
        assert!(!is_image_file(Path::new("cover.txt")));
        assert!(!is_image_file(Path::new("cover")));
    }

    #[test]
    fn test_missing_directory_resolves_to_absent() {
        let temp = TempDir::new().unwrap();
        let bundle = temp.path().join("pack/main_assets");
        fs::create_dir_all(&bundle).unwrap();

        let info = resolve_thumbnail(&bundle);
        assert!(!info.exists);
        assert!(info.best_candidate().is_none());
    }

    #[test]
    fn test_candidates_are_filtered_and_sorted() {
        let temp = TempDir::new().unwrap();
        let bundle = temp.path().join("pack/main_assets");
        let thumbs = temp.path().join("pack/thumbnail");
        fs::create_dir_all(&bundle).unwrap();
        fs::create_dir_all(&thumbs).unwrap();
        fs::write(thumbs.join("b.png"), b"img").unwrap();
        fs::write(thumbs.join("a.JPG"), b"img").unwrap();
        fs::write(thumbs.join("notes.txt"), b"text").unwrap();

        let info = resolve_thumbnail(&bundle);
        assert!(info.exists);
        assert_eq!(info.candidates, vec!["a.JPG", "b.png"]);
        assert_eq!(info.best_candidate(), Some(thumbs.join("a.JPG")));
    }

    #[test]
    fn test_empty_directory_has_no_candidates() {
        let temp = TempDir::new().unwrap();
        let bundle = temp.path().join("pack/main_assets");
        fs::create_dir_all(&bundle).unwrap();
        fs::create_dir_all(temp.path().join("pack/thumbnail")).unwrap();

        let info = resolve_thumbnail(&bundle);
        assert!(info.exists);
        assert!(info.best_candidate().is_none());
    }

    #[tokio::test]
    async fn test_missing_tool_is_a_launch_error() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("asset.bin");
        let output = temp.path().join("out.png");
        fs::write(&input, b"data").unwrap();

        let result = generate_thumbnail(
            Path::new("/nonexistent/thumbnail-tool"),
            &input,
            &output,
            400,
        )
        .await;

        assert!(matches!(result, Err(ThumbnailError::Launch { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_zero_exit_without_output_is_incomplete() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let tool = temp.path().join("noop.sh");
        fs::write(&tool, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        let input = temp.path().join("asset.bin");
        let output = temp.path().join("out.png");
        fs::write(&input, b"data").unwrap();

        let result = generate_thumbnail(&tool, &input, &output, 400).await;
        assert!(matches!(result, Err(ThumbnailError::Incomplete(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_captures_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let tool = temp.path().join("fail.sh");
        fs::write(&tool, "#!/bin/sh\necho 'render failed' >&2\nexit 3\n").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        let input = temp.path().join("asset.bin");
        let output = temp.path().join("out.png");
        fs::write(&input, b"data").unwrap();

        match generate_thumbnail(&tool, &input, &output, 400).await {
            Err(ThumbnailError::Generation { detail, .. }) => {
                assert_eq!(detail, "render failed");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_generate_into_dir_creates_directory_and_names_output() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let tool = temp.path().join("copy.sh");
        fs::write(&tool, "#!/bin/sh\ncp \"$1\" \"$2\"\n").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        let payload = temp.path().join("model.fbx");
        fs::write(&payload, b"mesh").unwrap();
        let thumbs = temp.path().join("pack/thumbnail");

        let generated = generate_into_dir(&tool, &payload, &thumbs, 400)
            .await
            .unwrap();

        assert_eq!(generated, thumbs.join("model.png"));
        assert!(generated.exists());
    }
}
