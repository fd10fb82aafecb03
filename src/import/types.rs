use std::path::PathBuf;

/// A discovered bundle directory awaiting import.
///
/// Immutable once discovered; consumed exactly once by the orchestrator.
#[derive(Debug, Clone)]
pub struct Bundle {
    /// Absolute path of the marker directory holding the payload file.
    pub path: PathBuf,
    /// Directory one level up. This is the unit that gets trashed after a
    /// fully successful import.
    pub parent: PathBuf,
}

impl Bundle {
    /// Returns `None` for a path with no parent (filesystem root).
    pub fn new(path: PathBuf) -> Option<Self> {
        let parent = path.parent()?.to_path_buf();
        Some(Self { path, parent })
    }
}

/// Result of inspecting the sibling `thumbnail` directory.
#[derive(Debug, Clone, Default)]
pub struct ThumbnailInfo {
    /// Whether the directory exists at all.
    pub exists: bool,
    /// The directory itself, when present.
    pub source_dir: Option<PathBuf>,
    /// Image file names inside it, extension-filtered and sorted.
    pub candidates: Vec<String>,
}

impl ThumbnailInfo {
    /// Full path of the first usable image, if any.
    pub fn best_candidate(&self) -> Option<PathBuf> {
        let dir = self.source_dir.as_ref()?;
        self.candidates.first().map(|name| dir.join(name))
    }
}

/// Result of inspecting the sibling `main_assets_others` directory.
#[derive(Debug, Clone, Default)]
pub struct AuxiliaryInfo {
    pub exists: bool,
    pub source_dir: Option<PathBuf>,
    /// Relative paths of every file in the subtree, sorted.
    pub files: Vec<PathBuf>,
}

/// Per-bundle result. `deletable` gates the cleanup step.
#[derive(Debug, Clone)]
pub struct BundleOutcome {
    /// The bundle's marker directory.
    pub bundle: PathBuf,
    /// Host-assigned id, once creation succeeded.
    pub item_id: Option<String>,
    pub imported: bool,
    /// True when no thumbnail step was required, or it succeeded.
    pub thumbnail_set: bool,
    /// True when no auxiliary copy was required, or it succeeded.
    pub auxiliary_copied: bool,
    /// Whether cleanup of the parent directory was dispatched.
    pub cleaned: bool,
}

impl BundleOutcome {
    pub(crate) fn not_imported(bundle: &Bundle) -> Self {
        Self {
            bundle: bundle.path.clone(),
            item_id: None,
            imported: false,
            thumbnail_set: true,
            auxiliary_copied: true,
            cleaned: false,
        }
    }

    /// The source tree may be deleted only when every dependent step that
    /// consumes it has durably succeeded.
    pub fn deletable(&self) -> bool {
        self.imported && self.thumbnail_set && self.auxiliary_copied
    }
}

/// Summary reported when a batch run completes.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Bundles discovered by the scan.
    pub total: usize,
    /// Bundles the batch got to before finishing or being cancelled.
    pub processed: usize,
    /// Bundles whose payload reached the host library.
    pub imported: usize,
    /// Bundles whose source tree was sent to the trash.
    pub cleaned: usize,
    /// Bundles skipped by validation or aborted mid-workflow.
    pub failed: usize,
}

/// Requests handled by the import service worker.
#[derive(Debug)]
pub enum ImportRequest {
    RunBatch {
        root: PathBuf,
        /// User-supplied destination folder list passed to the host.
        folders: Vec<String>,
    },
    Shutdown,
}
