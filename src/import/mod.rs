// # Import Module
//
// Sequential batch importer with focused, testable components:
//
// - **Scanner**: Recursive discovery of `main_assets` bundle directories
// - **Tags**: Taxonomy tags derived from a bundle's location under the root
// - **Thumbnail**: Sibling thumbnail resolution and the external generator bridge
// - **Auxiliary**: Sibling `main_assets_others` mirroring into item storage
// - **Orchestrator**: Per-bundle workflow and the cleanup decision
// - **Cleanup**: Trash-based removal of fully imported bundle sources
// - **ImportService**: Drives whole batches behind a request channel
//
// Public API:
// - `ImportService`: Create and start the service
// - `ImportServiceHandle`: Start/cancel batches and subscribe to events
// - `import_bundle`: Run the workflow for a single bundle
// - `BundleOutcome` / `BatchSummary`: Per-bundle and per-batch results

mod auxiliary;
mod cleanup;
mod orchestrator;
mod scanner;
mod service;
mod tags;
mod thumbnail;
mod types;

// Public API exports
pub use auxiliary::{copy_auxiliary, resolve_auxiliary, CopyError, AUXILIARY_DIR};
pub use orchestrator::{import_bundle, ValidationError};
pub use scanner::{list_files, scan_for_bundles, ScanError, BUNDLE_MARKER};
pub use service::{ImportService, ImportServiceHandle, StartError};
pub use tags::{derive_tags, NO_THUMBNAIL_TAG};
pub use thumbnail::{
    generate_thumbnail, generate_into_dir, resolve_thumbnail, ThumbnailError, THUMBNAIL_DIR,
};
pub use types::{AuxiliaryInfo, BatchSummary, Bundle, BundleOutcome, ImportRequest, ThumbnailInfo};
