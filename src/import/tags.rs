//! Taxonomy tags derived from a bundle's location under the import root.

use crate::import::scanner::BUNDLE_MARKER;
use std::path::{Component, Path};

/// Tag appended when a bundle ends up with no usable thumbnail.
pub const NO_THUMBNAIL_TAG: &str = "no_thumbnail";

/// Directory names between `root` and the bundle, outer-to-inner, with empty
/// segments and the marker itself removed. The first tag is the top-level
/// category.
pub fn derive_tags(bundle_path: &Path, root: &Path) -> Vec<String> {
    let relative = bundle_path.strip_prefix(root).unwrap_or(bundle_path);

    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => segment.to_str(),
            _ => None,
        })
        .filter(|segment| !segment.is_empty() && *segment != BUNDLE_MARKER)
        .map(str::to_string)
        .collect()
}
