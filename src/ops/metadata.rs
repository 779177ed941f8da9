//! Reading the metadata file written by `bake --metadata-file`.
//!
//! The file maps each target name to the metadata of its build, e.g.
//!
//! ```json
//! {
//!   "app": {
//!     "buildx.build.ref": "builder/builder0/k2ijvr3vbgbjrbwgmgt1xzv6y",
//!     "containerimage.digest": "sha256:..."
//!   },
//!   "buildx.build.warnings": []
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Key holding the build reference of a target.
pub const BUILD_REF_KEY: &str = "buildx.build.ref";

/// Read and parse a metadata file.
///
/// A missing or empty file yields `None`: older orchestrators and failed
/// builds do not always write it.
pub fn read_metadata(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        tracing::warn!("Metadata file not found: {}", path.display());
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read metadata file: {}", path.display()))?;
    if contents.trim().is_empty() {
        tracing::warn!("Metadata file is empty: {}", path.display());
        return Ok(None);
    }

    let value = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse metadata file: {}", path.display()))?;
    Ok(Some(value))
}

/// Build references of every target, ordered by target name.
pub fn build_refs(metadata: &Value) -> Vec<String> {
    let Some(targets) = metadata.as_object() else {
        return Vec::new();
    };

    targets
        .values()
        .filter_map(|target| target.get(BUILD_REF_KEY)?.as_str())
        .map(str::to_string)
        .collect()
}
