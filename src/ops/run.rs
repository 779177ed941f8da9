//! Running a planned bake invocation.

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::ops::metadata::{build_refs, read_metadata};
use crate::ops::plan::BakePlan;

/// Result of a successful bake.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// Parsed metadata file, when one was written
    pub metadata: Option<Value>,
    /// Build references of every target
    pub refs: Vec<String>,
}

/// Run the planned command with inherited stdio and collect its metadata.
pub fn run(plan: &BakePlan) -> Result<RunOutcome> {
    if let Some(parent) = plan.metadata_file().and_then(|p| p.parent()) {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("failed to create metadata directory: {}", parent.display())
        })?;
    }

    let command = plan.command();
    tracing::info!("Running `{}`", command.display_command());

    let status = command.status()?;
    if !status.success() {
        bail!(
            "`{}` failed with exit code {:?}",
            command.display_command(),
            status.code()
        );
    }

    let Some(path) = plan.metadata_file() else {
        return Ok(RunOutcome::default());
    };

    let metadata = read_metadata(path)?;
    let refs = metadata.as_ref().map(build_refs).unwrap_or_default();
    for r in &refs {
        tracing::debug!("Build ref: {}", r);
    }

    Ok(RunOutcome { metadata, refs })
}
