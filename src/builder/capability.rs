//! Capability providers queried while synthesizing arguments.
//!
//! The orchestrator (Buildx) and the backend (BuildKit) are versioned
//! independently. Both checks are async because real providers have to ask
//! the Docker CLI; implementations are expected to memoize.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use semver::VersionReq;
use tempfile::TempDir;

use crate::core::version::ToolVersion;

/// File name of the metadata file inside the metadata directory.
pub const METADATA_FILE_NAME: &str = "metadata-file";

/// Version checks against the bake orchestrator.
#[async_trait]
pub trait OrchestratorCapabilities: Send + Sync {
    /// Check whether the installed orchestrator satisfies `req`.
    async fn version_satisfies(&self, req: &VersionReq) -> Result<bool>;
}

/// Version checks against the build backend behind a builder instance.
#[async_trait]
pub trait BackendCapabilities: Send + Sync {
    /// Check whether every node of `builder` (or of the default builder when
    /// `None`) runs a backend satisfying `req`.
    async fn version_satisfies(&self, builder: Option<&str>, req: &VersionReq) -> Result<bool>;
}

/// Where the orchestrator should write its build metadata.
pub trait MetadataSink: Send + Sync {
    fn metadata_file_path(&self) -> PathBuf;
}

/// A provider with a fixed, known version.
///
/// `None` models a tool that is not available: every check fails.
#[derive(Debug, Clone, Default)]
pub struct StaticVersion {
    version: Option<ToolVersion>,
}

impl StaticVersion {
    pub fn new(version: Option<ToolVersion>) -> Self {
        StaticVersion { version }
    }

    /// Parse a version string such as `v0.18.0`.
    pub fn parse(s: &str) -> Result<Self> {
        let version = ToolVersion::parse(s)
            .with_context(|| format!("invalid version `{}`", s))?;
        Ok(StaticVersion::new(Some(version)))
    }

    fn satisfies(&self, req: &VersionReq) -> bool {
        self.version.as_ref().is_some_and(|v| v.satisfies(req))
    }
}

#[async_trait]
impl OrchestratorCapabilities for StaticVersion {
    async fn version_satisfies(&self, req: &VersionReq) -> Result<bool> {
        Ok(self.satisfies(req))
    }
}

#[async_trait]
impl BackendCapabilities for StaticVersion {
    async fn version_satisfies(&self, _builder: Option<&str>, req: &VersionReq) -> Result<bool> {
        Ok(self.satisfies(req))
    }
}

/// Metadata file at a caller-chosen path.
#[derive(Debug, Clone)]
pub struct FixedMetadataFile {
    path: PathBuf,
}

impl FixedMetadataFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FixedMetadataFile { path: path.into() }
    }

    /// Metadata file inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        FixedMetadataFile::new(dir.join(METADATA_FILE_NAME))
    }
}

impl MetadataSink for FixedMetadataFile {
    fn metadata_file_path(&self) -> PathBuf {
        self.path.clone()
    }
}

/// Metadata file inside a private temporary directory.
///
/// The directory is removed when this value is dropped.
#[derive(Debug)]
pub struct TempMetadataFile {
    dir: TempDir,
}

impl TempMetadataFile {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("bakeplan-")
            .tempdir()
            .context("failed to create metadata directory")?;
        Ok(TempMetadataFile { dir })
    }
}

impl MetadataSink for TempMetadataFile {
    fn metadata_file_path(&self) -> PathBuf {
        self.dir.path().join(METADATA_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::version::at_least;

    #[tokio::test]
    async fn test_static_version_gates() {
        let provider = StaticVersion::parse("v0.17.0").unwrap();
        assert!(OrchestratorCapabilities::version_satisfies(&provider, &at_least(0, 16, 0))
            .await
            .unwrap());
        assert!(!OrchestratorCapabilities::version_satisfies(&provider, &at_least(0, 18, 0))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_missing_tool_fails_every_gate() {
        let provider = StaticVersion::new(None);
        assert!(!BackendCapabilities::version_satisfies(&provider, None, &at_least(0, 0, 1))
            .await
            .unwrap());
    }

    #[test]
    fn test_static_version_rejects_garbage() {
        assert!(StaticVersion::parse("latest").is_err());
    }

    #[test]
    fn test_temp_metadata_file_is_removed_on_drop() {
        let sink = TempMetadataFile::new().unwrap();
        let path = sink.metadata_file_path();
        assert_eq!(path.file_name().unwrap(), METADATA_FILE_NAME);

        let dir = path.parent().unwrap().to_path_buf();
        assert!(dir.exists());
        drop(sink);
        assert!(!dir.exists());
    }

    #[test]
    fn test_fixed_metadata_file() {
        let sink = FixedMetadataFile::in_dir(Path::new("/tmp/meta"));
        assert_eq!(sink.metadata_file_path(), PathBuf::from("/tmp/meta/metadata-file"));
    }
}
