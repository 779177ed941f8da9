//! Bake definition as printed by `docker buildx bake --print`.
//!
//! Only the parts the planner inspects are modeled strictly; every other
//! target attribute is kept as raw JSON.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::inputs::parse_list;

/// Resolved bake definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BakeDefinition {
    #[serde(default)]
    pub group: BTreeMap<String, BakeGroup>,

    #[serde(default)]
    pub target: BTreeMap<String, BakeTarget>,
}

/// A named group of targets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BakeGroup {
    #[serde(default)]
    pub targets: Vec<String>,
}

/// A single resolved target.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BakeTarget {
    pub context: Option<String>,
    pub dockerfile: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub platforms: Vec<String>,

    /// Export outputs, in CSV or object form depending on the Buildx version
    #[serde(default)]
    pub output: Vec<OutputSpec>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// An output entry of a target.
///
/// Older Buildx prints `"type=docker,dest=out.tar"`, newer releases print
/// `{"type": "docker", "dest": "out.tar"}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OutputSpec {
    Csv(String),
    Attrs(BTreeMap<String, serde_json::Value>),
}

/// A parsed exporter entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportEntry {
    /// Exporter type (`docker`, `image`, `registry`, `local`, `tar`, ...)
    pub kind: String,
    pub attrs: BTreeMap<String, String>,
}

/// Exporter type that loads the result straight into the Docker engine.
pub const DOCKER_EXPORTER: &str = "docker";

impl OutputSpec {
    /// Interpret this output as an exporter entry.
    pub fn export_entry(&self) -> ExportEntry {
        match self {
            OutputSpec::Csv(s) => parse_export_entry(s),
            OutputSpec::Attrs(map) => {
                let mut entry = ExportEntry::default();
                for (key, value) in map {
                    let value = match value {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    if key == "type" {
                        entry.kind = value;
                    } else {
                        entry.attrs.insert(key.clone(), value);
                    }
                }
                entry
            }
        }
    }
}

/// Parse a CSV exporter specification such as `type=local,dest=./out`.
///
/// A bare value is shorthand for a local exporter to that directory, and
/// `-` is shorthand for a tarball on stdout.
pub fn parse_export_entry(spec: &str) -> ExportEntry {
    let spec = spec.trim();
    let mut entry = ExportEntry::default();

    if !spec.contains('=') {
        if spec == "-" {
            entry.kind = "tar".to_string();
        } else {
            entry.kind = "local".to_string();
            entry.attrs.insert("dest".to_string(), spec.to_string());
        }
        return entry;
    }

    for field in parse_list(spec, false) {
        let Some((key, value)) = field.split_once('=') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim().to_string();
        if key == "type" {
            entry.kind = value;
        } else {
            entry.attrs.insert(key, value);
        }
    }

    entry
}

impl BakeDefinition {
    /// Parse a definition from the JSON printed by `bake --print`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse bake definition")
    }

    /// Load a definition from a JSON file.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read bake definition: {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("invalid bake definition: {}", path.display()))
    }

    /// All exporters declared across every target.
    pub fn exporters(&self) -> Vec<ExportEntry> {
        self.target
            .values()
            .flat_map(|t| t.output.iter().map(OutputSpec::export_entry))
            .collect()
    }

    /// Check whether any target exports with the given type.
    pub fn has_exporter_type(&self, kind: &str) -> bool {
        self.exporters().iter().any(|e| e.kind == kind)
    }

    /// Check whether the build ends up in the Docker engine image store.
    ///
    /// True when `load` is requested or any target uses the `docker` exporter.
    pub fn has_docker_exporter(&self, load: bool) -> bool {
        load || self.has_exporter_type(DOCKER_EXPORTER)
    }
}
