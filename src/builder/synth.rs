//! Argument synthesis for `docker buildx bake`.
//!
//! The invocation is assembled in three phases, always concatenated in this
//! order:
//!
//! 1. bake arguments: source, entitlements, call mode, files, overrides,
//!    metadata file and attestations. Most of these are gated on the
//!    installed Buildx (and, for default provenance, BuildKit) version.
//! 2. common arguments: `--no-cache`, `--builder`, `--pull`, `--load`,
//!    `--push`.
//! 3. targets, verbatim.
//!
//! Every gate is listed in [`GATES`]. An unmet gate drops its arguments,
//! except for `--call`, which cannot be silently ignored and fails the
//! whole synthesis.

use std::fmt;
use std::path::PathBuf;

use semver::VersionReq;
use thiserror::Error;

use crate::builder::capability::{BackendCapabilities, MetadataSink, OrchestratorCapabilities};
use crate::builder::provenance::{resolve_provenance_attrs, PRIVATE_PROVENANCE, PUBLIC_PROVENANCE};
use crate::core::definition::BakeDefinition;
use crate::core::github::RepoVisibility;
use crate::core::inputs::Inputs;
use crate::core::version::at_least;

/// Leading token selecting the bake sub-command.
pub const BAKE_COMMAND: &str = "bake";

/// Filesystem entitlement granted implicitly by recent Buildx releases.
pub const FS_WILDCARD_ENTITLEMENT: &str = "fs=*";

/// Tool whose version a gate depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Buildx,
    Buildkit,
}

impl Tool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Buildx => "Buildx",
            Tool::Buildkit => "BuildKit",
        }
    }
}

/// A capability gate controlling one group of arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// `--allow` is understood at all
    Entitlements,
    /// `fs=*` is added to the entitlements
    FsWildcard,
    /// `--call` is understood
    Call,
    /// `--metadata-file` is understood
    MetadataFile,
    /// `--provenance` / `--sbom` are understood
    Attestations,
    /// The backend can produce provenance by default
    DefaultProvenance,
}

/// One row of the gate table.
#[derive(Debug, Clone, Copy)]
pub struct GateSpec {
    pub gate: Gate,
    pub tool: Tool,
    pub min: (u64, u64, u64),
}

/// Gate table, in the order the gates are evaluated.
pub const GATES: &[GateSpec] = &[
    GateSpec { gate: Gate::Entitlements, tool: Tool::Buildx, min: (0, 17, 0) },
    GateSpec { gate: Gate::FsWildcard, tool: Tool::Buildx, min: (0, 18, 0) },
    GateSpec { gate: Gate::Call, tool: Tool::Buildx, min: (0, 16, 0) },
    GateSpec { gate: Gate::MetadataFile, tool: Tool::Buildx, min: (0, 6, 0) },
    GateSpec { gate: Gate::Attestations, tool: Tool::Buildx, min: (0, 10, 0) },
    GateSpec { gate: Gate::DefaultProvenance, tool: Tool::Buildkit, min: (0, 11, 0) },
];

impl Gate {
    /// Look up this gate's row in [`GATES`].
    pub fn spec(self) -> &'static GateSpec {
        GATES
            .iter()
            .find(|s| s.gate == self)
            .unwrap_or_else(|| unreachable!("gate {:?} missing from GATES", self))
    }
}

impl GateSpec {
    pub fn requirement(&self) -> VersionReq {
        let (major, minor, patch) = self.min;
        at_least(major, minor, patch)
    }
}

impl fmt::Display for GateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (major, minor, patch) = self.min;
        write!(f, "{} >= {}.{}.{}", self.tool.as_str(), major, minor, patch)
    }
}

/// Error during argument synthesis.
#[derive(Debug, Error)]
pub enum SynthError {
    /// `call` was requested but the installed Buildx cannot honor it.
    #[error("{requirement} is required to use the call flag.")]
    CallUnsupported { requirement: String },

    /// A capability provider failed.
    #[error(transparent)]
    Capability(#[from] anyhow::Error),
}

/// How default attestations are decided.
#[derive(Debug, Clone, Default)]
pub struct AttestationPolicy {
    /// Whether a default provenance may be added at all
    pub defaults_enabled: bool,
    pub visibility: RepoVisibility,
    /// URL of the CI run, recorded as the provenance builder id
    pub run_url: Option<String>,
}

impl AttestationPolicy {
    /// The default provenance attributes for the repository visibility.
    pub fn default_provenance(&self) -> String {
        let attrs = if self.visibility.is_private() {
            PRIVATE_PROVENANCE
        } else {
            PUBLIC_PROVENANCE
        };
        resolve_provenance_attrs(attrs, self.run_url.as_deref())
    }
}

/// Everything a single synthesis looks at.
pub struct SynthesisContext<'a> {
    pub inputs: &'a Inputs,
    pub definition: &'a BakeDefinition,
    pub buildx: &'a dyn OrchestratorCapabilities,
    pub buildkit: &'a dyn BackendCapabilities,
    pub metadata: &'a dyn MetadataSink,
    pub policy: &'a AttestationPolicy,
}

/// Outcome of a synthesis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Synthesis {
    /// Arguments after the `docker buildx` prefix
    pub args: Vec<String>,
    /// Metadata file passed with `--metadata-file`, if the gate allowed it
    pub metadata_file: Option<PathBuf>,
}

impl SynthesisContext<'_> {
    /// Produce the full argument list, after the `docker buildx` prefix.
    pub async fn args(&self) -> Result<Vec<String>, SynthError> {
        Ok(self.synthesize().await?.args)
    }

    /// Produce the argument list along with the gate-dependent outputs.
    pub async fn synthesize(&self) -> Result<Synthesis, SynthError> {
        let mut synthesis = Synthesis::default();
        self.bake_args(&mut synthesis).await?;
        synthesis.args.extend(common_args(self.inputs));
        synthesis.args.extend(self.inputs.targets.iter().cloned());
        Ok(synthesis)
    }

    async fn bake_args(&self, synthesis: &mut Synthesis) -> Result<(), SynthError> {
        let inputs = self.inputs;
        let args = &mut synthesis.args;
        args.push(BAKE_COMMAND.to_string());

        if !inputs.source.is_empty() {
            args.push(inputs.source.clone());
        }

        if self.check(Gate::Entitlements).await? {
            let fs_wildcard = self.check(Gate::FsWildcard).await?;
            for allow in entitlements(&inputs.allow, fs_wildcard) {
                args.push("--allow".to_string());
                args.push(allow);
            }
        }

        if let Some(call) = &inputs.call {
            if !self.check(Gate::Call).await? {
                return Err(SynthError::CallUnsupported {
                    requirement: Gate::Call.spec().to_string(),
                });
            }
            args.push("--call".to_string());
            args.push(call.clone());
        }

        for file in &inputs.files {
            args.push("--file".to_string());
            args.push(file.clone());
        }

        for set in &inputs.set {
            args.push("--set".to_string());
            args.push(set.clone());
        }

        if self.check(Gate::MetadataFile).await? {
            let path = self.metadata.metadata_file_path();
            args.push("--metadata-file".to_string());
            args.push(path.display().to_string());
            synthesis.metadata_file = Some(path);
        }

        if self.check(Gate::Attestations).await? {
            if let Some(provenance) = &inputs.provenance {
                args.push("--provenance".to_string());
                args.push(provenance.clone());
            } else if let Some(provenance) = self.default_provenance().await? {
                args.push("--provenance".to_string());
                args.push(provenance);
            }

            if let Some(sbom) = &inputs.sbom {
                args.push("--sbom".to_string());
                args.push(sbom.clone());
            }
        }

        Ok(())
    }

    /// Default provenance, when nothing prevents it.
    async fn default_provenance(&self) -> Result<Option<String>, SynthError> {
        if !self.policy.defaults_enabled {
            tracing::debug!("Default attestations disabled");
            return Ok(None);
        }

        if !self.check(Gate::DefaultProvenance).await? {
            return Ok(None);
        }

        // Images loaded into the engine store cannot carry attestations
        if self.definition.has_docker_exporter(self.inputs.load) {
            tracing::debug!("Skipping default provenance: result is loaded into docker");
            return Ok(None);
        }

        Ok(Some(self.policy.default_provenance()))
    }

    async fn check(&self, gate: Gate) -> Result<bool, SynthError> {
        let spec = gate.spec();
        let req = spec.requirement();

        let satisfied = match spec.tool {
            Tool::Buildx => self.buildx.version_satisfies(&req).await?,
            Tool::Buildkit => {
                self.buildkit
                    .version_satisfies(self.inputs.builder.as_deref(), &req)
                    .await?
            }
        };

        tracing::debug!("{:?} gate ({}): {}", gate, spec, satisfied);
        Ok(satisfied)
    }
}

/// Entitlements to pass, adding the filesystem wildcard once if requested.
///
/// Returns a new list; the inputs are left untouched.
pub fn entitlements(allow: &[String], fs_wildcard: bool) -> Vec<String> {
    let mut list = allow.to_vec();
    if fs_wildcard && !list.iter().any(|a| a == FS_WILDCARD_ENTITLEMENT) {
        list.push(FS_WILDCARD_ENTITLEMENT.to_string());
    }
    list
}

/// Flags shared by every bake invocation.
pub fn common_args(inputs: &Inputs) -> Vec<String> {
    let mut args = Vec::new();

    if inputs.no_cache {
        args.push("--no-cache".to_string());
    }
    if let Some(builder) = &inputs.builder {
        args.push("--builder".to_string());
        args.push(builder.clone());
    }
    if inputs.pull {
        args.push("--pull".to_string());
    }
    if inputs.load {
        args.push("--load".to_string());
    }
    if inputs.push {
        args.push("--push".to_string());
    }

    args
}
