//! CLI definitions using clap.
//!
//! Every bake input can also be given through the `INPUT_*` environment
//! variable a CI runner sets for it.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use bakeplan::core::RepoVisibility;

/// bakeplan - capability-aware `docker buildx bake` invocations
#[derive(Parser)]
#[command(name = "bakeplan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the bake arguments for the given inputs
    Plan(PlanArgs),

    /// Run docker buildx bake with the planned arguments
    Run(RunArgs),

    /// Print the build references recorded in a metadata file
    Refs(RefsArgs),
}

/// Bake inputs.
#[derive(Args, Clone, Debug)]
pub struct BakeInputArgs {
    /// Builder instance to use (default: current builder)
    #[arg(long, env = "INPUT_BUILDER")]
    pub builder: Option<String>,

    /// Working directory of the bake invocation
    #[arg(long, env = "INPUT_WORKDIR")]
    pub workdir: Option<String>,

    /// Build context; may reference {{ defaultContext }}
    #[arg(long, env = "INPUT_SOURCE")]
    pub source: Option<String>,

    /// Entitlement to grant (repeatable, or comma/newline separated)
    #[arg(long, env = "INPUT_ALLOW")]
    pub allow: Vec<String>,

    /// Evaluation method (build, check, outline, targets)
    #[arg(long, env = "INPUT_CALL")]
    pub call: Option<String>,

    /// Bake definition file (repeatable, or comma/newline separated)
    #[arg(long = "file", short = 'f', env = "INPUT_FILES")]
    pub files: Vec<String>,

    /// Do not use cache when building
    #[arg(long, env = "INPUT_NO-CACHE")]
    pub no_cache: bool,

    /// Always attempt to pull newer base images
    #[arg(long, env = "INPUT_PULL")]
    pub pull: bool,

    /// Load the result into the docker image store
    #[arg(long, env = "INPUT_LOAD")]
    pub load: bool,

    /// Provenance attestation (e.g. mode=max, false)
    #[arg(long, env = "INPUT_PROVENANCE")]
    pub provenance: Option<String>,

    /// Push the result to a registry
    #[arg(long, env = "INPUT_PUSH")]
    pub push: bool,

    /// SBOM attestation (e.g. true, generator=image)
    #[arg(long, env = "INPUT_SBOM")]
    pub sbom: Option<String>,

    /// Target override (repeatable, or newline separated; commas are kept)
    #[arg(long, env = "INPUT_SET")]
    pub set: Vec<String>,

    /// Targets or groups to build
    #[arg(env = "INPUT_TARGETS")]
    pub targets: Vec<String>,

    /// Token for authenticating remote git contexts
    #[arg(long, env = "INPUT_GITHUB-TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,
}

/// Overrides for what is normally detected.
#[derive(Args, Clone, Debug)]
pub struct DetectionArgs {
    /// Read the bake definition from a JSON file instead of `bake --print`
    #[arg(long, value_name = "PATH")]
    pub definition: Option<PathBuf>,

    /// Assume this Buildx version
    #[arg(long, value_name = "VERSION")]
    pub buildx_version: Option<String>,

    /// Assume this BuildKit version
    #[arg(long, value_name = "VERSION")]
    pub buildkit_version: Option<String>,

    /// Metadata file path (default: temporary file)
    #[arg(long, value_name = "PATH")]
    pub metadata_file: Option<PathBuf>,

    /// Git context substituted for {{ defaultContext }}
    #[arg(long, value_name = "CONTEXT")]
    pub default_context: Option<String>,

    /// Repository visibility (default: read from the CI event)
    #[arg(long, value_enum)]
    pub visibility: Option<Visibility>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Visibility {
    Private,
    Public,
    Unknown,
}

impl From<Visibility> for RepoVisibility {
    fn from(v: Visibility) -> Self {
        match v {
            Visibility::Private => RepoVisibility::Private,
            Visibility::Public => RepoVisibility::Public,
            Visibility::Unknown => RepoVisibility::Unknown,
        }
    }
}

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub inputs: BakeInputArgs,

    #[command(flatten)]
    pub detection: DetectionArgs,

    /// Print the arguments as a JSON array
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub inputs: BakeInputArgs,

    #[command(flatten)]
    pub detection: DetectionArgs,
}

#[derive(Args)]
pub struct RefsArgs {
    /// Metadata file written by bake
    pub metadata_file: PathBuf,
}
