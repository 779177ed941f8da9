//! Planning a bake invocation.
//!
//! Gathers the collaborators the synthesizer needs (definition, capability
//! providers, metadata location, attestation policy) and turns the inputs
//! into a ready-to-run `docker buildx bake` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::capability::{
    BackendCapabilities, FixedMetadataFile, MetadataSink, OrchestratorCapabilities, StaticVersion,
    TempMetadataFile,
};
use crate::builder::docker::{BuildkitCli, BuildxCli};
use crate::builder::synth::{AttestationPolicy, SynthesisContext};
use crate::core::definition::BakeDefinition;
use crate::core::github::RepoVisibility;
use crate::core::inputs::Inputs;
use crate::util::context::GlobalContext;
use crate::util::process::{find_executable, ProcessBuilder};

/// Environment variable the orchestrator reads to authenticate remote git
/// contexts.
pub const GIT_AUTH_TOKEN_ENV: &str = "BUILDX_BAKE_GIT_AUTH_TOKEN";

/// Options for planning an invocation.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    pub inputs: Inputs,

    /// Read the definition from this JSON file instead of `bake --print`
    pub definition: Option<PathBuf>,

    /// Assume this Buildx version instead of asking docker
    pub buildx_version: Option<String>,

    /// Assume this BuildKit version instead of inspecting the builder
    pub buildkit_version: Option<String>,

    /// Write metadata here instead of the configured or temporary location
    pub metadata_file: Option<PathBuf>,

    /// Override the detected repository visibility
    pub visibility: Option<RepoVisibility>,
}

/// Where the metadata file lives for one plan.
#[derive(Debug)]
enum MetadataLocation {
    Fixed(FixedMetadataFile),
    Temp(TempMetadataFile),
}

impl MetadataSink for MetadataLocation {
    fn metadata_file_path(&self) -> PathBuf {
        match self {
            MetadataLocation::Fixed(f) => f.metadata_file_path(),
            MetadataLocation::Temp(t) => t.metadata_file_path(),
        }
    }
}

/// A planned invocation.
///
/// Holds the metadata location alive until the plan is dropped.
#[derive(Debug)]
pub struct BakePlan {
    command: ProcessBuilder,
    // Keeps a temporary metadata directory alive
    _metadata: MetadataLocation,
    metadata_file: Option<PathBuf>,
}

impl BakePlan {
    /// The command to run.
    pub fn command(&self) -> &ProcessBuilder {
        &self.command
    }

    /// Arguments after the docker program, starting with `buildx`.
    pub fn args(&self) -> &[String] {
        self.command.get_args()
    }

    /// Arguments starting at `bake`.
    pub fn bake_args(&self) -> &[String] {
        self.command.get_args().get(1..).unwrap_or(&[])
    }

    /// The metadata file the invocation writes, if the orchestrator supports it.
    pub fn metadata_file(&self) -> Option<&Path> {
        self.metadata_file.as_deref()
    }
}

/// Locate the docker program: configured, found in PATH, or plain `docker`.
pub fn docker_program(ctx: &GlobalContext) -> PathBuf {
    ctx.config()
        .docker
        .program
        .clone()
        .or_else(|| find_executable("docker"))
        .unwrap_or_else(|| PathBuf::from("docker"))
}

/// Plan a bake invocation.
pub async fn plan(ctx: &GlobalContext, opts: &PlanOptions) -> Result<BakePlan> {
    let inputs = &opts.inputs;
    let docker = docker_program(ctx);
    let workdir = ctx.resolve_path(&inputs.workdir);

    let buildx: Box<dyn OrchestratorCapabilities> = match &opts.buildx_version {
        Some(v) => Box::new(StaticVersion::parse(v).context("invalid --buildx-version")?),
        None => Box::new(BuildxCli::new(&docker)),
    };
    let buildkit: Box<dyn BackendCapabilities> = match &opts.buildkit_version {
        Some(v) => Box::new(StaticVersion::parse(v).context("invalid --buildkit-version")?),
        None => Box::new(BuildkitCli::new(&docker)),
    };

    let definition = match &opts.definition {
        Some(path) => BakeDefinition::load(&ctx.resolve_path(path))?,
        None => print_definition(&docker, &workdir, inputs).await?,
    };

    let metadata = match (&opts.metadata_file, &ctx.config().metadata.dir) {
        (Some(path), _) => MetadataLocation::Fixed(FixedMetadataFile::new(ctx.resolve_path(path))),
        (None, Some(dir)) => {
            MetadataLocation::Fixed(FixedMetadataFile::in_dir(&ctx.resolve_path(dir)))
        }
        (None, None) => MetadataLocation::Temp(TempMetadataFile::new()?),
    };

    let policy = AttestationPolicy {
        defaults_enabled: ctx.config().default_attestations(),
        visibility: opts.visibility.unwrap_or(ctx.github().visibility),
        run_url: ctx.github().workflow_run_url(),
    };

    let synthesis = SynthesisContext {
        inputs,
        definition: &definition,
        buildx: buildx.as_ref(),
        buildkit: buildkit.as_ref(),
        metadata: &metadata,
        policy: &policy,
    }
    .synthesize()
    .await?;

    let mut command = ProcessBuilder::new(&docker)
        .arg("buildx")
        .args(&synthesis.args)
        .cwd(&workdir);
    if let Some(token) = &inputs.github_token {
        command = command.env(GIT_AUTH_TOKEN_ENV, token);
    }

    tracing::debug!("Planned `{}`", command.display_command());

    Ok(BakePlan {
        command,
        _metadata: metadata,
        metadata_file: synthesis.metadata_file,
    })
}

/// Arguments for `docker buildx bake --print` matching the inputs.
pub fn print_args(inputs: &Inputs) -> Vec<String> {
    let mut args = vec!["buildx".to_string(), "bake".to_string()];

    if !inputs.source.is_empty() {
        args.push(inputs.source.clone());
    }
    for file in &inputs.files {
        args.push("--file".to_string());
        args.push(file.clone());
    }
    for set in &inputs.set {
        args.push("--set".to_string());
        args.push(set.clone());
    }
    if let Some(builder) = &inputs.builder {
        args.push("--builder".to_string());
        args.push(builder.clone());
    }
    if inputs.load {
        args.push("--load".to_string());
    }
    if inputs.push {
        args.push("--push".to_string());
    }

    args.push("--print".to_string());
    args.extend(inputs.targets.iter().cloned());
    args
}

/// Resolve the bake definition by asking the orchestrator to print it.
pub async fn print_definition(
    docker: &Path,
    workdir: &Path,
    inputs: &Inputs,
) -> Result<BakeDefinition> {
    let mut cmd = ProcessBuilder::new(docker)
        .args(print_args(inputs))
        .cwd(workdir);
    if let Some(token) = &inputs.github_token {
        cmd = cmd.env(GIT_AUTH_TOKEN_ENV, token);
    }

    tracing::debug!("Resolving definition with `{}`", cmd.display_command());

    let stdout = tokio::task::spawn_blocking(move || cmd.exec_stdout())
        .await
        .context("definition task failed")?
        .context("failed to resolve bake definition")?;

    BakeDefinition::from_json(&stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::github::GitHubContext;
    use crate::util::config::Config;
    use tempfile::TempDir;

    fn test_ctx(dir: &Path, config: Config, github: GitHubContext) -> GlobalContext {
        GlobalContext::with_cwd(dir.to_path_buf())
            .with_config(config)
            .with_github(github)
    }

    fn write_definition(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("definition.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    fn static_opts(definition: PathBuf) -> PlanOptions {
        PlanOptions {
            inputs: Inputs {
                workdir: PathBuf::from("."),
                files: vec!["docker-bake.hcl".to_string()],
                targets: vec!["app".to_string()],
                ..Default::default()
            },
            definition: Some(definition),
            buildx_version: Some("0.18.0".to_string()),
            buildkit_version: Some("0.11.0".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_plan_with_static_collaborators() {
        let tmp = TempDir::new().unwrap();
        let def = write_definition(tmp.path(), r#"{"target": {"app": {}}}"#);
        let mut opts = static_opts(def);
        opts.metadata_file = Some(PathBuf::from("meta.json"));
        opts.inputs.github_token = Some("ghs_token".to_string());

        let ctx = test_ctx(tmp.path(), Config::default(), GitHubContext::default());
        let plan = plan(&ctx, &opts).await.unwrap();

        let meta = tmp.path().join("meta.json");
        assert_eq!(plan.metadata_file(), Some(meta.as_path()));
        assert_eq!(
            plan.args(),
            &[
                "buildx".to_string(),
                "bake".to_string(),
                "--allow".to_string(),
                "fs=*".to_string(),
                "--file".to_string(),
                "docker-bake.hcl".to_string(),
                "--metadata-file".to_string(),
                meta.display().to_string(),
                "--provenance".to_string(),
                "mode=max".to_string(),
                "app".to_string(),
            ][..]
        );
        assert_eq!(
            plan.command().get_env().get(GIT_AUTH_TOKEN_ENV).map(String::as_str),
            Some("ghs_token")
        );
        assert_eq!(plan.command().get_cwd(), Some(tmp.path().join(".").as_path()));
    }

    #[tokio::test]
    async fn test_plan_respects_config_opt_out() {
        let tmp = TempDir::new().unwrap();
        let def = write_definition(tmp.path(), "{}");

        let mut config = Config::default();
        config.attestations.defaults = Some(false);
        let ctx = test_ctx(tmp.path(), config, GitHubContext::default());

        let plan = plan(&ctx, &static_opts(def)).await.unwrap();
        assert!(!plan.args().contains(&"--provenance".to_string()));
    }

    #[tokio::test]
    async fn test_plan_private_repository_in_ci() {
        let tmp = TempDir::new().unwrap();
        let def = write_definition(tmp.path(), "{}");
        let github = GitHubContext {
            server_url: "https://github.com".to_string(),
            repository: Some("docker/app".to_string()),
            run_id: Some("7".to_string()),
            run_attempt: Some("1".to_string()),
            visibility: RepoVisibility::Private,
            ..Default::default()
        };
        let ctx = test_ctx(tmp.path(), Config::default(), github);

        let plan = plan(&ctx, &static_opts(def)).await.unwrap();
        assert!(plan.args().contains(
            &"mode=min,inline-only=true,builder-id=https://github.com/docker/app/actions/runs/7/attempts/1"
                .to_string()
        ));
    }

    #[tokio::test]
    async fn test_plan_temp_metadata_without_gate() {
        let tmp = TempDir::new().unwrap();
        let def = write_definition(tmp.path(), "{}");
        let mut opts = static_opts(def);
        opts.buildx_version = Some("0.5.0".to_string());

        let ctx = test_ctx(tmp.path(), Config::default(), GitHubContext::default());
        let plan = plan(&ctx, &opts).await.unwrap();
        assert_eq!(plan.metadata_file(), None);
        assert!(!plan.args().contains(&"--metadata-file".to_string()));
    }

    #[tokio::test]
    async fn test_plan_metadata_not_inferred_from_values() {
        let tmp = TempDir::new().unwrap();
        let def = write_definition(tmp.path(), "{}");
        let mut opts = static_opts(def);
        opts.buildx_version = Some("0.5.0".to_string());
        opts.inputs.set = vec!["app.args.FLAG=--metadata-file".to_string()];
        opts.inputs.targets = vec!["--metadata-file".to_string()];

        let ctx = test_ctx(tmp.path(), Config::default(), GitHubContext::default());
        let plan = plan(&ctx, &opts).await.unwrap();
        assert!(plan.args().contains(&"--metadata-file".to_string()));
        assert_eq!(plan.metadata_file(), None);
    }

    #[tokio::test]
    async fn test_plan_call_unsupported() {
        let tmp = TempDir::new().unwrap();
        let def = write_definition(tmp.path(), "{}");
        let mut opts = static_opts(def);
        opts.buildx_version = Some("0.15.0".to_string());
        opts.inputs.call = Some("check".to_string());

        let ctx = test_ctx(tmp.path(), Config::default(), GitHubContext::default());
        let err = plan(&ctx, &opts).await.unwrap_err();
        assert!(err.to_string().contains("Buildx >= 0.16.0 is required"));
    }

    #[test]
    fn test_print_args() {
        let inputs = Inputs {
            source: "https://github.com/docker/app.git#main".to_string(),
            files: vec!["a.hcl".to_string()],
            set: vec!["*.platform=linux/amd64,linux/arm64".to_string()],
            builder: Some("ci".to_string()),
            load: true,
            targets: vec!["app".to_string()],
            ..Default::default()
        };
        assert_eq!(
            print_args(&inputs),
            vec![
                "buildx",
                "bake",
                "https://github.com/docker/app.git#main",
                "--file",
                "a.hcl",
                "--set",
                "*.platform=linux/amd64,linux/arm64",
                "--builder",
                "ci",
                "--load",
                "--print",
                "app",
            ]
        );
    }
}
