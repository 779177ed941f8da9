//! Capability providers backed by the docker CLI.
//!
//! `docker buildx version` reports the orchestrator version and
//! `docker buildx inspect` reports the BuildKit version of every node of a
//! builder. Both are queried at most once per provider (per builder name for
//! BuildKit).

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use semver::VersionReq;
use tokio::sync::{Mutex, OnceCell};

use crate::builder::capability::{BackendCapabilities, OrchestratorCapabilities};
use crate::core::version::ToolVersion;
use crate::util::process::ProcessBuilder;

/// Parse the output of `docker buildx version`.
///
/// Example: `github.com/docker/buildx v0.18.0 11c84973ef104e48eb88a41b5b23d6a559efe868`
pub fn parse_buildx_version(stdout: &str) -> Option<ToolVersion> {
    let line = stdout.lines().find(|l| !l.trim().is_empty())?;
    let mut fields = line.split_whitespace();
    let _repo = fields.next()?;
    ToolVersion::parse(fields.next()?)
}

/// Parse the BuildKit version of every node from `docker buildx inspect`.
///
/// Recent Buildx prints `BuildKit version: v0.16.0`, older releases print
/// `Buildkit:  v0.11.6`.
pub fn parse_buildkit_versions(stdout: &str) -> Vec<ToolVersion> {
    stdout
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let key = key.trim().to_lowercase();
            if key == "buildkit" || key == "buildkit version" {
                ToolVersion::parse(value.trim())
            } else {
                None
            }
        })
        .collect()
}

async fn run_docker(docker: PathBuf, args: Vec<String>) -> Result<String> {
    tokio::task::spawn_blocking(move || ProcessBuilder::new(docker).args(args).exec_stdout())
        .await
        .context("docker query task failed")?
}

/// Buildx version from the docker CLI.
#[derive(Debug)]
pub struct BuildxCli {
    docker: PathBuf,
    version: OnceCell<ToolVersion>,
}

impl BuildxCli {
    pub fn new(docker: impl Into<PathBuf>) -> Self {
        BuildxCli {
            docker: docker.into(),
            version: OnceCell::new(),
        }
    }

    /// The installed Buildx version, queried on first use.
    pub async fn version(&self) -> Result<&ToolVersion> {
        self.version
            .get_or_try_init(|| async {
                let stdout =
                    run_docker(self.docker.clone(), vec!["buildx".into(), "version".into()])
                        .await
                        .context("failed to query buildx version")?;
                let version = parse_buildx_version(&stdout).with_context(|| {
                    format!("unrecognized buildx version output: {}", stdout.trim())
                })?;
                tracing::info!("Detected buildx {}", version);
                Ok::<_, anyhow::Error>(version)
            })
            .await
    }
}

#[async_trait]
impl OrchestratorCapabilities for BuildxCli {
    async fn version_satisfies(&self, req: &VersionReq) -> Result<bool> {
        Ok(self.version().await?.satisfies(req))
    }
}

/// BuildKit versions of builder nodes from the docker CLI.
#[derive(Debug)]
pub struct BuildkitCli {
    docker: PathBuf,
    nodes: Mutex<HashMap<Option<String>, Vec<ToolVersion>>>,
}

impl BuildkitCli {
    pub fn new(docker: impl Into<PathBuf>) -> Self {
        BuildkitCli {
            docker: docker.into(),
            nodes: Mutex::new(HashMap::new()),
        }
    }

    /// BuildKit versions of every node of `builder`, queried on first use.
    pub async fn node_versions(&self, builder: Option<&str>) -> Result<Vec<ToolVersion>> {
        let key = builder.map(str::to_string);
        let mut nodes = self.nodes.lock().await;
        if let Some(versions) = nodes.get(&key) {
            return Ok(versions.clone());
        }

        let mut args = vec!["buildx".to_string(), "inspect".to_string()];
        if let Some(name) = builder {
            args.push(name.to_string());
        }

        let stdout = run_docker(self.docker.clone(), args)
            .await
            .with_context(|| {
                format!("failed to inspect builder `{}`", builder.unwrap_or("default"))
            })?;
        let versions = parse_buildkit_versions(&stdout);
        if versions.is_empty() {
            tracing::warn!(
                "No BuildKit version reported for builder `{}`",
                builder.unwrap_or("default")
            );
        }

        nodes.insert(key, versions.clone());
        Ok(versions)
    }
}

#[async_trait]
impl BackendCapabilities for BuildkitCli {
    async fn version_satisfies(&self, builder: Option<&str>, req: &VersionReq) -> Result<bool> {
        let versions = self.node_versions(builder).await?;
        Ok(!versions.is_empty() && versions.iter().all(|v| v.satisfies(req)))
    }
}
