//! Global context for bakeplan operations.
//!
//! Provides centralized access to configuration, paths, and the CI
//! environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::github::GitHubContext;
use crate::util::config::{global_config_dir, load_config, project_config_path, Config};

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global bakeplan data (~/.bakeplan/)
    home: PathBuf,

    /// Merged configuration, with environment overrides applied
    config: Config,

    /// CI environment snapshot
    github: GitHubContext,
}

impl GlobalContext {
    /// Create a new GlobalContext from the process environment.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let home = global_config_dir().unwrap_or_else(|| PathBuf::from(".bakeplan"));

        let mut config = load_config(&home.join("config.toml"), &project_config_path(&cwd));
        config.apply_env(|key| std::env::var(key).ok());

        GlobalContext {
            cwd,
            home,
            config,
            github: GitHubContext::from_env(),
        }
    }

    /// Replace the CI environment snapshot.
    pub fn with_github(mut self, github: GitHubContext) -> Self {
        self.github = github;
        self
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn github(&self) -> &GitHubContext {
        &self.github
    }

    /// The ambient git context used as the default bake source.
    ///
    /// Outside CI this is the current directory.
    pub fn default_context(&self) -> String {
        self.github
            .git_context()
            .unwrap_or_else(|| ".".to_string())
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}
