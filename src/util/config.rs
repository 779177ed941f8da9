//! Configuration file support for bakeplan.
//!
//! Two configuration file locations are read:
//! - Global: `~/.bakeplan/config.toml` - User-wide defaults
//! - Project: `.bakeplan/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. The
//! `BUILDX_NO_DEFAULT_ATTESTATIONS` environment variable takes precedence
//! over both for attestation defaults.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Environment variable disabling default attestations.
pub const NO_DEFAULT_ATTESTATIONS_ENV: &str = "BUILDX_NO_DEFAULT_ATTESTATIONS";

/// bakeplan configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Docker CLI settings
    pub docker: DockerConfig,

    /// Attestation settings
    pub attestations: AttestationConfig,

    /// Metadata file settings
    pub metadata: MetadataConfig,
}

/// Docker CLI settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Path to the docker binary (default: found in PATH)
    pub program: Option<PathBuf>,
}

/// Attestation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AttestationConfig {
    /// Whether a default provenance attestation is added (default: true)
    pub defaults: Option<bool>,
}

/// Metadata file settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Directory for the metadata file (default: a temporary directory)
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.docker.program.is_some() {
            self.docker.program = other.docker.program;
        }
        if other.attestations.defaults.is_some() {
            self.attestations.defaults = other.attestations.defaults;
        }
        if other.metadata.dir.is_some() {
            self.metadata.dir = other.metadata.dir;
        }
    }

    /// Apply environment overrides.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let Some(value) = lookup(NO_DEFAULT_ATTESTATIONS_ENV) else {
            return;
        };

        match parse_bool(&value) {
            Ok(true) => self.attestations.defaults = Some(false),
            Ok(false) => {}
            Err(e) => tracing::warn!("Ignoring {}: {}", NO_DEFAULT_ATTESTATIONS_ENV, e),
        }
    }

    /// Whether default attestations are enabled.
    pub fn default_attestations(&self) -> bool {
        self.attestations.defaults.unwrap_or(true)
    }
}

/// Parse a boolean the way Go's `strconv.ParseBool` does.
pub fn parse_bool(value: &str) -> Result<bool> {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        other => bail!("invalid boolean value `{}`", other),
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.bakeplan/config.toml)
/// 2. Global config (~/.bakeplan/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global bakeplan config directory (~/.bakeplan).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".bakeplan"))
}

/// Get the project config path (.bakeplan/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".bakeplan").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[docker]
program = "/usr/local/bin/docker"

[attestations]
defaults = false

[metadata]
dir = "/tmp/bake-meta"
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(
            config.docker.program,
            Some(PathBuf::from("/usr/local/bin/docker"))
        );
        assert!(!config.default_attestations());
        assert_eq!(config.metadata.dir, Some(PathBuf::from("/tmp/bake-meta")));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert!(config.default_attestations());
        assert_eq!(config.docker.program, None);
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(
            &global_path,
            r#"
[docker]
program = "/usr/bin/docker"

[attestations]
defaults = false
"#,
        )
        .unwrap();

        std::fs::write(
            &project_path,
            r#"
[attestations]
defaults = true
"#,
        )
        .unwrap();

        let config = load_config(&global_path, &project_path);

        // Global docker path should be preserved
        assert_eq!(config.docker.program, Some(PathBuf::from("/usr/bin/docker")));
        // Project should re-enable attestations
        assert!(config.default_attestations());
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[attestations]\ndefaults = \"maybe\"\n").unwrap();

        assert!(Config::load(&path).is_err());
        assert_eq!(Config::load_or_default(&path), Config::default());
    }

    #[test]
    fn test_env_opt_out() {
        let mut config = Config::default();
        config.apply_env(|key| (key == NO_DEFAULT_ATTESTATIONS_ENV).then(|| "1".to_string()));
        assert!(!config.default_attestations());
    }

    #[test]
    fn test_env_false_keeps_config() {
        let mut config = Config::default();
        config.apply_env(|_| Some("false".to_string()));
        assert!(config.default_attestations());

        config.apply_env(|_| Some("nope".to_string()));
        assert!(config.default_attestations());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("yes").is_err());
    }
}
