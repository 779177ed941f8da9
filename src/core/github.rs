//! CI repository context.
//!
//! Reads the handful of GitHub Actions environment variables the planner
//! needs: the default git context used as the bake source, the repository
//! visibility that drives provenance defaults, and the workflow run URL
//! recorded as the provenance `builder-id`.

use std::path::Path;

use serde::Deserialize;

/// Default server when `GITHUB_SERVER_URL` is not set.
pub const DEFAULT_SERVER_URL: &str = "https://github.com";

/// Visibility of the repository being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepoVisibility {
    Private,
    Public,
    #[default]
    Unknown,
}

impl RepoVisibility {
    /// Map the `repository.private` field of an event payload.
    pub fn from_private_flag(private: Option<bool>) -> Self {
        match private {
            Some(true) => RepoVisibility::Private,
            Some(false) => RepoVisibility::Public,
            None => RepoVisibility::Unknown,
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self, RepoVisibility::Private)
    }
}

/// Snapshot of the CI environment for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitHubContext {
    /// Server URL, e.g. `https://github.com`
    pub server_url: String,
    /// `owner/repo`
    pub repository: Option<String>,
    /// Fully qualified or short ref that triggered the run
    pub git_ref: Option<String>,
    /// Commit SHA that triggered the run
    pub sha: Option<String>,
    pub run_id: Option<String>,
    pub run_attempt: Option<String>,
    pub visibility: RepoVisibility,
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    repository: Option<EventRepository>,
}

#[derive(Debug, Deserialize)]
struct EventRepository {
    private: Option<bool>,
}

impl GitHubContext {
    /// Build the context from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the context from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let visibility = var("GITHUB_EVENT_PATH")
            .map(|path| read_event_visibility(Path::new(&path)))
            .unwrap_or_default();

        GitHubContext {
            server_url: var("GITHUB_SERVER_URL").unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            repository: var("GITHUB_REPOSITORY"),
            git_ref: var("GITHUB_REF"),
            sha: var("GITHUB_SHA"),
            run_id: var("GITHUB_RUN_ID"),
            run_attempt: var("GITHUB_RUN_ATTEMPT"),
            visibility,
        }
    }

    /// The git reference to build from.
    ///
    /// Short refs are qualified as branches. Unless the run was triggered by
    /// a pull request, the commit SHA is preferred so the build is pinned.
    pub fn git_ref(&self) -> String {
        let mut git_ref = self.git_ref.clone().unwrap_or_default();

        if self.sha.is_some() && !git_ref.is_empty() && !git_ref.starts_with("refs/") {
            git_ref = format!("refs/heads/{}", git_ref);
        }

        if let Some(sha) = &self.sha {
            if !git_ref.starts_with("refs/pull/") {
                git_ref = sha.clone();
            }
        }

        git_ref
    }

    /// The remote git context, e.g. `https://github.com/o/r.git#<sha>`.
    ///
    /// Returns `None` outside of a repository-aware CI run.
    pub fn git_context(&self) -> Option<String> {
        let repository = self.repository.as_ref()?;
        let base = format!(
            "{}/{}.git",
            self.server_url.trim_end_matches('/'),
            repository
        );

        let git_ref = self.git_ref();
        if git_ref.is_empty() {
            Some(base)
        } else {
            Some(format!("{}#{}", base, git_ref))
        }
    }

    /// URL of the current workflow run including the attempt.
    pub fn workflow_run_url(&self) -> Option<String> {
        let repository = self.repository.as_ref()?;
        let run_id = self.run_id.as_ref()?;

        let mut url = format!(
            "{}/{}/actions/runs/{}",
            self.server_url.trim_end_matches('/'),
            repository,
            run_id
        );
        if let Some(attempt) = &self.run_attempt {
            url.push_str(&format!("/attempts/{}", attempt));
        }

        Some(url)
    }
}

fn read_event_visibility(path: &Path) -> RepoVisibility {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read event payload {}: {}", path.display(), e);
            return RepoVisibility::Unknown;
        }
    };

    match serde_json::from_str::<EventPayload>(&contents) {
        Ok(payload) => {
            RepoVisibility::from_private_flag(payload.repository.and_then(|r| r.private))
        }
        Err(e) => {
            tracing::warn!("Failed to parse event payload {}: {}", path.display(), e);
            RepoVisibility::Unknown
        }
    }
}
