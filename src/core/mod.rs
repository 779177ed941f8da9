//! Core data model: inputs, bake definitions, CI context and tool versions.

pub mod definition;
pub mod github;
pub mod inputs;
pub mod version;

pub use definition::BakeDefinition;
pub use github::{GitHubContext, RepoVisibility};
pub use inputs::{Inputs, RawInputs};
pub use version::ToolVersion;
