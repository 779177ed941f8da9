//! Shared utilities

pub mod config;
pub mod context;
pub mod process;
pub mod template;

pub use config::Config;
pub use context::GlobalContext;
