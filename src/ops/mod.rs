//! High-level operations

pub mod metadata;
pub mod plan;
pub mod run;

pub use plan::{plan, BakePlan, PlanOptions};
pub use run::{run, RunOutcome};
