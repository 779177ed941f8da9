//! Argument synthesis and the capability providers it consults.

pub mod capability;
pub mod docker;
pub mod provenance;
pub mod synth;

pub use capability::{BackendCapabilities, MetadataSink, OrchestratorCapabilities};
pub use synth::{AttestationPolicy, SynthError, Synthesis, SynthesisContext};
