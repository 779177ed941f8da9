//! bakeplan - Capability-aware argument synthesis for `docker buildx bake`
//!
//! This crate turns declarative bake inputs into a `docker buildx bake`
//! invocation, emitting only the flags the installed Buildx and BuildKit
//! versions understand.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

pub use builder::synth::{AttestationPolicy, SynthError, SynthesisContext};
pub use crate::core::{definition::BakeDefinition, inputs::Inputs, inputs::RawInputs};
pub use util::context::GlobalContext;
