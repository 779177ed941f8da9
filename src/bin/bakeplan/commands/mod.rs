//! Command implementations

pub mod plan;
pub mod refs;
pub mod run;

use bakeplan::core::inputs::{parse_list, Inputs, RawInputs};
use bakeplan::ops::PlanOptions;
use bakeplan::GlobalContext;

use crate::cli::{BakeInputArgs, DetectionArgs};

/// Split every occurrence of a list flag into its entries.
fn flatten_list(values: &[String], ignore_comma: bool) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| parse_list(v, ignore_comma))
        .collect()
}

impl BakeInputArgs {
    /// Raw inputs with list values split.
    pub fn to_raw(&self) -> RawInputs {
        RawInputs {
            builder: self.builder.clone().unwrap_or_default(),
            workdir: self.workdir.clone().unwrap_or_default(),
            source: self.source.clone().unwrap_or_default(),
            allow: flatten_list(&self.allow, false),
            call: self.call.clone().unwrap_or_default(),
            files: flatten_list(&self.files, false),
            no_cache: self.no_cache,
            pull: self.pull,
            load: self.load,
            provenance: self.provenance.clone().unwrap_or_default(),
            push: self.push,
            sbom: self.sbom.clone().unwrap_or_default(),
            set: flatten_list(&self.set, true),
            targets: flatten_list(&self.targets, false),
            github_token: self.github_token.clone().unwrap_or_default(),
        }
    }
}

/// Build plan options from parsed arguments.
pub fn plan_options(
    ctx: &GlobalContext,
    inputs: &BakeInputArgs,
    detection: &DetectionArgs,
) -> PlanOptions {
    let default_context = detection
        .default_context
        .clone()
        .unwrap_or_else(|| ctx.default_context());

    PlanOptions {
        inputs: Inputs::resolve(inputs.to_raw(), &default_context),
        definition: detection.definition.clone(),
        buildx_version: detection.buildx_version.clone(),
        buildkit_version: detection.buildkit_version.clone(),
        metadata_file: detection.metadata_file.clone(),
        visibility: detection.visibility.map(Into::into),
    }
}
