//! Provenance attestation attributes.

/// Default provenance for private repositories: minimal and never pushed as
/// a separate manifest.
pub const PRIVATE_PROVENANCE: &str = "mode=min,inline-only=true";

/// Default provenance for public (or unknown) repositories.
pub const PUBLIC_PROVENANCE: &str = "mode=max";

const BUILDER_ID_KEY: &str = "builder-id";

/// Complete provenance attributes with the builder id of the current run.
///
/// Attributes that already name a `builder-id` are returned unchanged, as
/// are all attributes when no run URL is known.
pub fn resolve_provenance_attrs(attrs: &str, run_url: Option<&str>) -> String {
    let Some(run_url) = run_url else {
        return attrs.to_string();
    };

    if attrs.is_empty() {
        return format!("{}={}", BUILDER_ID_KEY, run_url);
    }

    let has_builder_id = attrs.split(',').any(|field| {
        field
            .split_once('=')
            .is_some_and(|(key, _)| key.trim() == BUILDER_ID_KEY)
    });

    if has_builder_id {
        attrs.to_string()
    } else {
        format!("{},{}={}", attrs, BUILDER_ID_KEY, run_url)
    }
}
