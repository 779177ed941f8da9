//! The normalized input model for one bake invocation.

use std::path::PathBuf;

use crate::util::template::render_with_default_context;

/// Source value meaning "the current directory", which bake uses when no
/// source positional argument is given.
pub const CURRENT_DIR_SOURCE: &str = ".";

/// Raw, unresolved inputs as read from flags or the environment.
///
/// List inputs have already been split into entries. `source` still holds
/// the unrendered template.
#[derive(Debug, Clone, Default)]
pub struct RawInputs {
    pub builder: String,
    pub workdir: String,
    pub source: String,
    pub allow: Vec<String>,
    pub call: String,
    pub files: Vec<String>,
    pub no_cache: bool,
    pub pull: bool,
    pub load: bool,
    pub provenance: String,
    pub push: bool,
    pub sbom: String,
    pub set: Vec<String>,
    pub targets: Vec<String>,
    pub github_token: String,
}

/// Inputs after normalization.
///
/// Constructed once per invocation and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inputs {
    /// Builder instance; `None` uses the current default builder
    pub builder: Option<String>,
    pub workdir: PathBuf,
    /// Resolved source; empty means no positional source argument
    pub source: String,
    /// Entitlements, in order
    pub allow: Vec<String>,
    pub call: Option<String>,
    pub files: Vec<String>,
    pub no_cache: bool,
    pub pull: bool,
    pub load: bool,
    pub provenance: Option<String>,
    pub push: bool,
    pub sbom: Option<String>,
    /// Target overrides, kept verbatim
    pub set: Vec<String>,
    pub targets: Vec<String>,
    pub github_token: Option<String>,
}

impl Inputs {
    /// Normalize raw inputs against the ambient git context.
    pub fn resolve(raw: RawInputs, default_context: &str) -> Self {
        let workdir = if raw.workdir.is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(raw.workdir)
        };

        Inputs {
            builder: non_empty(raw.builder),
            workdir,
            source: resolve_source(&raw.source, default_context),
            allow: raw.allow,
            call: non_empty(raw.call),
            files: raw.files,
            no_cache: raw.no_cache,
            pull: raw.pull,
            load: raw.load,
            provenance: non_empty(raw.provenance),
            push: raw.push,
            sbom: non_empty(raw.sbom),
            set: raw.set,
            targets: raw.targets,
            github_token: non_empty(raw.github_token),
        }
    }
}

/// Resolve the bake source from its template.
///
/// A template that fails to render counts as empty. An empty result falls
/// back to the ambient context, and exactly `"."` becomes `""` so that no
/// source argument is emitted.
pub fn resolve_source(template: &str, default_context: &str) -> String {
    let rendered = if template.is_empty() {
        String::new()
    } else {
        match render_with_default_context(template, default_context) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Failed to render source `{}`: {}", template, e);
                String::new()
            }
        }
    };

    let source = if rendered.is_empty() {
        default_context.to_string()
    } else {
        rendered
    };

    if source == CURRENT_DIR_SOURCE {
        String::new()
    } else {
        source
    }
}

/// Split a multi-value input into entries.
///
/// Entries are separated by newlines, and also by commas unless
/// `ignore_comma` is set. Blank entries are dropped. With commas enabled,
/// a double-quoted entry may contain commas.
pub fn parse_list(input: &str, ignore_comma: bool) -> Vec<String> {
    let mut items = Vec::new();

    for line in input.lines() {
        if ignore_comma {
            push_trimmed(&mut items, line);
            continue;
        }

        let mut current = String::new();
        let mut quoted = false;
        for c in line.chars() {
            match c {
                '"' => quoted = !quoted,
                ',' if !quoted => push_trimmed(&mut items, &std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
        push_trimmed(&mut items, &current);
    }

    items
}

fn push_trimmed(items: &mut Vec<String>, item: &str) {
    let item = item.trim();
    if !item.is_empty() {
        items.push(item.to_string());
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
