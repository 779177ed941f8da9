//! Template rendering for input values.
//!
//! Inputs such as the bake source may reference the ambient git context as
//! `{{ defaultContext }}`, e.g. `{{ defaultContext }}:docker` to build a
//! subdirectory of the remote repository.

use minijinja::{context, Environment};

/// Name of the variable bound to the ambient git context.
pub const DEFAULT_CONTEXT_VAR: &str = "defaultContext";

/// Render a template with `defaultContext` bound to `default_context`.
pub fn render_with_default_context(
    template: &str,
    default_context: &str,
) -> Result<String, minijinja::Error> {
    let env = Environment::new();
    env.render_str(template, context! { defaultContext => default_context })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_default_context() {
        let out = render_with_default_context(
            "{{ defaultContext }}:docker",
            "https://github.com/docker/app.git#main",
        )
        .unwrap();
        assert_eq!(out, "https://github.com/docker/app.git#main:docker");
    }

    #[test]
    fn test_render_plain_string() {
        assert_eq!(render_with_default_context("./app", "ctx").unwrap(), "./app");
    }

    #[test]
    fn test_render_does_not_escape() {
        let out = render_with_default_context("{{ defaultContext }}", "a&b<c>").unwrap();
        assert_eq!(out, "a&b<c>");
    }

    #[test]
    fn test_render_syntax_error() {
        assert!(render_with_default_context("{{ defaultContext", "ctx").is_err());
    }
}
