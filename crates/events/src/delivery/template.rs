//! Literal `{placeholder}` substitution for the HTML email body.
//!
//! Templates are authored with doubled braces (`{{` / `}}`) for literal
//! braces, e.g. inside inline CSS. Placeholders without a value are left
//! exactly as written.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{|\}\}|\{(\w+)\}").expect("valid regex"));

/// Substitute `values` into `template`.
pub fn merge(template: &str, values: &[(&str, &str)]) -> String {
    TOKEN_RE
        .replace_all(template, |caps: &Captures<'_>| match &caps[0] {
            "{{" => "{".to_string(),
            "}}" => "}".to_string(),
            whole => {
                let key = &caps[1];
                values
                    .iter()
                    .find(|(name, _)| *name == key)
                    .map(|(_, value)| (*value).to_string())
                    .unwrap_or_else(|| whole.to_string())
            }
        })
        .into_owned()
}
