//! `{{ key }}` placeholder substitution.
//!
//! Substitution is a flat, single-pass key lookup against a [`ParameterSet`].
//! There are no filters, loops or conditionals. Markup already present in the
//! text (`<b>`, `<i>`, entities) is copied through untouched.

use crate::value::{ParameterSet, ValueShape};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("placeholder '{{{{ {key} }}}}' references a parameter that is not set")]
    MissingKey { key: String },
    #[error("placeholder '{{{{ {key} }}}}' references a {shape} parameter; only scalars can be substituted")]
    NonScalar { key: String, shape: ValueShape },
    #[error("malformed placeholder near '{fragment}'")]
    Malformed { fragment: String },
    #[error("parameter '{key}' contains placeholder braces and cannot be substituted")]
    BraceInValue { key: String },
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*\}\}").expect("placeholder pattern")
    })
}

/// Keys referenced by `template`, in order of appearance (duplicates kept).
pub fn placeholders(template: &str) -> Vec<&str> {
    placeholder_regex()
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|key| key.as_str()))
        .collect()
}

/// Returns true when `template` contains no placeholder syntax at all.
pub fn is_literal(template: &str) -> bool {
    !template.contains("{{") && !template.contains("}}")
}

/// Substitute every placeholder in `template` with its scalar parameter.
pub fn render(template: &str, params: &ParameterSet) -> Result<String, TemplateError> {
    if is_literal(template) {
        return Ok(template.to_string());
    }

    let mut rendered = String::with_capacity(template.len());
    let mut cursor = 0;

    for caps in placeholder_regex().captures_iter(template) {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let literal = &template[cursor..whole.start()];
        check_literal(literal)?;
        rendered.push_str(literal);

        let key = key.as_str();
        let value = params.get(key).ok_or_else(|| TemplateError::MissingKey {
            key: key.to_string(),
        })?;
        let text = value.as_scalar().ok_or_else(|| TemplateError::NonScalar {
            key: key.to_string(),
            shape: value.shape(),
        })?;
        // Values are not rescanned, so braces in them would leak into the output.
        if !is_literal(text) {
            return Err(TemplateError::BraceInValue {
                key: key.to_string(),
            });
        }
        rendered.push_str(text);
        cursor = whole.end();
    }

    let tail = &template[cursor..];
    check_literal(tail)?;
    rendered.push_str(tail);

    Ok(rendered)
}

fn check_literal(segment: &str) -> Result<(), TemplateError> {
    let offset = match (segment.find("{{"), segment.find("}}")) {
        (Some(open), Some(close)) => open.min(close),
        (Some(open), None) => open,
        (None, Some(close)) => close,
        (None, None) => return Ok(()),
    };
    let fragment: String = segment[offset..].chars().take(24).collect();
    Err(TemplateError::Malformed { fragment })
}
