//! Placeholder substitution for prompt templates.
//!
//! Substitution walks the declared parameters in order and replaces every
//! `{name}` token in the progressively updated text. Resolved values are not
//! escaped: a value containing `{other}` is itself substituted if `other` is
//! declared later. Tokens for undeclared names are left as they are.

use crate::core::{AetherError, ParameterKind, PromptTemplate, TemplateParameter};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

pub type TemplateValues = HashMap<String, Value>;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder pattern"));

static ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)([A-Za-z_][A-Za-z0-9_]*)=").expect("valid assignment pattern"));

/// Produces the final prompt text for `template`.
pub fn render(template: &PromptTemplate, values: &TemplateValues) -> String {
    template
        .parameters
        .iter()
        .fold(template.content.clone(), |content, param| {
            let token = format!("{{{}}}", param.name);
            content.replace(&token, &resolve(param, values))
        })
}

/// The value substituted for `param`: the supplied one, or the declared
/// default when it is missing, null, or an empty string.
pub fn resolve(param: &TemplateParameter, values: &TemplateValues) -> String {
    let value = values
        .get(&param.name)
        .filter(|value| !is_empty(value))
        .unwrap_or(&param.default_value);

    match param.kind {
        ParameterKind::Number => as_number(value),
        _ => as_text(value),
    }
}

/// Initial form values: each parameter's declared default.
pub fn defaults(template: &PromptTemplate) -> TemplateValues {
    template
        .parameters
        .iter()
        .map(|param| (param.name.clone(), param.default_value.clone()))
        .collect()
}

/// Names of `{placeholder}` tokens still present in `text`, in order of
/// first appearance.
pub fn placeholders(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(text) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Parses `name=value` arguments into template values.
pub fn parse_values<'a, I>(pairs: I) -> Result<TemplateValues, AetherError>
where
    I: IntoIterator<Item = &'a str>,
{
    pairs
        .into_iter()
        .map(|pair| {
            let (name, value) = pair.split_once('=').ok_or_else(|| {
                AetherError::Input(format!("Expected name=value, got '{}'", pair))
            })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(AetherError::Input(format!("Missing parameter name in '{}'", pair)));
            }
            Ok((name.to_string(), Value::String(value.to_string())))
        })
        .collect()
}

/// Parses a free-text line of `name=value` assignments for `template`.
///
/// Only `name=` tokens naming a declared parameter start a new value, so a
/// value runs up to the next declared name and may contain spaces or `=`.
pub fn parse_assignments(template: &PromptTemplate, line: &str) -> Result<TemplateValues, AetherError> {
    let line = line.trim();
    let starts: Vec<(usize, usize, &str)> = ASSIGNMENT
        .captures_iter(line)
        .filter_map(|caps| {
            let token = caps.get(0)?;
            let name = caps.get(1)?.as_str();
            template
                .parameters
                .iter()
                .any(|param| param.name == name)
                .then_some((token.start(), token.end(), name))
        })
        .collect();

    match starts.first() {
        None if line.is_empty() => return Ok(TemplateValues::new()),
        None => {
            return Err(AetherError::Input(format!(
                "Expected name=value for one of the template's parameters, got '{}'",
                line
            )));
        }
        Some((start, _, _)) if *start > 0 => {
            return Err(AetherError::Input(format!(
                "Expected name=value, got '{}'",
                line[..*start].trim()
            )));
        }
        Some(_) => {}
    }

    let mut values = TemplateValues::new();
    for (i, (_, value_start, name)) in starts.iter().enumerate() {
        let value_end = starts.get(i + 1).map_or(line.len(), |next| next.0);
        let value = line[*value_start..value_end].trim();
        values.insert(name.to_string(), Value::String(value.to_string()));
    }
    Ok(values)
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        other => other.to_string(),
    }
}

fn as_number(value: &Value) -> String {
    match value {
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(n) => format_number(n),
            // not numeric; substitute the text as typed
            Err(_) => s.clone(),
        },
        Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        other => as_text(other),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
