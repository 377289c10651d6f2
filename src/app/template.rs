//! Program template engine
//!
//! Line-oriented placeholder substitution for TEAL sources. Each line is split
//! into code and trailing comment; placeholders are only replaced in the code
//! part, never inside quoted strings or `base64`/`b64` literal arguments, and
//! only when they stand as a whole identifier.

use super::errors::TemplateError;
use std::collections::HashMap;

pub const TEMPLATE_PREFIX: &str = "TMPL_";
pub const UPDATABLE_TEMPLATE_NAME: &str = "TMPL_UPDATABLE";
pub const DELETABLE_TEMPLATE_NAME: &str = "TMPL_DELETABLE";

const COMMENT_MARKER: &str = "//";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateValue {
    Int(u64),
    /// Rendered as-is when all digits, otherwise as a hex byte literal
    String(String),
    Bytes(Vec<u8>),
}

impl TemplateValue {
    pub fn render(&self) -> String {
        match self {
            Self::Int(value) => value.to_string(),
            Self::String(value) if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) => {
                value.clone()
            }
            Self::String(value) => format!("0x{}", hex::encode(value.as_bytes())),
            Self::Bytes(value) => format!("0x{}", hex::encode(value)),
        }
    }
}

impl From<u64> for TemplateValue {
    fn from(value: u64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for TemplateValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<Vec<u8>> for TemplateValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// Placeholder name (with or without the `TMPL_` prefix) to value
pub type TemplateParams = HashMap<String, TemplateValue>;

/// Deploy-time updatability/deletability switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeploymentControls {
    pub updatable: Option<bool>,
    pub deletable: Option<bool>,
}

pub fn replace_template_variables(program: &str, params: &TemplateParams) -> String {
    let mut lines: Vec<String> = program.split('\n').map(str::to_string).collect();

    for (name, value) in params {
        let token = if name.starts_with(TEMPLATE_PREFIX) {
            name.clone()
        } else {
            format!("{TEMPLATE_PREFIX}{name}")
        };
        let replacement = value.render();
        for line in lines.iter_mut() {
            *line = replace_in_line(line, &token, &replacement);
        }
    }

    lines.join("\n")
}

fn replace_in_line(line: &str, token: &str, replacement: &str) -> String {
    let comment_start = find_unquoted(line, COMMENT_MARKER).unwrap_or(line.len());
    let (code, comment) = line.split_at(comment_start);
    let mut code = code.to_string();
    let mut resume_at = 0;

    while let Some(index) = find_template_token(&code, token, resume_at) {
        code.replace_range(index..index + token.len(), replacement);
        resume_at = index + replacement.len();
    }

    code.push_str(comment);
    code
}

fn find_template_token(code: &str, token: &str, start: usize) -> Option<usize> {
    let bytes = code.as_bytes();
    let mut index = start;

    while index < code.len() {
        let found = index + find_unquoted(&code[index..], token)?;
        let end = found + token.len();

        let valid_start = found == 0 || !is_identifier_byte(bytes[found - 1]);
        let valid_end = end >= code.len() || !is_identifier_byte(bytes[end]);
        if valid_start && valid_end {
            return Some(found);
        }
        index = end;
    }
    None
}

fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Byte offset of the first `needle` outside string and `base64`/`b64`
/// literals.
pub fn find_unquoted(line: &str, needle: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut in_quotes = false;
    let mut in_base64 = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if !in_quotes && (b == b' ' || b == b'(') && last_token_is_base64(&line[..i]) {
            in_base64 = true;
        } else if !in_quotes && in_base64 && (b == b' ' || b == b')') {
            in_base64 = false;
        } else if in_quotes && b == b'\\' {
            i += 1;
        } else if b == b'"' {
            in_quotes = !in_quotes;
        } else if !in_quotes && !in_base64 && bytes[i..].starts_with(needle.as_bytes()) {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn last_token_is_base64(prefix: &str) -> bool {
    matches!(prefix.split(char::is_whitespace).last(), Some("base64" | "b64"))
}

/// Substitute the deploy-time control placeholders with `1`/`0`. Requesting a
/// control whose placeholder is absent from the program is an error.
pub fn replace_deploy_time_controls(
    program: &str,
    controls: &DeploymentControls,
) -> Result<String, TemplateError> {
    let mut result = program.to_string();

    for (placeholder, flag) in [
        (UPDATABLE_TEMPLATE_NAME, controls.updatable),
        (DELETABLE_TEMPLATE_NAME, controls.deletable),
    ] {
        let Some(flag) = flag else { continue };
        if !program.contains(placeholder) {
            return Err(TemplateError::MissingDeployControl { placeholder });
        }
        result = result.replace(placeholder, if flag { "1" } else { "0" });
    }

    Ok(result)
}

pub fn strip_teal_comments(program: &str) -> String {
    program
        .split('\n')
        .map(|line| match find_unquoted(line, COMMENT_MARKER) {
            Some(index) => line[..index].trim_end(),
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
