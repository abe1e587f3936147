// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment extraction failures into miette diagnostics.
//!
//! Misspelled keys and enum values (a module name, the session backend) get
//! a "did you mean" hint, and the offending line is highlighted when the
//! TOML source is known.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a candidate must beat to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(civic::config::unknown_key),
        help("{}", correction_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        /// Comma-separated keys the section accepts.
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value outside a closed set, such as `modules = ["grievence"]`.
    #[error("`{value}` is not a valid value for `{key}`")]
    #[diagnostic(
        code(civic::config::unknown_value),
        help("{}", correction_help(suggestion.as_deref(), expected))
    )]
    UnknownValue {
        key: String,
        value: String,
        suggestion: Option<String>,
        expected: String,
        #[label("unrecognized value")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(civic::config::invalid_type))]
    InvalidType {
        key: String,
        detail: String,
        #[label("wrong type")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(civic::config::missing_key),
        help("tenants need `id`, `name` and `channel_id`; org units need `id` and `name`")
    )]
    MissingKey { key: String },

    /// A value that parsed but breaks a semantic rule.
    #[error("validation error: {message}")]
    #[diagnostic(code(civic::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(civic::config::other))]
    Other(String),
}

fn correction_help(suggestion: Option<&str>, accepted: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Accepted: {accepted}"),
        None => format!("accepted: {accepted}"),
    }
}

/// Where an error points inside a loaded TOML file.
#[derive(Default)]
struct Located {
    span: Option<SourceSpan>,
    src: Option<NamedSource<String>>,
}

/// Converts a figment error (which may hold several) into diagnostics.
///
/// `toml_sources` pairs each file path with its content so spans can be
/// attached.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let section: Vec<String> = error.path.iter().map(|s| s.to_string()).collect();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let located = locate(&error, &section, field, None, toml_sources);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        span: located.span,
                        src: located.src,
                    }
                }
                Kind::UnknownVariant(value, expected) => {
                    let (parent, field) = split_last(&section);
                    let located = locate(&error, parent, field, Some(value.as_str()), toml_sources);
                    ConfigError::UnknownValue {
                        key: section.join("."),
                        value: value.clone(),
                        suggestion: suggest_key(&value.to_lowercase(), expected),
                        expected: expected.join(", "),
                        span: located.span,
                        src: located.src,
                    }
                }
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: section
                        .iter()
                        .map(String::as_str)
                        .chain(std::iter::once(&**field))
                        .collect::<Vec<_>>()
                        .join("."),
                },
                Kind::InvalidType(actual, expected) => {
                    let (parent, field) = split_last(&section);
                    let located = locate(&error, parent, field, None, toml_sources);
                    ConfigError::InvalidType {
                        key: section.join("."),
                        detail: format!("found {actual}, expected {expected}"),
                        span: located.span,
                        src: located.src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn split_last(path: &[String]) -> (&[String], &str) {
    match path.split_last() {
        Some((last, parent)) => (parent, last.as_str()),
        None => (path, ""),
    }
}

/// Finds the key (or, with `value`, the quoted value after it) in the file the
/// error came from.
fn locate(
    error: &figment::Error,
    section: &[String],
    field: &str,
    value: Option<&str>,
    toml_sources: &[(String, String)],
) -> Located {
    if field.is_empty() {
        return Located::default();
    }

    let file = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    // String sources have no path; a lone source is unambiguous.
    let source = match file {
        Some(file) => toml_sources.iter().find(|(path, _)| *path == file),
        None if toml_sources.len() == 1 => toml_sources.first(),
        None => None,
    };
    let Some((path, content)) = source else {
        return Located::default();
    };
    let Some(key_offset) = find_key_offset(content, section, field) else {
        return Located::default();
    };

    let span = match value {
        Some(value) => {
            let quoted = format!("\"{value}\"");
            match content[key_offset..].find(&quoted) {
                Some(rel) => SourceSpan::new((key_offset + rel).into(), quoted.len()),
                None => SourceSpan::new(key_offset.into(), field.len()),
            }
        }
        None => SourceSpan::new(key_offset.into(), field.len()),
    };
    Located {
        span: Some(span),
        src: Some(NamedSource::new(path, content.clone())),
    }
}

/// Byte offset of `field` inside the table named by `path`.
///
/// Both `[otp]` and `[[tenants]]` headers open a table; the search ends at
/// the next header that belongs to a different table. An empty path searches
/// the top level.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let section = path.first().map(String::as_str);
    let mut in_section = section.is_none();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            let name = trimmed
                .trim_end()
                .trim_start_matches('[')
                .trim_end_matches(']')
                .trim();
            in_section = match section {
                Some(section) => name == section || name.starts_with(&format!("{section}.")),
                None => false,
            };
        } else if in_section
            && let Some(rest) = trimmed.strip_prefix(field)
            && rest.trim_start().starts_with('=')
        {
            return Some(offset + line.len() - trimmed.len());
        }
        offset += line.len();
    }
    None
}

/// Closest accepted name for a misspelled key or value.
pub fn suggest_key(unknown: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|&c| (strsim::jaro_winkler(unknown, c), c))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c.to_string())
}

/// Prints each diagnostic to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{rendered}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
    if errors.len() > 1 {
        eprintln!("{} configuration problems found", errors.len());
    }
}
