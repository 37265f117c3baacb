//! Name sanitation for the Python target.
//!
//! Every identifier that reaches generated source text goes through one of
//! these functions. `sanitize_name` is total and idempotent: it never fails
//! on arbitrary input, and re-sanitizing an already sanitized name is a
//! no-op.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Python reserved words that cannot be used as identifiers.
pub static PYTHON_KEYWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
        "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
        "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
        "try", "while", "with", "yield",
    ]
    .into_iter()
    .collect()
});

/// Default disambiguation prefix for model names.
pub const MODEL_PREFIX: &str = "Model";

/// Sanitize a schema or model name into a valid Python class identifier.
///
/// 1. Replace characters outside `[A-Za-z0-9_ ]` with underscores.
/// 2. Keep only the portion after the last underscore (concise names:
///    `Tfl.Api.Presentation.Entities.Mode` becomes `Mode`).
/// 3. Join space-separated words CamelCase (`Lift Disruptions` becomes
///    `LiftDisruptions`).
/// 4. Prepend `<prefix>_` when the result starts with a digit or is a
///    Python keyword.
pub fn sanitize_with_prefix(name: &str, prefix: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let tail = cleaned.rsplit('_').next().unwrap_or("");

    let mut result = String::new();
    for (i, word) in tail.split_whitespace().enumerate() {
        if i == 0 {
            result.push_str(word);
        } else {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                result.extend(first.to_uppercase());
                result.push_str(chars.as_str());
            }
        }
    }

    if result.is_empty() {
        return prefix.to_string();
    }

    let starts_with_digit = result
        .chars()
        .next()
        .map(|c| c.is_ascii_digit())
        .unwrap_or(false);
    if starts_with_digit || PYTHON_KEYWORDS.contains(result.as_str()) {
        result = format!("{prefix}_{result}");
    }

    result
}

/// Sanitize with the default `Model` prefix.
pub fn sanitize_name(name: &str) -> String {
    sanitize_with_prefix(name, MODEL_PREFIX)
}

/// Sanitize a field name: Python keywords get a `_field` suffix, everything
/// else passes through unchanged so the wire name is preserved.
pub fn sanitize_field_name(name: &str) -> String {
    if PYTHON_KEYWORDS.contains(name) {
        format!("{name}_field")
    } else {
        name.to_string()
    }
}

/// Derive a client method name from an operationId, targeting Python
/// call-site casing. Uses the model sanitizer (prefix `Query` for ids that
/// would otherwise collide with keywords or start with a digit), lowercased.
pub fn method_name(operation_id: &str) -> String {
    sanitize_with_prefix(operation_id, "Query").to_lowercase()
}

/// Clean an enum member name: non-word characters become underscores, outer
/// underscores are stripped, the rest is uppercased.
pub fn clean_enum_name(value: &str) -> String {
    let replaced: String = value
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    replaced.trim_matches('_').to_uppercase()
}

/// Capitalize the first letter only, leaving the rest as is.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Extract the terminal segment of a `$ref` pointer and sanitize it.
pub fn ref_to_model_name(ref_path: &str) -> String {
    let last = ref_path.rsplit('/').next().unwrap_or(ref_path);
    sanitize_name(last)
}
