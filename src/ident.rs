//! Identifier helpers
//!
//! Hierarchical identifiers use `.` between segments. Flat identifiers
//! carry their structure in camelCase, which the prefix convention
//! splits at lower-or-digit to upper boundaries.

/// Separator between hierarchical identifier segments.
pub const SEPARATOR: char = '.';

/// Split a camelCase name at every lowercase-or-digit to uppercase
/// boundary, lowercasing each segment. `"DataGridCell"` becomes
/// `["data", "grid", "cell"]`; a name with no boundary comes back as a
/// single segment.
pub fn camel_split(name: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
        current.extend(ch.to_lowercase());
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Rewrite a camelCase name as lowercase segments joined by
/// underscores. `"DataGrid"` becomes `"data_grid"`.
pub fn camel_to_underscore(name: &str) -> String {
    camel_split(name).join("_")
}

/// Strip one leading separator, if present. Alias propagation compares
/// canonical names without it.
pub fn trim_leading_separator(identifier: &str) -> &str {
    identifier.strip_prefix(SEPARATOR).unwrap_or(identifier)
}

/// Split a hierarchical identifier at its last separator into
/// (namespace path, unit name). A flat identifier has an empty
/// namespace path.
pub fn split_last(identifier: &str) -> (&str, &str) {
    match identifier.rfind(SEPARATOR) {
        Some(idx) => (&identifier[..idx], &identifier[idx + 1..]),
        None => ("", identifier),
    }
}
