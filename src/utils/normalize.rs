use std::collections::HashSet;

/// Normalizes candidate-supplied string lists: trims whitespace, drops
/// empties, and de-duplicates case-insensitively keeping the first spelling.
pub fn normalize_string_list(values: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            out.push(trimmed.to_string());
        }
    }
    out
}

/// Case-insensitive membership test used by the scoring signals.
pub fn contains_ignore_case(haystack: &[String], needle: &str) -> bool {
    haystack
        .iter()
        .any(|item| item.trim().eq_ignore_ascii_case(needle.trim()))
}
