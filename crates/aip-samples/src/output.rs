//! Helpers for reading back what the samples print.

/// Returns the resource name from the first `name:` line of sample output.
///
/// Surrounding whitespace and quotes are stripped, so both `name: x` and
/// `name: "x"` yield `x`.
#[must_use]
pub fn extract_resource_name(output: &str) -> Option<&str> {
    output
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix("name:"))
        .map(|rest| rest.trim().trim_matches('"'))
        .find(|name| !name.is_empty())
}
