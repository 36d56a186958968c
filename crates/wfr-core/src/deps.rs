/// Separator the scheduler uses inside an action's missing-dependency field.
pub const DEPENDENCY_SEPARATOR: char = '#';

/// Splits the raw `#`-joined missing-dependency field.
///
/// An empty field means "nothing missing" and yields no paths, so callers
/// never see an empty path string.
pub fn split_missing_dependencies(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return vec![];
    }
    raw.split(DEPENDENCY_SEPARATOR).map(str::to_string).collect()
}
