//! Splitting documentation text into comment lines.

/// Splits raw member documentation into lines.
///
/// Leading and trailing blank lines are dropped, the indentation shared by all non-blank
/// lines is removed and trailing whitespace is trimmed. Blank lines inside the text are
/// kept as empty strings.
#[must_use]
pub fn doc_lines(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();

    let Some(first) = lines.iter().position(|line| !line.is_empty()) else {
        return Vec::new();
    };
    let last = lines
        .iter()
        .rposition(|line| !line.is_empty())
        .unwrap_or(first);
    let lines = &lines[first..=last];

    let indent = lines
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|line| line.get(indent..).unwrap_or("").to_string())
        .collect()
}
