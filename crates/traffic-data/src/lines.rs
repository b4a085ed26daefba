//! Line filtering ahead of format detection.

/// `true` when the first non-whitespace character of `line` is `#`.
pub fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// Split `content` into lines, dropping blank and comment lines.
///
/// Source order is preserved and trailing whitespace (including `\r`) is
/// removed from every kept line.
pub fn significant_lines(content: &str) -> Vec<&str> {
    content
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty() && !is_comment(line))
        .collect()
}
