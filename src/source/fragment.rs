use serde::{Deserialize, Serialize};

/// One rendered line of a source fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentLine {
    /// Right-aligned 1-based line label, padded to the widest label in the window.
    pub line: String,
    /// Raw text of the line.
    pub source: String,
    /// True for the line the fragment was built around.
    pub highlight: bool,
}

/// Extract a bounded window of lines around a 1-based target line.
///
/// The window spans `[max(0, line - context_lines - 1), min(count, line + context_lines))`
/// in 0-based index space. Line labels are padded with leading spaces to the
/// width of the last emitted label so they right-align. Pure function; a
/// target line outside the source yields whatever the clamped window holds.
pub fn create_source_fragment(line: usize, source: &str, context_lines: usize) -> Vec<FragmentLine> {
    // CRLF sources would otherwise render a trailing \r in every line
    let lines: Vec<&str> = source
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect();
    let start_line = line.saturating_sub(context_lines + 1);
    let end_line = std::cmp::min(lines.len(), line + context_lines);
    if start_line >= end_line {
        return Vec::new();
    }

    let label_width = end_line.to_string().len();
    (start_line..end_line)
        .map(|i| FragmentLine {
            line: format!("{:>width$}", i + 1, width = label_width),
            source: lines[i].to_string(),
            highlight: i + 1 == line,
        })
        .collect()
}
