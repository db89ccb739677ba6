use crate::logging;
use regex::Regex;
use std::sync::OnceLock;

/// A compile-time diagnostic as emitted by the build tool.
#[derive(Debug, Clone)]
pub struct CompilerDiagnostic {
    /// Module identifier, possibly a `!`-joined loader chain
    pub module_name: String,
    /// Optional explicit location string of the shape `line:col` or `line:col-colEnd`,
    /// 0-indexed on both axes
    pub loc: Option<String>,
    /// Free-text message, possibly carrying ANSI color codes
    pub message: String,
}

/// A location resolved from a diagnostic, 1-based on both axes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticLocation {
    pub file_uri: String,
    pub line: u32,
    pub column: u32,
}

/// One entry of the ordered location-pattern table.
struct LocationFamily {
    name: &'static str,
    pattern: Regex,
    /// Added to the matched line number. style-loader prepends two synthetic
    /// header lines to every processed file that must be discounted.
    line_correction: i64,
}

fn location_families() -> &'static [LocationFamily] {
    static FAMILIES: OnceLock<Vec<LocationFamily>> = OnceLock::new();
    FAMILIES.get_or_init(|| {
        vec![
            LocationFamily {
                name: "compiler-location",
                pattern: Regex::new(r"\((\d+):(\d+)\)\s*$").unwrap(),
                line_correction: 0,
            },
            LocationFamily {
                name: "style-loader-location",
                pattern: Regex::new(r"\(line (\d+), column (\d+)\)\s*$").unwrap(),
                line_correction: -2,
            },
        ]
    })
}

fn ansi_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").unwrap())
}

/// Keep only the last segment of a `!`-joined loader chain.
fn sanitize_module_name(module_name: &str) -> Option<&str> {
    if module_name.is_empty() {
        return None;
    }
    module_name.rsplit('!').next().filter(|s| !s.is_empty())
}

/// Resolve a compile diagnostic to a source location.
///
/// Returns at most one location; an unrecognized diagnostic yields an empty
/// list so the caller can still display name and message.
pub fn parse_compile_error(diagnostic: &CompilerDiagnostic) -> Vec<DiagnosticLocation> {
    let module_name = match sanitize_module_name(&diagnostic.module_name) {
        Some(name) => name,
        None => return Vec::new(),
    };

    // An explicit loc from the build tool wins over message scanning.
    if let Some(loc) = diagnostic.loc.as_deref() {
        if let Some(location) = parse_explicit_loc(module_name, loc) {
            return vec![location];
        }
    }

    let needle = module_name
        .strip_prefix("./")
        .or_else(|| module_name.strip_prefix('/'))
        .unwrap_or(module_name);
    let message = ansi_regex().replace_all(&diagnostic.message, "");
    let located_line = message.lines().find(|line| line.contains(needle));
    let located_line = match located_line {
        Some(line) => line,
        None => {
            logging::log_unparseable_diagnostic(module_name);
            return Vec::new();
        }
    };

    for family in location_families() {
        if let Some(captures) = family.pattern.captures(located_line) {
            let raw_line: i64 = captures[1].parse().unwrap_or(0);
            let raw_column: i64 = captures[2].parse().unwrap_or(0);
            let line = (raw_line + family.line_correction).max(1) as u32;
            let column = (raw_column + 1).max(1) as u32;
            tracing::debug!(family = family.name, line, column, "Diagnostic location matched");
            return vec![DiagnosticLocation {
                file_uri: module_name.to_string(),
                line,
                column,
            }];
        }
    }

    logging::log_unparseable_diagnostic(module_name);
    Vec::new()
}

/// Parse a 0-indexed `line:col(-colEnd)?` loc string, shifting both to 1-based.
fn parse_explicit_loc(module_name: &str, loc: &str) -> Option<DiagnosticLocation> {
    let mut parts = loc.split(':');
    let line: u32 = parts.next()?.parse().ok()?;
    let column_part = parts.next()?;
    let column: u32 = column_part.split('-').next()?.parse().ok()?;
    Some(DiagnosticLocation {
        file_uri: module_name.to_string(),
        line: line + 1,
        column: column + 1,
    })
}
