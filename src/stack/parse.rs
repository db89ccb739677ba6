use regex::Regex;
use std::sync::OnceLock;

/// One unresolved stack entry, as split out of raw trace text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub function_name: Option<String>,
    pub file_uri: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

fn v8_named_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*at\s+(.+?)\s+\((.+?):(\d+):(\d+)\)\s*$").unwrap())
}

fn v8_anonymous_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*at\s+(.+?):(\d+):(\d+)\s*$").unwrap())
}

fn gecko_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?:(.*?)@)?(.+?):(\d+):(\d+)\s*$").unwrap())
}

/// Split raw stack-trace text into frames.
///
/// Understands V8 (`at func (file:line:col)`, `at file:line:col`) and Gecko
/// (`func@file:line:col`) shapes; lines matching neither (including the
/// leading message line) are skipped.
pub fn parse_stack_trace(stack: &str) -> Vec<RawFrame> {
    stack.lines().filter_map(parse_frame_line).collect()
}

fn parse_frame_line(line: &str) -> Option<RawFrame> {
    if let Some(captures) = v8_named_regex().captures(line) {
        return Some(RawFrame {
            function_name: Some(captures[1].to_string()),
            file_uri: Some(captures[2].to_string()),
            line: captures[3].parse().ok(),
            column: captures[4].parse().ok(),
        });
    }
    if let Some(captures) = v8_anonymous_regex().captures(line) {
        return Some(RawFrame {
            function_name: None,
            file_uri: Some(captures[1].to_string()),
            line: captures[2].parse().ok(),
            column: captures[3].parse().ok(),
        });
    }
    // Gecko last: its shape is permissive enough to shadow the V8 forms.
    if let Some(captures) = gecko_regex().captures(line) {
        let function_name = captures
            .get(1)
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());
        return Some(RawFrame {
            function_name,
            file_uri: Some(captures[2].to_string()),
            line: captures[3].parse().ok(),
            column: captures[4].parse().ok(),
        });
    }
    None
}
