use crate::{OverlayError, Result};
use serde::Deserialize;

/// Raw source map v3 JSON envelope.
#[derive(Debug, Deserialize)]
struct RawSourceMap {
    #[allow(dead_code)]
    version: Option<u32>,
    #[serde(default)]
    sources: Vec<String>,
    #[serde(rename = "sourceRoot")]
    source_root: Option<String>,
    #[serde(rename = "sourcesContent", default)]
    sources_content: Vec<Option<String>>,
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    mappings: String,
}

/// One decoded mapping segment on a generated line.
#[derive(Debug, Clone, Copy)]
struct Segment {
    /// 0-based column in the generated code
    generated_column: u32,
    /// Index into `sources`, if the segment maps to an original file
    source: Option<u32>,
    /// 0-based line in the original source
    original_line: u32,
    /// 0-based column in the original source
    original_column: u32,
    /// Index into `names`, if the segment carries one
    name: Option<u32>,
}

/// An original-source position produced by a generated-position lookup.
///
/// Fields are independently optional: a generated position that falls before
/// the first mapped segment of its line yields an empty position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginalPosition {
    pub source: Option<String>,
    /// 1-based line
    pub line: Option<u32>,
    /// Column in the map's own base (0-based), passed through unchanged
    pub column: Option<u32>,
    /// Original identifier at this position, if the map carries one
    pub name: Option<String>,
}

/// A generated-code position produced by an original-position lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedPosition {
    /// 1-based line
    pub line: Option<u32>,
    /// 0-based column
    pub column: Option<u32>,
}

/// A parsed source map with its VLQ mappings decoded into per-line tables.
///
/// Read-only once constructed; owned by the `SourceFile` that loaded it.
#[derive(Debug)]
pub struct SourceMapIndex {
    sources: Vec<String>,
    source_root: Option<String>,
    sources_content: Vec<Option<String>>,
    names: Vec<String>,
    /// Mapping segments per 0-based generated line, sorted by generated column
    lines: Vec<Vec<Segment>>,
}

impl SourceMapIndex {
    /// Parse a source map from raw JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawSourceMap = serde_json::from_str(json)
            .map_err(|e| OverlayError::SourceMapParse(format!("invalid map JSON: {}", e)))?;
        Self::from_raw(raw)
    }

    /// Parse a source map from decoded bytes (e.g. a base64 `data:` payload).
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: RawSourceMap = serde_json::from_slice(bytes)
            .map_err(|e| OverlayError::SourceMapParse(format!("invalid map JSON: {}", e)))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSourceMap) -> Result<Self> {
        let lines = decode_mappings(&raw.mappings)?;
        Ok(Self {
            sources: raw.sources,
            source_root: raw.source_root,
            sources_content: raw.sources_content,
            names: raw.names,
            lines,
        })
    }

    /// Original position for a generated position.
    ///
    /// `line` is 1-based; `column` is in the map's own base and is compared
    /// against segment columns without renormalization. Picks the greatest
    /// segment at or before `column` on that line.
    pub fn original_position_for(&self, line: u32, column: u32) -> OriginalPosition {
        let segments = match self.lines.get(line.saturating_sub(1) as usize) {
            Some(segments) => segments,
            None => return OriginalPosition::default(),
        };
        let idx = match segments.partition_point(|s| s.generated_column <= column) {
            0 => return OriginalPosition::default(),
            n => n - 1,
        };
        let segment = segments[idx];
        match segment.source {
            Some(source_idx) => OriginalPosition {
                source: self.resolved_source_name(source_idx as usize),
                line: Some(segment.original_line + 1),
                column: Some(segment.original_column),
                name: segment
                    .name
                    .and_then(|idx| self.names.get(idx as usize).cloned()),
            },
            None => OriginalPosition::default(),
        }
    }

    /// Generated position for an original position (inverse lookup).
    ///
    /// `line` is 1-based, `column` 0-based. Returns the first generated
    /// segment on the requested original line at or after `column`.
    pub fn generated_position_for(
        &self,
        source: &str,
        line: u32,
        column: u32,
    ) -> GeneratedPosition {
        let source_idx = match self.source_index(source) {
            Some(idx) => idx as u32,
            None => return GeneratedPosition::default(),
        };

        let mut best: Option<(u32, Segment)> = None;
        for (generated_line, segments) in self.lines.iter().enumerate() {
            for segment in segments {
                if segment.source != Some(source_idx)
                    || segment.original_line + 1 != line
                    || segment.original_column < column
                {
                    continue;
                }
                let better = match &best {
                    Some((_, current)) => segment.original_column < current.original_column,
                    None => true,
                };
                if better {
                    best = Some((generated_line as u32, *segment));
                }
            }
        }

        match best {
            Some((generated_line, segment)) => GeneratedPosition {
                line: Some(generated_line + 1),
                column: Some(segment.generated_column),
            },
            None => GeneratedPosition::default(),
        }
    }

    /// Original file content embedded in the map, by source name.
    pub fn source_content(&self, source: &str) -> Option<&str> {
        let idx = self.source_index(source)?;
        self.sources_content.get(idx)?.as_deref()
    }

    /// Names of all known original sources, with `sourceRoot` applied.
    pub fn source_names(&self) -> Vec<String> {
        (0..self.sources.len())
            .filter_map(|i| self.resolved_source_name(i))
            .collect()
    }

    fn resolved_source_name(&self, idx: usize) -> Option<String> {
        let name = self.sources.get(idx)?;
        match &self.source_root {
            Some(root) if !root.is_empty() => {
                Some(format!("{}/{}", root.trim_end_matches('/'), name))
            }
            _ => Some(name.clone()),
        }
    }

    /// Match a source name with or without the `sourceRoot` prefix.
    fn source_index(&self, source: &str) -> Option<usize> {
        if let Some(idx) = self.sources.iter().position(|s| s == source) {
            return Some(idx);
        }
        (0..self.sources.len()).find(|&i| self.resolved_source_name(i).as_deref() == Some(source))
    }
}

/// Decode the base64-VLQ `mappings` string into per-line segment tables.
///
/// `generated_column` resets at each `;`; source index, original line,
/// original column and name index accumulate across the whole map.
fn decode_mappings(mappings: &str) -> Result<Vec<Vec<Segment>>> {
    let mut lines = Vec::new();
    let mut source: i64 = 0;
    let mut original_line: i64 = 0;
    let mut original_column: i64 = 0;
    let mut name: i64 = 0;

    for group in mappings.split(';') {
        let mut segments = Vec::new();
        let mut generated_column: i64 = 0;
        for chunk in group.split(',') {
            if chunk.is_empty() {
                continue;
            }
            let fields = decode_vlq_segment(chunk)?;
            generated_column += fields[0];
            if generated_column < 0 {
                return Err(OverlayError::SourceMapParse(
                    "negative generated column".to_string(),
                )
                .into());
            }
            let mut mapped_name = None;
            let mapped_source = if fields.len() >= 4 {
                source += fields[1];
                original_line += fields[2];
                original_column += fields[3];
                if source < 0 || original_line < 0 || original_column < 0 {
                    return Err(OverlayError::SourceMapParse(
                        "negative original position".to_string(),
                    )
                    .into());
                }
                if fields.len() == 5 {
                    name += fields[4];
                    if name < 0 {
                        return Err(OverlayError::SourceMapParse(
                            "negative name index".to_string(),
                        )
                        .into());
                    }
                    mapped_name = Some(name as u32);
                }
                Some(source as u32)
            } else {
                None
            };
            segments.push(Segment {
                generated_column: generated_column as u32,
                source: mapped_source,
                original_line: original_line as u32,
                original_column: original_column as u32,
                name: mapped_name,
            });
        }
        segments.sort_by_key(|s| s.generated_column);
        lines.push(segments);
    }

    Ok(lines)
}

/// Decode one comma-delimited VLQ segment into 1, 4 or 5 signed fields.
fn decode_vlq_segment(chunk: &str) -> Result<Vec<i64>> {
    let mut fields = Vec::with_capacity(5);
    let mut value: i64 = 0;
    let mut shift: u32 = 0;

    for ch in chunk.bytes() {
        let digit = base64_digit(ch).ok_or_else(|| {
            OverlayError::SourceMapParse(format!("invalid VLQ character {:?}", ch as char))
        })?;
        value |= ((digit & 0x1f) as i64) << shift;
        if digit & 0x20 != 0 {
            shift += 5;
            if shift > 60 {
                return Err(
                    OverlayError::SourceMapParse("VLQ value out of range".to_string()).into(),
                );
            }
        } else {
            let magnitude = value >> 1;
            fields.push(if value & 1 != 0 { -magnitude } else { magnitude });
            value = 0;
            shift = 0;
        }
    }

    if shift != 0 {
        return Err(OverlayError::SourceMapParse("truncated VLQ segment".to_string()).into());
    }
    match fields.len() {
        1 | 4 | 5 => Ok(fields),
        n => Err(OverlayError::SourceMapParse(format!("VLQ segment with {} fields", n)).into()),
    }
}

fn base64_digit(ch: u8) -> Option<u8> {
    match ch {
        b'A'..=b'Z' => Some(ch - b'A'),
        b'a'..=b'z' => Some(ch - b'a' + 26),
        b'0'..=b'9' => Some(ch - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}
