use crate::logging;
use crate::source::fetcher::{SourceFetcher, SourceTransport};
use crate::source::fragment::{create_source_fragment, FragmentLine};
use crate::stack::parse::RawFrame;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Synthetic runtime-internal function names that never correspond to user
/// code and are dropped before resolution.
pub const IGNORED_FUNCTION_NAMES: &[&str] = &[
    "__webpack_require__",
    "__webpack_exports__",
    "hotApply",
    "hotCheck",
    "hotDownloadUpdateChunk",
    "hotDownloadManifest",
];

/// A stack frame resolved against fetched sources and their maps.
///
/// Immutable once built. `collapsible` is the frame's own judgement of
/// whether it is non-essential to show by default (vendor and runtime
/// frames); it is computed once here, never re-derived downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedFrame {
    pub id: u32,
    pub file_name: String,
    pub function_name: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub source_fragment: Option<Vec<FragmentLine>>,
    pub original_file_name: Option<String>,
    pub original_line: Option<u32>,
    pub original_column: Option<u32>,
    pub original_source_fragment: Option<Vec<FragmentLine>>,
    pub collapsible: bool,
}

fn is_vendor_uri(file_name: &str) -> bool {
    file_name.contains("node_modules")
        || file_name.contains("/~/")
        || file_name.starts_with("webpack/")
        || file_name.contains("webpack/bootstrap")
}

/// Resolves raw stack frames to original source locations.
pub struct StackResolver<T: SourceTransport> {
    fetcher: Arc<SourceFetcher<T>>,
    context_lines: usize,
}

impl<T: SourceTransport> StackResolver<T> {
    pub fn new(fetcher: Arc<SourceFetcher<T>>, context_lines: usize) -> Self {
        Self {
            fetcher,
            context_lines,
        }
    }

    /// Resolve every frame concurrently, preserving input order.
    ///
    /// Frames without a file URI and frames whose function name is on the
    /// ignore list are dropped up front. `join_all` keeps each result at its
    /// input index regardless of completion order.
    pub async fn map_frames_to_original(&self, frames: Vec<RawFrame>) -> Vec<ResolvedFrame> {
        let surviving: Vec<RawFrame> = frames
            .into_iter()
            .filter(|frame| frame.file_uri.is_some())
            .filter(|frame| {
                frame
                    .function_name
                    .as_deref()
                    .map_or(true, |name| !IGNORED_FUNCTION_NAMES.contains(&name))
            })
            .collect();
        logging::log_resolving_frames(surviving.len());

        let futures = surviving
            .into_iter()
            .enumerate()
            .map(|(index, frame)| self.resolve_frame(index as u32, frame));
        join_all(futures).await
    }

    async fn resolve_frame(&self, id: u32, frame: RawFrame) -> ResolvedFrame {
        let file_uri = frame.file_uri.unwrap_or_default();
        let file = self.fetcher.get(&file_uri, true).await;

        let source_fragment = match (&file, frame.line) {
            (Some(file), Some(line)) => file
                .contents
                .as_deref()
                .map(|contents| create_source_fragment(line as usize, contents, self.context_lines)),
            _ => None,
        };

        let mut original_file_name = None;
        let mut original_line = None;
        let mut original_column = None;
        let mut original_source_fragment = None;
        if let (Some(file), Some(line), Some(column)) = (&file, frame.line, frame.column) {
            if let Some(map) = &file.source_map {
                let position = map.original_position_for(line, column);
                if let Some(source_name) = position.source {
                    original_source_fragment = match (map.source_content(&source_name), position.line)
                    {
                        (Some(content), Some(original)) => Some(create_source_fragment(
                            original as usize,
                            content,
                            self.context_lines,
                        )),
                        _ => None,
                    };
                    original_file_name = Some(source_name);
                    original_line = position.line;
                    original_column = position.column;
                }
            }
        }

        let collapsible = is_vendor_uri(&file_uri);
        ResolvedFrame {
            id,
            file_name: file_uri,
            function_name: frame.function_name,
            line: frame.line,
            column: frame.column,
            source_fragment,
            original_file_name,
            original_line,
            original_column,
            original_source_fragment,
            collapsible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_uris_are_collapsible() {
        assert!(is_vendor_uri("http://localhost/node_modules/react/index.js"));
        assert!(is_vendor_uri("webpack/bootstrap"));
        assert!(!is_vendor_uri("./app/Foo.js"));
    }
}
