use crate::stack::resolver::ResolvedFrame;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Discriminates build-time diagnostics from runtime exceptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Compile,
    Runtime,
}

/// A resolved frame plus its per-error display flags.
#[derive(Debug, Clone)]
pub struct FrameWrapper {
    /// Unique within the owning error, not globally
    pub id: u32,
    pub frame: Arc<ResolvedFrame>,
    pub show_original: bool,
    pub is_visible: bool,
}

/// One displayed error and its ordered frames.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub id: u32,
    pub name: String,
    pub message: String,
    pub kind: ErrorKind,
    /// Insertion-ordered frame id -> wrapper map
    pub frames: IndexMap<u32, FrameWrapper>,
    /// Count of frames currently hidden by the collapse rule
    pub collapsed_frames_count: usize,
}

/// The whole overlay display state.
///
/// Created at overlay mount, transformed only by the pure transitions in
/// `aggregator`, discarded on unmount.
#[derive(Debug, Clone)]
pub struct OverlayState {
    pub current_error_id: Option<u32>,
    /// Global default for newly wrapped frames and the untargeted view toggle
    pub show_original: bool,
    pub errors: IndexMap<u32, ErrorRecord>,
    pub(crate) next_error_id: u32,
}

impl OverlayState {
    pub fn new() -> Self {
        Self {
            current_error_id: None,
            show_original: true,
            errors: IndexMap::new(),
            next_error_id: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn current_error(&self) -> Option<&ErrorRecord> {
        self.current_error_id.and_then(|id| self.errors.get(&id))
    }
}

impl Default for OverlayState {
    fn default() -> Self {
        Self::new()
    }
}
