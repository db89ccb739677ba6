use crate::overlay::state::{ErrorKind, ErrorRecord, FrameWrapper, OverlayState};
use crate::stack::resolver::ResolvedFrame;
use indexmap::IndexMap;
use std::sync::Arc;

/// Wrap frames with the add-time visibility rule: the first frame is always
/// visible, every later frame only when its cached collapsible judgement
/// says it is essential.
fn wrap_frames(
    frames: Vec<Arc<ResolvedFrame>>,
    show_original: bool,
) -> IndexMap<u32, FrameWrapper> {
    frames
        .into_iter()
        .enumerate()
        .map(|(index, frame)| {
            let is_visible = index == 0 || !frame.collapsible;
            (
                index as u32,
                FrameWrapper {
                    id: index as u32,
                    frame,
                    show_original,
                    is_visible,
                },
            )
        })
        .collect()
}

fn count_collapsed(frames: &IndexMap<u32, FrameWrapper>) -> usize {
    frames.values().filter(|w| !w.is_visible).count()
}

/// Append a new error. The first-added error becomes the focus when none is.
pub fn add_error(
    state: &Arc<OverlayState>,
    name: String,
    message: String,
    kind: ErrorKind,
    frames: Vec<Arc<ResolvedFrame>>,
) -> Arc<OverlayState> {
    let mut next = OverlayState::clone(state);
    let error_id = next.next_error_id;
    next.next_error_id += 1;

    let frames = wrap_frames(frames, next.show_original);
    let collapsed_frames_count = count_collapsed(&frames);
    next.errors.insert(
        error_id,
        ErrorRecord {
            id: error_id,
            name,
            message,
            kind,
            frames,
            collapsed_frames_count,
        },
    );
    if next.current_error_id.is_none() {
        next.current_error_id = Some(error_id);
    }
    Arc::new(next)
}

/// Switch between original and compiled view.
///
/// With a `(error_id, frame_id)` target, only that frame changes and the
/// global default stays put; the result is always a fresh state. Without a
/// target, a request matching the current default is a no-op that returns
/// the input `Arc` unchanged, otherwise the default flips and every frame of
/// every error is rewritten to match.
pub fn set_view_mode(
    state: &Arc<OverlayState>,
    show_original: bool,
    target: Option<(u32, u32)>,
) -> Arc<OverlayState> {
    match target {
        Some((error_id, frame_id)) => {
            let mut next = OverlayState::clone(state);
            if let Some(error) = next.errors.get_mut(&error_id) {
                if let Some(wrapper) = error.frames.get_mut(&frame_id) {
                    wrapper.show_original = show_original;
                }
            }
            Arc::new(next)
        }
        None => {
            if state.show_original == show_original {
                return Arc::clone(state);
            }
            let mut next = OverlayState::clone(state);
            next.show_original = show_original;
            for error in next.errors.values_mut() {
                for wrapper in error.frames.values_mut() {
                    wrapper.show_original = show_original;
                }
            }
            Arc::new(next)
        }
    }
}

/// Expand every frame of an error.
pub fn show_frames(state: &Arc<OverlayState>, error_id: u32) -> Arc<OverlayState> {
    let mut next = OverlayState::clone(state);
    if let Some(error) = next.errors.get_mut(&error_id) {
        for wrapper in error.frames.values_mut() {
            wrapper.is_visible = true;
        }
        error.collapsed_frames_count = 0;
    }
    Arc::new(next)
}

/// Re-apply the add-time visibility rule to an error.
pub fn collapse_frames(state: &Arc<OverlayState>, error_id: u32) -> Arc<OverlayState> {
    let mut next = OverlayState::clone(state);
    if let Some(error) = next.errors.get_mut(&error_id) {
        for (index, wrapper) in error.frames.values_mut().enumerate() {
            wrapper.is_visible = index == 0 || !wrapper.frame.collapsible;
        }
        error.collapsed_frames_count = count_collapsed(&error.frames);
    }
    Arc::new(next)
}

/// Remove every error of the given kind. Refocuses on the first remaining
/// error when the focused one was removed.
pub fn clear(state: &Arc<OverlayState>, kind: ErrorKind) -> Arc<OverlayState> {
    let mut next = OverlayState::clone(state);
    next.errors.retain(|_, error| error.kind != kind);
    let focus_still_present = next
        .current_error_id
        .map_or(false, |id| next.errors.contains_key(&id));
    if !focus_still_present {
        next.current_error_id = next.errors.keys().next().copied();
    }
    Arc::new(next)
}

/// Owns the current overlay state and applies the pure transitions.
///
/// The on-empty callback fires after every `clear` that leaves zero errors
/// of the cleared kind (vacuously included), so the host can decide whether
/// the overlay may be dismissed.
pub struct ErrorAggregator {
    state: Arc<OverlayState>,
    on_empty: Option<Box<dyn Fn() + Send + Sync>>,
}

impl ErrorAggregator {
    pub fn new() -> Self {
        Self {
            state: Arc::new(OverlayState::new()),
            on_empty: None,
        }
    }

    pub fn with_on_empty(callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            state: Arc::new(OverlayState::new()),
            on_empty: Some(Box::new(callback)),
        }
    }

    pub fn state(&self) -> &Arc<OverlayState> {
        &self.state
    }

    pub fn add_error(
        &mut self,
        name: String,
        message: String,
        kind: ErrorKind,
        frames: Vec<Arc<ResolvedFrame>>,
    ) {
        self.state = add_error(&self.state, name, message, kind, frames);
    }

    pub fn view_original(&mut self, target: Option<(u32, u32)>) {
        self.state = set_view_mode(&self.state, true, target);
    }

    pub fn view_compiled(&mut self, target: Option<(u32, u32)>) {
        self.state = set_view_mode(&self.state, false, target);
    }

    pub fn show_frames(&mut self, error_id: u32) {
        self.state = show_frames(&self.state, error_id);
    }

    pub fn collapse_frames(&mut self, error_id: u32) {
        self.state = collapse_frames(&self.state, error_id);
    }

    pub fn clear(&mut self, kind: ErrorKind) {
        self.state = clear(&self.state, kind);
        // zero errors of the cleared kind remain, vacuously or not
        let none_of_kind = self.state.errors.values().all(|e| e.kind != kind);
        if none_of_kind {
            if let Some(callback) = &self.on_empty {
                callback();
            }
        }
    }
}

impl Default for ErrorAggregator {
    fn default() -> Self {
        Self::new()
    }
}
