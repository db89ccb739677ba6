use crate::logging;
use crate::protocol::{ErrorPayload, OverlayEvent, SurfaceSignal};
use std::collections::VecDeque;
use tokio::sync::mpsc::UnboundedSender;

/// Readiness-gated bridge into the isolated overlay surface.
///
/// Events dispatched before the surface signals readiness are queued and
/// flushed in arrival order (FIFO) once the `Ready` signal arrives. `Close`
/// tears the surface down and resets readiness so a later `init` can start
/// a fresh handshake.
pub struct OverlayBridge {
    surface: Option<UnboundedSender<OverlayEvent>>,
    is_ready: bool,
    pending: VecDeque<OverlayEvent>,
}

impl OverlayBridge {
    pub fn new() -> Self {
        Self {
            surface: None,
            is_ready: false,
            pending: VecDeque::new(),
        }
    }

    /// Mount a surface. Readiness still waits for the surface's own signal.
    pub fn init(&mut self, surface: UnboundedSender<OverlayEvent>) {
        self.surface = Some(surface);
        self.is_ready = false;
    }

    pub fn is_ready(&self) -> bool {
        self.is_ready
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Forward the current compile error set.
    pub fn compile_error(&mut self, errors: Vec<ErrorPayload>) {
        self.dispatch(OverlayEvent::CompileErrors { errors });
    }

    /// Forward a runtime error.
    pub fn runtime_error(&mut self, error: ErrorPayload) {
        self.dispatch(OverlayEvent::RuntimeError { error });
    }

    pub fn clear_compile_errors(&mut self) {
        self.dispatch(OverlayEvent::ClearCompileErrors);
    }

    pub fn clear_runtime_errors(&mut self) {
        self.dispatch(OverlayEvent::ClearRuntimeErrors);
    }

    /// Process a control signal from the surface.
    pub fn handle_signal(&mut self, signal: SurfaceSignal) {
        match signal {
            SurfaceSignal::Ready => {
                self.is_ready = true;
                let count = self.pending.len();
                while let Some(event) = self.pending.pop_front() {
                    self.post(event);
                }
                logging::log_queue_flushed(count);
            }
            SurfaceSignal::Close => {
                self.surface = None;
                self.is_ready = false;
                logging::log_surface_closed();
            }
        }
    }

    fn dispatch(&mut self, event: OverlayEvent) {
        if self.is_ready {
            self.post(event);
        } else {
            logging::log_event_queued(event_kind(&event), self.pending.len() + 1);
            self.pending.push_back(event);
        }
    }

    fn post(&mut self, event: OverlayEvent) {
        if let Some(surface) = &self.surface {
            if surface.send(event).is_err() {
                // receiver went away without a Close signal
                self.surface = None;
                self.is_ready = false;
            }
        }
    }
}

impl Default for OverlayBridge {
    fn default() -> Self {
        Self::new()
    }
}

fn event_kind(event: &OverlayEvent) -> &'static str {
    match event {
        OverlayEvent::CompileErrors { .. } => "compile-errors",
        OverlayEvent::RuntimeError { .. } => "runtime-error",
        OverlayEvent::ClearCompileErrors => "clear-compile-errors",
        OverlayEvent::ClearRuntimeErrors => "clear-runtime-errors",
    }
}
