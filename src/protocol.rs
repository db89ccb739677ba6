use crate::overlay::state::ErrorKind;
use crate::stack::resolver::ResolvedFrame;
use serde::{Deserialize, Serialize};

/// Structured events carried host -> overlay surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OverlayEvent {
    /// The current set of compile errors, replacing any previous set
    CompileErrors { errors: Vec<ErrorPayload> },

    /// A single runtime error to append
    RuntimeError { error: ErrorPayload },

    /// Drop every compile-type error
    ClearCompileErrors,

    /// Drop every runtime-type error
    ClearRuntimeErrors,
}

/// Control signals carried overlay surface -> host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SurfaceSignal {
    /// The surface is mounted and accepts events
    Ready,

    /// The surface was dismissed
    Close,
}

/// A displayable error with its resolved frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub name: String,
    pub message: String,
    pub kind: ErrorKind,
    pub frames: Vec<ResolvedFrame>,
}
