pub mod bridge;
pub mod sse;

pub use bridge::OverlayBridge;
pub use sse::{ClientEvent, EventClient, SseDecoder};
