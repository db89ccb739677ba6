pub mod aggregator;
pub mod ssr;
pub mod state;

pub use aggregator::ErrorAggregator;
pub use ssr::{SsrError, SsrErrorSlot};
pub use state::{ErrorKind, ErrorRecord, FrameWrapper, OverlayState};
