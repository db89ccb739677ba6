use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// An error that occurred during server-side rendering, injected by the
/// server renderer for the overlay to pick up on start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsrError {
    pub name: String,
    pub message: String,
    pub stack: String,
}

/// One-shot holder for the SSR-injected error.
///
/// `take` yields the error at most once per overlay session; later calls
/// return `None`.
#[derive(Debug, Default)]
pub struct SsrErrorSlot {
    error: Mutex<Option<SsrError>>,
}

impl SsrErrorSlot {
    pub fn new(error: Option<SsrError>) -> Self {
        Self {
            error: Mutex::new(error),
        }
    }

    pub fn take(&self) -> Option<SsrError> {
        self.error.lock().expect("ssr slot poisoned").take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_the_error_exactly_once() {
        let slot = SsrErrorSlot::new(Some(SsrError {
            name: "ReferenceError".to_string(),
            message: "window is not defined".to_string(),
            stack: String::new(),
        }));
        assert!(slot.take().is_some());
        assert!(slot.take().is_none());
    }

    #[test]
    fn empty_slot_is_harmless() {
        assert!(SsrErrorSlot::new(None).take().is_none());
    }
}
