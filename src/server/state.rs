use super::error::ApiError;
use crate::media::{Extractor, ExtractorState};
use std::sync::Arc;
use tokio::sync::watch;

/// Shared state handed to every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    extractor: watch::Receiver<ExtractorState>,
}

impl AppState {
    pub fn new(extractor: watch::Receiver<ExtractorState>) -> Self {
        Self { extractor }
    }

    /// The extractor, or `NotReady` while it is still being set up (or never came up).
    pub fn extractor(&self) -> Result<Arc<dyn Extractor>, ApiError> {
        self.extractor.borrow().ready().ok_or(ApiError::NotReady)
    }

    pub fn extractor_state(&self) -> ExtractorState {
        self.extractor.borrow().clone()
    }
}
