use std::sync::Arc;

use crate::pipeline::Pipeline;
use crate::signature::SignatureVerifier;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// `None` accepts unsigned notifications.
    pub signature: Option<Arc<SignatureVerifier>>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            signature: None,
        }
    }

    pub fn with_signature(mut self, verifier: SignatureVerifier) -> Self {
        self.signature = Some(Arc::new(verifier));
        self
    }
}
