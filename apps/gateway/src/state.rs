//! Shared application state for the gateway server.

use ccore::ModelFactory;
use runtime::Runtime;
use std::sync::Arc;

/// Shared state available to all request handlers.
pub struct AppState<F: ModelFactory> {
    /// The scout runtime (immutable after init).
    pub runtime: Arc<Runtime<F>>,
    /// Base system prompt.
    pub prompt: Arc<str>,
}

impl<F: ModelFactory> AppState<F> {
    /// Create the state from a runtime and the base system prompt.
    pub fn new(runtime: Runtime<F>, prompt: impl Into<Arc<str>>) -> Self {
        Self {
            runtime: Arc::new(runtime),
            prompt: prompt.into(),
        }
    }
}

impl<F: ModelFactory> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
            prompt: Arc::clone(&self.prompt),
        }
    }
}
