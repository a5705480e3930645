//! Shared state handed to request handlers.

use crate::engine::WhisperEngine;
use std::sync::Arc;

/// Shared state for API handlers.
///
/// The engine is loaded once at startup and never mutated afterwards; every
/// handler clone shares the same instance.
#[derive(Clone)]
pub struct ApiState {
    /// Loaded Whisper engine
    pub engine: Arc<WhisperEngine>,
    /// Model tier name, for the health endpoint
    pub model: String,
}

impl ApiState {
    /// Create new API state.
    pub fn new(engine: Arc<WhisperEngine>, model: String) -> Self {
        Self { engine, model }
    }
}
