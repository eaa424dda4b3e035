use std::sync::Arc;

use crate::services::RecommendationEngine;

const DEFAULT_LIMIT: i64 = 5;

/// Shared application state
///
/// Handlers get the engine through this context rather than a global; the
/// engine itself swaps its model snapshot on retrain.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    /// Recommendation count used when a request has no `limit`
    pub default_limit: i64,
}

impl AppState {
    pub fn new(engine: Arc<RecommendationEngine>) -> Self {
        Self {
            engine,
            default_limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_default_limit(mut self, default_limit: i64) -> Self {
        self.default_limit = default_limit;
        self
    }
}
