use std::sync::Arc;

use crate::config::Config;
use crate::ranking::scoring::ResumeScorer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable resume scorer. Default: LlmResumeScorer over the Azure OpenAI deployment.
    pub scorer: Arc<dyn ResumeScorer>,
}
