use std::sync::Arc;

use crate::matcher::SkillMatcher;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable skill matcher. Default: LlmSkillMatcher.
    pub skill_matcher: Arc<dyn SkillMatcher>,
}
