//! Axum route handler for the scoring API.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::scoring::{rescore, ScoringResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScoreRequest {
    pub resume: Option<String>,
    pub jobdesc: Option<String>,
}

impl ScoreRequest {
    /// Both texts, or a validation error when either is absent or blank.
    fn into_texts(self) -> Result<(String, String), AppError> {
        match (non_blank(self.resume), non_blank(self.jobdesc)) {
            (Some(resume), Some(jobdesc)) => Ok((resume, jobdesc)),
            _ => Err(AppError::Validation("Missing input".to_string())),
        }
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

/// POST /score-resume
///
/// Asks the skill matcher for matched/missing skills, then rescores them
/// deterministically against the resume's sections.
pub async fn handle_score_resume(
    State(state): State<AppState>,
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> Result<Json<ScoringResult>, AppError> {
    let Json(request) = payload?;
    let (resume, jobdesc) = request.into_texts()?;

    let skill_match = state.skill_matcher.match_skills(&resume, &jobdesc).await;
    let result = rescore(&resume, &jobdesc, skill_match);

    info!(
        score = result.score,
        matched = result.matched_skills.len(),
        missing = result.missing_skills.len(),
        section_hits = result.section_hits.total(),
        missing_sections = result.penalties.len(),
        "Resume scored"
    );

    Ok(Json(result))
}
