//! Skill Matcher: the language-model oracle that supplies matched/missing
//! skills and qualitative feedback for the rescorer.
//!
//! `AppState` holds an `Arc<dyn SkillMatcher>`; the default backend is
//! `LlmSkillMatcher`. The matcher never fails: any model, transport or parse
//! problem degrades to an empty `SkillMatchResult`, which the rescorer scores
//! like any other input.

pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::llm_client::LlmClient;
use crate::matcher::prompts::{render_skill_match_prompt, SKILL_MATCH_SYSTEM};

/// Oracle output. Missing or `null` keys deserialize as empty lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillMatchResult {
    #[serde(deserialize_with = "null_as_empty")]
    pub matched_skills: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub missing_skills: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub strengths: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub weaknesses: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub suggestions: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[async_trait]
pub trait SkillMatcher: Send + Sync {
    async fn match_skills(&self, resume: &str, job_description: &str) -> SkillMatchResult;
}

/// Skill matcher backed by the shared `LlmClient`.
pub struct LlmSkillMatcher(pub LlmClient);

#[async_trait]
impl SkillMatcher for LlmSkillMatcher {
    async fn match_skills(&self, resume: &str, job_description: &str) -> SkillMatchResult {
        let prompt = render_skill_match_prompt(resume, job_description);

        match self
            .0
            .call_json::<SkillMatchResult>(&prompt, SKILL_MATCH_SYSTEM)
            .await
        {
            Ok(result) => {
                info!(
                    matched = result.matched_skills.len(),
                    missing = result.missing_skills.len(),
                    "Skill match received"
                );
                result
            }
            Err(e) => {
                warn!("Skill matcher degraded to empty result: {e}");
                SkillMatchResult::default()
            }
        }
    }
}
