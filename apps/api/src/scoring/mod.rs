// Deterministic rescoring engine.
// Pure functions over request-local data: section detection, hit counting and
// score assembly. No I/O, no shared state; safe to call from any task.

pub mod assembler;
pub mod hits;
pub mod sections;

use crate::matcher::SkillMatchResult;

pub use assembler::{assemble_score, ScoringResult};
pub use hits::count_hits;
pub use sections::detect_sections;

/// Runs the full rule pipeline over a resume, a job description and the
/// skill matcher's output. Degenerate matcher output goes through unchanged.
pub fn rescore(resume: &str, job_description: &str, skill_match: SkillMatchResult) -> ScoringResult {
    let sections = detect_sections(resume);
    let hits = count_hits(&skill_match.matched_skills, &sections);
    assemble_score(resume, job_description, skill_match, &sections, hits)
}
