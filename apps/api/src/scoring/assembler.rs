//! Score Assembler: turns section hits into the weighted 0–100 score, applies
//! the fixed penalty/bonus rules and builds the response payload.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::matcher::SkillMatchResult;
use crate::scoring::hits::SectionHits;
use crate::scoring::sections::{Section, SectionMatches};

const MISSING_SKILLS_SECTION_PENALTY: f64 = 25.0;
const LONG_RESUME_PENALTY: f64 = 10.0;
const UNBULLETED_EXPERIENCE_PENALTY: f64 = 5.0;
const MAX_RESUME_LINES: usize = 100;

const ROLE_MATCH_BONUS: f64 = 5.0;
const LOCATION_BONUS: f64 = 3.0;
const LOCATION_TERMS: [&str; 4] = ["south jordan", "utah", "remote", "hybrid"];

const BULLET_GLYPHS: [char; 3] = ['-', '*', '\u{2022}'];

/// "... as a <role>." in the job description.
static JD_ROLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)as a (.+?)\b[.,]").expect("role pattern is a valid regex")
});

/// Share of the 100 points each section can earn.
pub fn section_weight(section: Section) -> f64 {
    match section {
        Section::Skills => 40.0,
        Section::Experience => 30.0,
        Section::Summary => 20.0,
        Section::Education => 10.0,
    }
}

/// Weighted contribution of each section, before penalties and bonuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skills: f64,
    pub experience: f64,
    pub summary: f64,
    pub education: f64,
}

/// Final rescoring output, serialized as a flat camelCase object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringResult {
    pub score: u32, // 0 – 100
    /// Sections with no heading in the resume.
    pub penalties: Vec<Section>,
    pub section_hits: SectionHits,
    pub section_score_breakdown: ScoreBreakdown,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Builds the `ScoringResult` for one resume.
///
/// Algorithm:
/// 1. total = |matched| + |missing| (1 when both are empty)
/// 2. score = Σ hits(section) / total × weight(section)
/// 3. −25 no skills heading, −10 more than 100 lines, −5 experience without bullets
/// 4. +5 job-description role found in resume, +3 location/work-mode keyword
/// 5. clamp to [0, 100], round half to even
///
/// The breakdown only reflects step 2.
pub fn assemble_score(
    resume: &str,
    job_description: &str,
    skill_match: SkillMatchResult,
    sections: &SectionMatches<'_>,
    hits: SectionHits,
) -> ScoringResult {
    let total = keyword_total(&skill_match);

    let components = ScoreBreakdown {
        skills: component(&hits, Section::Skills, total),
        experience: component(&hits, Section::Experience, total),
        summary: component(&hits, Section::Summary, total),
        education: component(&hits, Section::Education, total),
    };

    let weighted =
        components.skills + components.experience + components.summary + components.education;
    let raw = weighted - penalty_points(resume, sections) + bonus_points(resume, job_description);

    ScoringResult {
        score: clamp_score(raw),
        penalties: sections.missing(),
        section_hits: hits,
        section_score_breakdown: ScoreBreakdown {
            skills: round2(components.skills),
            experience: round2(components.experience),
            summary: round2(components.summary),
            education: round2(components.education),
        },
        matched_skills: skill_match.matched_skills,
        missing_skills: skill_match.missing_skills,
        strengths: skill_match.strengths,
        weaknesses: skill_match.weaknesses,
        suggestions: skill_match.suggestions,
    }
}

fn keyword_total(skill_match: &SkillMatchResult) -> usize {
    match skill_match.matched_skills.len() + skill_match.missing_skills.len() {
        0 => 1,
        n => n,
    }
}

fn component(hits: &SectionHits, section: Section, total: usize) -> f64 {
    (hits.get(section) as f64 / total as f64) * section_weight(section)
}

fn penalty_points(resume: &str, sections: &SectionMatches<'_>) -> f64 {
    let mut points = 0.0;
    if !sections.is_present(Section::Skills) {
        points += MISSING_SKILLS_SECTION_PENALTY;
    }
    if resume.lines().count() > MAX_RESUME_LINES {
        points += LONG_RESUME_PENALTY;
    }
    if let Some(experience) = sections.get(Section::Experience) {
        if !has_bulleted_line(experience.window) {
            points += UNBULLETED_EXPERIENCE_PENALTY;
        }
    }
    points
}

fn bonus_points(resume: &str, job_description: &str) -> f64 {
    let resume_lower = resume.to_lowercase();
    let mut points = 0.0;
    if mentions_jd_role(&resume_lower, job_description) {
        points += ROLE_MATCH_BONUS;
    }
    if LOCATION_TERMS.iter().any(|term| resume_lower.contains(term)) {
        points += LOCATION_BONUS;
    }
    points
}

/// A line after the heading line whose first non-whitespace char is a bullet.
fn has_bulleted_line(window: &str) -> bool {
    window
        .lines()
        .skip(1)
        .any(|line| line.trim_start().starts_with(BULLET_GLYPHS))
}

fn mentions_jd_role(resume_lower: &str, job_description: &str) -> bool {
    JD_ROLE_PATTERN
        .captures(job_description)
        .and_then(|caps| caps.get(1))
        .map(|role| resume_lower.contains(&role.as_str().to_lowercase()))
        .unwrap_or(false)
}

fn clamp_score(raw: f64) -> u32 {
    raw.clamp(0.0, 100.0).round_ties_even() as u32
}

/// Rounds to 2 decimals by the exact value of `value`, half to even.
///
/// `value * 100.0` alone can land on a false tie (0.025 is stored slightly
/// above 0.025, yet scales to exactly 2.5), so the multiplication error is
/// recovered with a fused multiply-add and decides those cases.
fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    let error = value.mul_add(100.0, -scaled);
    let floor = scaled.floor();
    let past_half = (scaled - floor) - 0.5;
    let round_up = if past_half != 0.0 {
        past_half > 0.0
    } else if error != 0.0 {
        error > 0.0
    } else {
        floor % 2.0 != 0.0
    };
    (if round_up { floor + 1.0 } else { floor }) / 100.0
}
