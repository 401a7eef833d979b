// Skill matcher prompt templates.

pub const SKILL_MATCH_SYSTEM: &str = "\
You are an ATS resume scoring engine that simulates how applicant tracking systems \
compare a resume with a job posting. \
You MUST respond with a single JSON object only. No markdown fences. No explanations.";

pub const SKILL_MATCH_INSTRUCTIONS: &str = r#"Score the resume against the job description using:
- 40% Hard Skills Match
- 30% Experience Relevance
- 20% Summary Alignment
- 10% Education Fit

Return output in exactly this format:
{
  "matchedSkills": ["string"],
  "missingSkills": ["string"],
  "strengths": ["string"],
  "weaknesses": ["string"],
  "suggestions": ["string"]
}

RULES:
1. matchedSkills: skills and keywords from the job description that the resume demonstrates
2. missingSkills: skills and keywords from the job description absent from the resume
3. Use the wording of the job description for skill names
4. Return ONLY the JSON object"#;

/// Fills the fixed instructions with the two request texts.
pub fn render_skill_match_prompt(resume: &str, job_description: &str) -> String {
    format!(
        "{SKILL_MATCH_INSTRUCTIONS}\n\nResume:\n{resume}\n\nJob Description:\n{job_description}\n"
    )
}
