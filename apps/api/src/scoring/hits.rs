use serde::{Deserialize, Serialize};

use crate::scoring::sections::{Section, SectionMatches};

/// Matched-skill occurrences attributed to each section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionHits {
    pub skills: u32,
    pub experience: u32,
    pub summary: u32,
    pub education: u32,
}

impl SectionHits {
    pub fn get(&self, section: Section) -> u32 {
        match section {
            Section::Skills => self.skills,
            Section::Experience => self.experience,
            Section::Summary => self.summary,
            Section::Education => self.education,
        }
    }

    fn increment(&mut self, section: Section) {
        match section {
            Section::Skills => self.skills += 1,
            Section::Experience => self.experience += 1,
            Section::Summary => self.summary += 1,
            Section::Education => self.education += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.skills + self.experience + self.summary + self.education
    }
}

/// Attributes every matched skill to the first section window containing it.
///
/// Matching is a case-insensitive substring test, so "java" also hits a window
/// that only mentions "javascript". Duplicated skills are counted once per
/// occurrence; skills found in no window are dropped.
pub fn count_hits(matched_skills: &[String], sections: &SectionMatches<'_>) -> SectionHits {
    let windows: Vec<(Section, String)> = Section::ALL
        .into_iter()
        .filter_map(|s| sections.get(s))
        .map(|m| (m.section, m.window.to_lowercase()))
        .collect();

    let mut hits = SectionHits::default();
    for skill in matched_skills {
        let needle = skill.to_lowercase();
        if let Some((section, _)) = windows.iter().find(|(_, w)| w.contains(&needle)) {
            hits.increment(*section);
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::sections::detect_sections;

    fn skills(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_skill_in_skills_and_experience_counts_for_skills_only() {
        let resume = "Skills: Python\nExperience\n- Python pipelines";
        let hits = count_hits(&skills(&["python"]), &detect_sections(resume));
        assert_eq!(hits.skills, 1);
        assert_eq!(hits.experience, 0);
    }

    #[test]
    fn test_falls_through_to_later_section() {
        let resume = "Education\nBSc Statistics\nSkills: Python";
        let hits = count_hits(&skills(&["Statistics"]), &detect_sections(resume));
        assert_eq!(hits.education, 1);
        assert_eq!(hits.skills, 0);
    }

    #[test]
    fn test_substring_collision_is_a_hit() {
        let resume = "Skills: JavaScript, TypeScript";
        let hits = count_hits(&skills(&["Java"]), &detect_sections(resume));
        assert_eq!(hits.skills, 1);
    }

    #[test]
    fn test_unfound_skills_are_dropped() {
        let resume = "Skills: Python";
        let hits = count_hits(&skills(&["Kubernetes", "Terraform"]), &detect_sections(resume));
        assert_eq!(hits, SectionHits::default());
    }

    #[test]
    fn test_duplicates_count_per_occurrence() {
        let resume = "Skills: SQL";
        let hits = count_hits(&skills(&["SQL", "sql"]), &detect_sections(resume));
        assert_eq!(hits.skills, 2);
    }

    #[test]
    fn test_absent_sections_never_match() {
        let hits = count_hits(&skills(&["python"]), &detect_sections("python everywhere"));
        assert_eq!(hits.total(), 0);
    }

    #[test]
    fn test_skill_outside_window_is_not_counted() {
        let resume = format!("Summary {}\nTableau", "x".repeat(450));
        let hits = count_hits(&skills(&["Tableau"]), &detect_sections(&resume));
        assert_eq!(hits.summary, 0);
    }
}
