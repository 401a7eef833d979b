//! Section Detector: finds the four resume sections by heading and captures
//! the bounded text window each one contributes to skill matching.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The four sections the rescorer knows about.
///
/// Declaration order is significant: it is the attribution order used by the
/// hit counter and the key order of every per-section map in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Skills,
    Experience,
    Summary,
    Education,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Skills,
        Section::Experience,
        Section::Summary,
        Section::Education,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// How a section is recognised: heading aliases plus the number of characters
/// after the heading that belong to its window.
#[derive(Debug)]
pub struct SectionRule {
    pub section: Section,
    pub aliases: &'static [&'static str],
    pub window_chars: usize,
}

pub const SECTION_RULES: [SectionRule; 4] = [
    SectionRule {
        section: Section::Skills,
        aliases: &["skills", "technical skills"],
        window_chars: 600,
    },
    SectionRule {
        section: Section::Experience,
        aliases: &["experience", "professional experience"],
        window_chars: 1000,
    },
    SectionRule {
        section: Section::Summary,
        aliases: &["summary", "professional summary"],
        window_chars: 400,
    },
    SectionRule {
        section: Section::Education,
        aliases: &["education"],
        window_chars: 400,
    },
];

/// One case-insensitive alternation per rule, same order as `SECTION_RULES`.
static HEADING_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    SECTION_RULES
        .iter()
        .map(|rule| {
            let alternation = rule
                .aliases
                .iter()
                .map(|alias| regex::escape(alias))
                .collect::<Vec<_>>()
                .join("|");
            Regex::new(&format!("(?i)(?:{alternation})"))
                .expect("section heading pattern is a valid regex")
        })
        .collect()
});

/// A detected section: the heading and the trailing text scoped to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMatch<'a> {
    pub section: Section,
    /// Heading text followed by at most `window_chars` characters.
    pub window: &'a str,
}

/// Detection outcome for all four sections of a single resume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMatches<'a> {
    slots: [Option<SectionMatch<'a>>; 4],
}

impl<'a> SectionMatches<'a> {
    pub fn get(&self, section: Section) -> Option<&SectionMatch<'a>> {
        self.slots[section.index()].as_ref()
    }

    pub fn is_present(&self, section: Section) -> bool {
        self.get(section).is_some()
    }

    /// Sections with no heading in the resume, in canonical order.
    pub fn missing(&self) -> Vec<Section> {
        Section::ALL
            .into_iter()
            .filter(|s| !self.is_present(*s))
            .collect()
    }
}

/// Searches the resume for each section heading and captures its window.
///
/// Only the first (leftmost) heading of each section is used; later
/// duplicates are ignored.
pub fn detect_sections(resume: &str) -> SectionMatches<'_> {
    let mut matches = SectionMatches::default();

    for (rule, pattern) in SECTION_RULES.iter().zip(HEADING_PATTERNS.iter()) {
        if let Some(heading) = pattern.find(resume) {
            let window = take_window(resume, heading.start(), heading.end(), rule.window_chars);
            matches.slots[rule.section.index()] = Some(SectionMatch {
                section: rule.section,
                window,
            });
        }
    }

    matches
}

/// Slices `start..heading_end` plus up to `max_chars` characters after it.
fn take_window(text: &str, start: usize, heading_end: usize, max_chars: usize) -> &str {
    let end = text[heading_end..]
        .char_indices()
        .nth(max_chars)
        .map(|(offset, _)| heading_end + offset)
        .unwrap_or(text.len());
    &text[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_all_four_sections() {
        let resume = "Summary\nAnalyst\nSkills: SQL\nExperience\n- dashboards\nEducation\nBSc";
        let sections = detect_sections(resume);
        for section in Section::ALL {
            assert!(sections.is_present(section), "{section:?} not detected");
        }
        assert!(sections.missing().is_empty());
    }

    #[test]
    fn test_heading_search_is_case_insensitive() {
        let sections = detect_sections("TECHNICAL SKILLS\nRust, Go");
        let skills = sections.get(Section::Skills).unwrap();
        assert!(skills.window.starts_with("TECHNICAL SKILLS"));
    }

    #[test]
    fn test_no_headings_marks_every_section_missing() {
        let sections = detect_sections("Jane Doe\njane@example.com\nI like building things.");
        assert_eq!(sections.missing(), Section::ALL.to_vec());
    }

    #[test]
    fn test_first_heading_wins() {
        let resume = "Skills: Python\nOther stuff\nSkills: Java";
        let skills = detect_sections(resume).get(Section::Skills).cloned().unwrap();
        assert!(skills.window.starts_with("Skills: Python"));
    }

    #[test]
    fn test_window_is_bounded_by_character_count() {
        let resume = format!("Education{}", "x".repeat(1000));
        let education = detect_sections(&resume).get(Section::Education).cloned().unwrap();
        assert_eq!(education.window.chars().count(), "Education".len() + 400);
    }

    #[test]
    fn test_window_respects_multibyte_characters() {
        let resume = format!("Summary{}", "é".repeat(500));
        let summary = detect_sections(&resume).get(Section::Summary).cloned().unwrap();
        assert_eq!(summary.window.chars().count(), "Summary".len() + 400);
    }

    #[test]
    fn test_short_resume_window_runs_to_end() {
        let resume = "Experience\n- shipped it";
        let experience = detect_sections(resume).get(Section::Experience).cloned().unwrap();
        assert_eq!(experience.window, resume);
    }

    #[test]
    fn test_window_starts_at_heading_not_document_start() {
        let resume = "Jane Doe\nProfessional Summary\nData person";
        let summary = detect_sections(resume).get(Section::Summary).cloned().unwrap();
        assert!(summary.window.starts_with("Professional Summary"));
        assert!(!summary.window.contains("Jane"));
    }

    #[test]
    fn test_section_serializes_lowercase() {
        let json = serde_json::to_string(&Section::ALL).unwrap();
        assert_eq!(json, r#"["skills","experience","summary","education"]"#);
    }
}
