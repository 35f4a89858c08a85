use std::collections::BTreeSet;

use serde::Deserialize;

use crate::config::DomainKeywords;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Domain {
    AcademicResearch,
    Business,
    Education,
    #[default]
    General,
}

impl Domain {
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::AcademicResearch => "academic_research",
            Domain::Business => "business",
            Domain::Education => "education",
            Domain::General => "general",
        }
    }

    /// Unknown values resolve to `General` rather than failing the run.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "academic_research" | "academic" | "research" => Domain::AcademicResearch,
            "business" => Domain::Business,
            "education" => Domain::Education,
            _ => Domain::General,
        }
    }
}

impl From<String> for Domain {
    fn from(value: String) -> Self {
        Domain::parse_lenient(&value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ExpertiseLevel {
    Beginner,
    #[default]
    Intermediate,
    Expert,
}

impl ExpertiseLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ExpertiseLevel::Beginner => "beginner",
            ExpertiseLevel::Intermediate => "intermediate",
            ExpertiseLevel::Expert => "expert",
        }
    }
}

impl From<String> for ExpertiseLevel {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "beginner" | "novice" => ExpertiseLevel::Beginner,
            "expert" | "advanced" => ExpertiseLevel::Expert,
            _ => ExpertiseLevel::Intermediate,
        }
    }
}

/// Reader persona and task for one run. Fields missing from a persona file
/// take their own empty or neutral defaults; `PersonaSpec::default()` is the
/// built-in persona used only when there is no file at all.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonaSpec {
    #[serde(default)]
    pub persona: String,
    #[serde(default)]
    pub job_to_be_done: String,
    #[serde(default)]
    pub focus_areas: Vec<String>,
    #[serde(default)]
    pub expertise_level: ExpertiseLevel,
    #[serde(default)]
    pub domain: Domain,
}

impl Default for PersonaSpec {
    fn default() -> Self {
        Self {
            persona: "PhD Researcher in Computational Biology".to_string(),
            job_to_be_done: "Prepare a comprehensive literature review focusing on methodologies, datasets, and performance benchmarks".to_string(),
            focus_areas: vec![
                "research".to_string(),
                "methodology".to_string(),
                "data".to_string(),
                "analysis".to_string(),
            ],
            expertise_level: ExpertiseLevel::Expert,
            domain: Domain::AcademicResearch,
        }
    }
}

impl PersonaSpec {
    pub fn keyword_set(&self, domain_keywords: &DomainKeywords) -> KeywordSet {
        let mut keywords = BTreeSet::new();

        for area in &self.focus_areas {
            let normalized = area.trim().to_lowercase();
            if !normalized.is_empty() {
                keywords.insert(normalized);
            }
        }

        for text in [&self.persona, &self.job_to_be_done] {
            for word in long_words(text) {
                keywords.insert(word);
            }
        }

        for keyword in domain_keywords.for_domain(self.domain) {
            let normalized = keyword.trim().to_lowercase();
            if !normalized.is_empty() {
                keywords.insert(normalized);
            }
        }

        KeywordSet { keywords }
    }
}

/// Lowercase words of at least four characters.
fn long_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|character: char| !(character.is_alphanumeric() || character == '_'))
        .filter(|word| word.chars().count() > 3)
        .map(str::to_lowercase)
}

/// Deduplicated lowercase terms matched against section text. Iteration
/// order is sorted so scores never depend on hash order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: BTreeSet<String>,
}

impl KeywordSet {
    #[cfg(test)]
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: terms
                .into_iter()
                .map(|term| term.as_ref().trim().to_lowercase())
                .filter(|term| !term.is_empty())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }

    /// Distinct keywords present in already-lowercased text.
    pub fn count_present(&self, lowered: &str) -> usize {
        self.iter()
            .filter(|keyword| lowered.contains(*keyword))
            .count()
    }
}
