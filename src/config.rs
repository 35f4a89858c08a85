use std::path::Path;

use anyhow::Result;
use serde::Deserialize;
use tracing::info;

use crate::persona::Domain;
use crate::util::read_json;

/// Tables and thresholds for the whole pipeline. Loaded once per process and
/// passed by reference into the classifier, assembler and scorer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub classifier: ClassifierConfig,
    pub domain_keywords: DomainKeywords,
    pub assembly: AssemblyConfig,
    pub ranking: RankingConfig,
    pub language_hints: LanguageHints,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Matched exactly, case-insensitive.
    pub publisher_names: Vec<String>,
    /// Matched as substrings in either direction, case-insensitive.
    pub author_names: Vec<String>,
    pub landmark_headings: Vec<String>,
    pub min_heading_chars: usize,
    pub max_heading_chars: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            publisher_names: strings(&[
                "wiley",
                "elsevier",
                "springer",
                "taylor",
                "francis",
                "sage",
                "emerald",
                "blackwell",
                "oxford",
                "cambridge",
                "mit",
                "ieee",
                "acm",
                "ssrn",
                "arxiv",
                "biorxiv",
                "medrxiv",
                "chemrxiv",
                "authorea",
                "research square",
                "sciety",
                "prereview",
                "review commons",
                "asapbio",
                "elife",
            ]),
            author_names: Vec::new(),
            landmark_headings: strings(&[
                "Revision History",
                "Table of Contents",
                "Acknowledgements",
                "References",
            ]),
            min_heading_chars: 4,
            max_heading_chars: 150,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DomainKeywords {
    pub academic_research: Vec<String>,
    pub business: Vec<String>,
    pub education: Vec<String>,
    pub general: Vec<String>,
}

impl DomainKeywords {
    pub fn for_domain(&self, domain: Domain) -> &[String] {
        match domain {
            Domain::AcademicResearch => &self.academic_research,
            Domain::Business => &self.business,
            Domain::Education => &self.education,
            Domain::General => &self.general,
        }
    }
}

impl Default for DomainKeywords {
    fn default() -> Self {
        Self {
            academic_research: strings(&[
                "research",
                "study",
                "analysis",
                "methodology",
                "results",
                "conclusion",
                "data",
                "dataset",
                "benchmark",
                "performance",
                "evaluation",
                "experiment",
                "method",
                "approach",
                "technique",
                "algorithm",
                "model",
                "framework",
                "literature",
                "review",
                "survey",
                "comparison",
                "assessment",
                "validation",
            ]),
            business: strings(&[
                "business",
                "market",
                "strategy",
                "financial",
                "revenue",
                "investment",
                "analysis",
                "report",
                "performance",
                "growth",
                "trend",
                "forecast",
            ]),
            education: strings(&[
                "learning",
                "education",
                "study",
                "concept",
                "theory",
                "practice",
                "curriculum",
                "teaching",
                "pedagogy",
                "assessment",
                "evaluation",
            ]),
            general: strings(&["analysis", "study", "research", "method", "approach"]),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    pub min_chars: usize,
    pub min_words: usize,
    pub min_sentences: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            min_chars: 100,
            min_words: 20,
            min_sentences: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub min_section_chars: usize,
    pub min_score: f64,
    pub subsection_max_chars: usize,
    pub min_paragraph_chars: usize,
    pub min_fragment_chars: usize,
    pub preview_chars: usize,
    pub sections_for_subsections: usize,
    pub subsections_per_document: usize,
    pub max_sections: usize,
    pub max_subsections: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            min_section_chars: 50,
            min_score: 0.01,
            subsection_max_chars: 300,
            min_paragraph_chars: 20,
            min_fragment_chars: 50,
            preview_chars: 200,
            sections_for_subsections: 15,
            subsections_per_document: 25,
            max_sections: 50,
            max_subsections: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanguageHint {
    pub code: String,
    #[serde(default)]
    pub filename_markers: Vec<String>,
    #[serde(default)]
    pub content_markers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LanguageHints {
    pub default_language: String,
    /// Assigned when the first page contains CJK unified ideographs.
    pub cjk_language: String,
    pub hints: Vec<LanguageHint>,
}

impl Default for LanguageHints {
    fn default() -> Self {
        Self {
            default_language: "eng".to_string(),
            cjk_language: "chi_sim".to_string(),
            hints: vec![
                LanguageHint {
                    code: "eng".to_string(),
                    filename_markers: strings(&["english", ".en.", ".eng."]),
                    content_markers: Vec::new(),
                },
                LanguageHint {
                    code: "chi_sim".to_string(),
                    filename_markers: strings(&["chinese", "科技", "期刊", "研究"]),
                    content_markers: Vec::new(),
                },
                LanguageHint {
                    code: "ita".to_string(),
                    filename_markers: strings(&["italian", ".ita.", "introduzione"]),
                    content_markers: strings(&[
                        "introduzione",
                        "contesto",
                        "storico",
                        "indice",
                        "capitolo",
                    ]),
                },
                LanguageHint {
                    code: "deu".to_string(),
                    filename_markers: strings(&["german", ".de.", "einleitung", "handbuch"]),
                    content_markers: strings(&[
                        "inhalt",
                        "einleitung",
                        "vorwort",
                        "forschung",
                        "handbuch",
                    ]),
                },
            ],
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };

    let config: PipelineConfig = read_json(path)?;
    info!(path = %path.display(), "loaded pipeline config");
    Ok(config)
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let raw = r#"{ "classifier": { "author_names": ["ada lovelace"] }, "ranking": { "max_sections": 5 } }"#;
        let config: PipelineConfig = serde_json::from_str(raw).expect("partial config parses");

        assert_eq!(config.classifier.author_names, vec!["ada lovelace"]);
        assert!(
            config
                .classifier
                .publisher_names
                .iter()
                .any(|name| name == "wiley")
        );
        assert_eq!(config.classifier.max_heading_chars, 150);
        assert_eq!(config.ranking.max_sections, 5);
        assert_eq!(config.ranking.max_subsections, 30);
        assert_eq!(config.assembly.min_chars, 100);
    }

    #[test]
    fn domain_keywords_resolve_per_domain() {
        let keywords = DomainKeywords::default();
        assert!(
            keywords
                .for_domain(Domain::AcademicResearch)
                .iter()
                .any(|keyword| keyword == "methodology")
        );
        assert_eq!(keywords.for_domain(Domain::General).len(), 5);
    }
}
