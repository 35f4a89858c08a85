use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            HeadingLevel::H1 => "H1",
            HeadingLevel::H2 => "H2",
            HeadingLevel::H3 => "H3",
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outline entry. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: HeadingLevel,
    pub text: String,
    pub page: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutline {
    pub title: String,
    pub outline: Vec<Heading>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSection {
    pub document: String,
    pub page_number: usize,
    pub section_title: String,
    pub importance_rank: f64,
    pub level: HeadingLevel,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubSectionFragment {
    pub document: String,
    pub page_number: usize,
    pub refined_text: String,
    pub importance_rank: f64,
    pub parent_section: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDocument {
    pub document: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub input_documents: Vec<String>,
    pub persona: String,
    pub job_to_be_done: String,
    pub processing_timestamp: String,
    pub total_documents_processed: usize,
    pub total_sections_found: usize,
    pub total_sub_sections_analyzed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_documents: Vec<SkippedDocument>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub metadata: RunMetadata,
    pub extracted_sections: Vec<RankedSection>,
    pub sub_section_analysis: Vec<SubSectionFragment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub file_name: String,
    pub format: String,
    pub sha256: String,
    pub page_count: Option<usize>,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub document_count: usize,
    pub documents: Vec<DocumentEntry>,
}
