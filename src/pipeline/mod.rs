//! Outline classification, section assembly, persona relevance scoring and
//! cross-document aggregation. Everything here is pure per call except
//! `run_corpus`, which owns the merge.

use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use regex::Regex;
use tracing::{info, trace, warn};

use crate::config::{AssemblyConfig, ClassifierConfig, PipelineConfig, RankingConfig};
use crate::model::{
    Heading, HeadingLevel, RankedSection, RunMetadata, RunOutput, SkippedDocument,
    SubSectionFragment,
};
use crate::persona::{KeywordSet, PersonaSpec};
use crate::source::{DocumentRef, SourceDocument};

mod aggregate;
mod assemble;
mod classify;
mod relevance;
#[cfg(test)]
mod tests;
mod text;

pub(crate) use aggregate::run_corpus;
pub(crate) use classify::HeadingClassifier;

use aggregate::*;
use assemble::*;
#[cfg(test)]
use classify::*;
use relevance::*;
use text::*;

/// Classifier, assembly gate and scorer built once per run.
#[derive(Debug)]
pub(crate) struct Pipeline {
    classifier: HeadingClassifier,
    scorer: RelevanceScorer,
    assembly: AssemblyConfig,
    ranking: RankingConfig,
}

impl Pipeline {
    pub(crate) fn new(config: &PipelineConfig, persona: &PersonaSpec) -> Result<Self> {
        let keywords = persona.keyword_set(&config.domain_keywords);
        if keywords.is_empty() {
            warn!("persona produced no keywords; every section will score on text quality only");
        }

        Ok(Self {
            classifier: HeadingClassifier::new(&config.classifier)?,
            scorer: RelevanceScorer::new(keywords, config.ranking.clone()),
            assembly: config.assembly.clone(),
            ranking: config.ranking.clone(),
        })
    }

    fn ranking(&self) -> &RankingConfig {
        &self.ranking
    }

    pub(crate) fn keyword_count(&self) -> usize {
        self.scorer.keywords().len()
    }

    fn analyze_document(&self, document: &SourceDocument) -> Result<DocumentAnalysis> {
        if document.pages.is_empty() {
            bail!("document {} has no pages", document.id);
        }

        let headings = self.classifier.outline_for(document);
        let assembly = assemble_sections(&document.pages, &headings, &self.assembly);
        for heading in &assembly.out_of_range {
            warn!(
                document = %document.id,
                page = heading.page,
                page_count = document.pages.len(),
                heading = %heading.text,
                "heading references a page outside the document; dropped"
            );
        }

        let ranked_sections = self.scorer.rank_sections(&document.id, &assembly.sections);
        let sub_sections = self.scorer.analyze_sub_sections(&ranked_sections);

        info!(
            document = %document.id,
            headings = headings.len(),
            sections = assembly.sections.len(),
            rejected_sections = assembly.rejected,
            ranked = ranked_sections.len(),
            sub_sections = sub_sections.len(),
            "analyzed document"
        );

        Ok(DocumentAnalysis {
            ranked_sections,
            sub_sections,
        })
    }
}
