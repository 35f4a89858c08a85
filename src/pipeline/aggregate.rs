use super::*;

/// Per-document pipeline output before the cross-document merge.
#[derive(Debug, Clone, Default)]
pub(super) struct DocumentAnalysis {
    pub(super) ranked_sections: Vec<RankedSection>,
    pub(super) sub_sections: Vec<SubSectionFragment>,
}

/// Runs every document through the pipeline in parallel, then merges. A
/// failing document is logged and skipped; it never aborts the run.
pub(crate) fn run_corpus<L>(
    pipeline: &Pipeline,
    documents: &[DocumentRef],
    load: L,
    persona: &PersonaSpec,
    processing_timestamp: String,
) -> RunOutput
where
    L: Fn(&DocumentRef) -> Result<SourceDocument> + Sync,
{
    info!(documents = documents.len(), "starting corpus run");

    let outcomes = documents
        .par_iter()
        .map(|document| -> Result<DocumentAnalysis> {
            let source = load(document)
                .with_context(|| format!("failed to load document {}", document.id))?;
            pipeline
                .analyze_document(&source)
                .with_context(|| format!("failed to analyze document {}", document.id))
        })
        .collect::<Vec<Result<DocumentAnalysis>>>();

    let documents_with_outcomes = documents
        .iter()
        .map(|document| document.id.clone())
        .zip(outcomes)
        .collect::<Vec<(String, Result<DocumentAnalysis>)>>();

    merge_results(
        documents_with_outcomes,
        persona,
        processing_timestamp,
        pipeline.ranking(),
    )
}

pub(super) fn merge_results(
    outcomes: Vec<(String, Result<DocumentAnalysis>)>,
    persona: &PersonaSpec,
    processing_timestamp: String,
    ranking: &RankingConfig,
) -> RunOutput {
    let mut input_documents = Vec::with_capacity(outcomes.len());
    let mut skipped_documents = Vec::<SkippedDocument>::new();
    let mut all_sections = Vec::<RankedSection>::new();
    let mut all_fragments = Vec::<SubSectionFragment>::new();
    let mut processed = 0usize;

    for (document, outcome) in outcomes {
        input_documents.push(document.clone());
        match outcome {
            Ok(analysis) => {
                processed += 1;
                all_sections.extend(analysis.ranked_sections);
                all_fragments.extend(analysis.sub_sections);
            }
            Err(error) => {
                warn!(document = %document, error = %format!("{error:#}"), "skipping document");
                skipped_documents.push(SkippedDocument {
                    document,
                    reason: format!("{error:#}"),
                });
            }
        }
    }

    let total_sections_found = all_sections.len();
    let total_sub_sections_analyzed = all_fragments.len();

    sort_sections(&mut all_sections);
    all_sections.truncate(ranking.max_sections);

    sort_fragments(&mut all_fragments);
    let mut seen = HashSet::<(String, usize, String)>::new();
    all_fragments.retain(|fragment| {
        seen.insert((
            fragment.document.clone(),
            fragment.page_number,
            fragment.refined_text.clone(),
        ))
    });
    all_fragments.truncate(ranking.max_subsections);

    info!(
        processed,
        skipped = skipped_documents.len(),
        sections = total_sections_found,
        sub_sections = total_sub_sections_analyzed,
        "corpus run merged"
    );

    RunOutput {
        metadata: RunMetadata {
            input_documents,
            persona: persona.persona.clone(),
            job_to_be_done: persona.job_to_be_done.clone(),
            processing_timestamp,
            total_documents_processed: processed,
            total_sections_found,
            total_sub_sections_analyzed,
            skipped_documents,
        },
        extracted_sections: all_sections,
        sub_section_analysis: all_fragments,
    }
}
