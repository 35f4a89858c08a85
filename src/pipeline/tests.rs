use std::path::PathBuf;

use super::*;
use crate::persona::{Domain, ExpertiseLevel};
use crate::source::{LoadOptions, SourceFormat, discover_documents, load_document};

/// Body text of exactly `length` characters: four-letter words separated by
/// spaces and closed by a period.
fn filler(length: usize) -> String {
    let mut text = "abcd "
        .chars()
        .cycle()
        .take(length.saturating_sub(1))
        .collect::<String>();
    text.push('.');
    text
}

fn classifier() -> HeadingClassifier {
    HeadingClassifier::new(&ClassifierConfig::default()).expect("classifier builds")
}

fn level_of(classifier: &HeadingClassifier, line: &str) -> Option<HeadingLevel> {
    classifier.matching_rule(line).map(|matcher| matcher.level)
}

fn scorer(terms: &[&str]) -> RelevanceScorer {
    RelevanceScorer::new(KeywordSet::from_terms(terms), RankingConfig::default())
}

fn methodology_persona() -> PersonaSpec {
    PersonaSpec {
        persona: String::new(),
        job_to_be_done: String::new(),
        focus_areas: vec!["methodology".to_string()],
        expertise_level: ExpertiseLevel::Expert,
        domain: Domain::AcademicResearch,
    }
}

fn document(id: &str, pages: Vec<String>, outline: Option<Vec<Heading>>) -> SourceDocument {
    SourceDocument {
        id: id.to_string(),
        title: id.to_string(),
        pages,
        outline,
    }
}

fn ranked(document: &str, title: &str, score: f64) -> RankedSection {
    RankedSection {
        document: document.to_string(),
        page_number: 1,
        section_title: title.to_string(),
        importance_rank: score,
        level: HeadingLevel::H1,
        content: String::new(),
    }
}

fn fragment(document: &str, text: &str, score: f64) -> SubSectionFragment {
    SubSectionFragment {
        document: document.to_string(),
        page_number: 1,
        refined_text: text.to_string(),
        importance_rank: score,
        parent_section: "Parent".to_string(),
    }
}

#[test]
fn prose_pages_produce_no_headings() {
    let pages = vec![
        "the morning was quiet and the lab was empty.\nwe waited for the samples to arrive."
            .to_string(),
        "Nothing else happened that day, which suited everyone.\n\n".to_string(),
        String::new(),
    ];

    assert!(classifier().extract_outline(&pages).is_empty());
}

#[test]
fn numbered_lines_take_their_depth_as_level() {
    let classifier = classifier();

    assert_eq!(
        level_of(&classifier, "2.3.1 Data Collection"),
        Some(HeadingLevel::H3)
    );
    assert_eq!(
        level_of(&classifier, "2.3 Data Collection"),
        Some(HeadingLevel::H2)
    );
    assert_eq!(level_of(&classifier, "2. Background"), Some(HeadingLevel::H1));
    assert_eq!(
        classifier
            .matching_rule("2.3 Data Collection")
            .map(|matcher| matcher.name),
        Some("numbered_h2")
    );
}

#[test]
fn numbered_list_items_are_not_headings() {
    let classifier = classifier();

    assert_eq!(level_of(&classifier, "3. We sampled 20 sites, 5 failed"), None);
    assert_eq!(level_of(&classifier, "4.2 Results for 2023, by region"), None);
    let long_title = format!("5. A{}", "b".repeat(120));
    assert_eq!(level_of(&classifier, &long_title), None);
    assert_eq!(
        level_of(&classifier, "4.2 Goals & Scope (Draft)"),
        Some(HeadingLevel::H2)
    );
}

#[test]
fn landmark_headings_are_h1_even_with_trailing_punctuation() {
    let classifier = classifier();

    assert_eq!(
        classifier
            .matching_rule("References")
            .map(|matcher| matcher.name),
        Some("landmark")
    );
    assert_eq!(
        level_of(&classifier, "Acknowledgements:"),
        Some(HeadingLevel::H1)
    );
}

#[test]
fn publisher_names_are_rejected_with_or_without_numbering() {
    let classifier = classifier();

    for line in ["WILEY", "1. WILEY", "2 WILEY", "Springer"] {
        assert_eq!(level_of(&classifier, line), None, "{line}");
    }
    assert!(classifier.classify_page("WILEY\n1. WILEY\n", 4).is_empty());
}

#[test]
fn validity_filter_rejects_noise_lines() {
    let classifier = classifier();

    for line in [
        "Introduction ........ 3",
        "John Smith",
        "2024",
        "ABC",
        "Ok",
    ] {
        assert_eq!(level_of(&classifier, line), None, "{line}");
    }
    assert_eq!(
        level_of(&classifier, &"A".repeat(151)),
        None,
        "over-long line"
    );
}

#[test]
fn dot_leaders_are_stripped_before_classification() {
    let classifier = classifier();

    assert_eq!(
        classifier.normalize_heading_text("  Introduction \t ......"),
        "Introduction"
    );
    let headings = classifier.classify_page("Introduction ......\n", 2);
    assert_eq!(
        headings,
        vec![Heading {
            level: HeadingLevel::H1,
            text: "Introduction".to_string(),
            page: 2,
        }]
    );
}

#[test]
fn extract_outline_keeps_first_occurrence_case_insensitively() {
    let pages = vec![
        "Background and Scope\nsome prose follows here.".to_string(),
        "BACKGROUND AND SCOPE\nmore prose follows here.".to_string(),
    ];

    let outline = classifier().extract_outline(&pages);

    assert_eq!(outline.len(), 1);
    assert_eq!(outline[0].text, "Background and Scope");
    assert_eq!(outline[0].page, 1);
}

#[test]
fn supplied_outline_is_normalized_and_deduplicated() {
    let supplied = vec![
        Heading {
            level: HeadingLevel::H1,
            text: "  Scope   and Aims ....".to_string(),
            page: 1,
        },
        Heading {
            level: HeadingLevel::H2,
            text: "scope and aims".to_string(),
            page: 2,
        },
        Heading {
            level: HeadingLevel::H2,
            text: "Zero Page".to_string(),
            page: 0,
        },
    ];

    let prepared = classifier().prepare_supplied_outline(&supplied);

    assert_eq!(
        prepared,
        vec![Heading {
            level: HeadingLevel::H1,
            text: "Scope and Aims".to_string(),
            page: 1,
        }]
    );
}

#[test]
fn headings_past_the_last_page_are_excluded_without_error() {
    let pages = vec![filler(150), filler(150)];
    let headings = vec![
        Heading {
            level: HeadingLevel::H1,
            text: "Scope and Aims".to_string(),
            page: 2,
        },
        Heading {
            level: HeadingLevel::H2,
            text: "Missing Part".to_string(),
            page: 9,
        },
    ];

    let assembly = assemble_sections(&pages, &headings, &AssemblyConfig::default());

    assert_eq!(assembly.sections.len(), 1);
    assert_eq!(assembly.sections[0].page, 2);
    assert_eq!(assembly.out_of_range.len(), 1);
    assert_eq!(assembly.out_of_range[0].page, 9);
}

#[test]
fn analyze_document_drops_out_of_range_supplied_headings() {
    let pipeline = Pipeline::new(&PipelineConfig::default(), &PersonaSpec::default())
        .expect("pipeline builds");
    let source = document(
        "report.json",
        vec![filler(160)],
        Some(vec![
            Heading {
                level: HeadingLevel::H1,
                text: "Scope and Aims".to_string(),
                page: 1,
            },
            Heading {
                level: HeadingLevel::H2,
                text: "Missing Part".to_string(),
                page: 9,
            },
        ]),
    );

    let analysis = pipeline.analyze_document(&source).expect("analysis succeeds");

    assert_eq!(analysis.ranked_sections.len(), 1);
    assert_eq!(analysis.ranked_sections[0].section_title, "Scope and Aims");
}

#[test]
fn quality_gate_requires_one_hundred_characters() {
    let config = AssemblyConfig::default();
    let short = clean_text(&filler(99));
    let exact = clean_text(&filler(100));

    assert_eq!(char_len(&short), 99);
    assert_eq!(char_len(&exact), 100);
    assert!(word_count(&exact) >= 20);
    assert!(sentence_fragment_count(&exact) >= 2);

    assert!(!passes_quality_gate(&short, &config));
    assert!(passes_quality_gate(&exact, &config));

    let heading = Heading {
        level: HeadingLevel::H1,
        text: "Scope and Aims".to_string(),
        page: 1,
    };
    let rejected = assemble_sections(&[filler(99)], std::slice::from_ref(&heading), &config);
    assert!(rejected.sections.is_empty());
    assert_eq!(rejected.rejected, 1);

    let accepted = assemble_sections(&[filler(100)], &[heading], &config);
    assert_eq!(accepted.sections.len(), 1);
}

#[test]
fn clean_text_keeps_paragraph_breaks_and_drops_symbols() {
    let cleaned = clean_text("  First line\nsecond line\n\n  Next para @#$ here\t\tend  ");

    assert_eq!(cleaned, "First line second line\n\nNext para here end");
}

#[test]
fn scores_stay_in_range_and_grow_with_heading_keywords() {
    let terms = ["alpha", "beta", "gamma", "delta", "epsilon"];
    let scorer = scorer(&terms);
    let plain_body = "The crew checked every valve twice before the shift ended. \
                      Nobody reported any leaks during the night inspection round.";
    let rich_body = "alpha beta gamma delta epsilon appear here together in one line. \
                     alpha and beta appear again in the second sentence too.";

    for body in [plain_body, rich_body] {
        let mut previous = f64::MIN;
        for matched in 0..=terms.len() {
            let heading = format!("Heading {}", terms[..matched].join(" "));
            let score = scorer.score(body, Some(&heading));

            assert!((0.0..=10.0).contains(&score), "{score}");
            assert!(score >= previous, "{score} < {previous}");
            previous = score;
        }
    }

    assert_eq!(scorer.score(rich_body, Some("alpha beta gamma delta epsilon")), 10.0);
    assert_eq!(scorer.score("   ", Some("alpha")), 0.0);
}

#[test]
fn scoring_is_idempotent() {
    let scorer = scorer(&["valve", "leak"]);
    let body = "The valve showed a slow leak. It was replaced before the next run began.";

    let first = scorer.score(body, Some("Valve Checks"));
    let second = scorer.score(body, Some("Valve Checks"));

    assert_eq!(first.to_bits(), second.to_bits());
}

#[test]
fn text_quality_tiers() {
    assert_eq!(text_quality(""), 0.0);
    assert_eq!(text_quality("only a few words."), 0.1);

    let run_on = vec!["word"; 60].join(" ");
    assert_eq!(text_quality(&run_on), 0.3);

    let balanced = "The samples were stored in a cold room overnight before testing. \
                    Each one was weighed twice early in the next morning.";
    assert_eq!(text_quality(balanced), 1.0);
}

#[test]
fn sentence_fragments_count_delimiter_runs_plus_one() {
    assert_eq!(sentence_fragment_count("One sentence."), 2);
    assert_eq!(sentence_fragment_count("Wait... what?!"), 3);
    assert_eq!(sentence_fragment_count("no delimiter"), 1);
}

#[test]
fn methodology_section_outscores_keyword_free_text() {
    let pipeline =
        Pipeline::new(&PipelineConfig::default(), &methodology_persona()).expect("pipeline");
    let pages = vec![
        "an opening page with ordinary prose only.\nit has no headings at all.".to_string(),
        "the second page is also plain.\nit continues the same way.".to_string(),
        "3.1 Methodology\n\
         We describe our methodology and dataset in this part of the paper. \
         Each participant group was sampled with care across three sites. \
         Every reading was logged twice by separate staff members."
            .to_string(),
    ];

    let analysis = pipeline
        .analyze_document(&document("paper.txt", pages, None))
        .expect("analysis succeeds");

    assert_eq!(analysis.ranked_sections.len(), 1);
    let section = &analysis.ranked_sections[0];
    assert_eq!(section.section_title, "3.1 Methodology");
    assert_eq!(section.page_number, 3);
    assert_eq!(section.level, HeadingLevel::H2);

    let neutral = filler(char_len(&section.content));
    let neutral_score = pipeline.scorer.score(&neutral, Some("3.1 Garden"));
    assert!(
        section.importance_rank > neutral_score,
        "{} <= {neutral_score}",
        section.importance_rank
    );
}

#[test]
fn equal_scores_keep_input_order() {
    let scorer = scorer(&["valve"]);
    let content = filler(120);
    let sections = ["First Part", "Second Part", "Third Part"]
        .iter()
        .map(|heading| Section {
            level: HeadingLevel::H1,
            heading: heading.to_string(),
            page: 1,
            content: content.clone(),
        })
        .collect::<Vec<Section>>();

    let ranked = scorer.rank_sections("doc.txt", &sections);
    let titles = ranked
        .iter()
        .map(|section| section.section_title.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(titles, vec!["First Part", "Second Part", "Third Part"]);

    let mut mixed = vec![
        ranked_item("a", 1.0),
        ranked_item("b", 3.0),
        ranked_item("c", 1.0),
        ranked_item("d", 3.0),
    ];
    sort_sections(&mut mixed);
    let order = mixed
        .iter()
        .map(|section| section.section_title.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(order, vec!["b", "d", "a", "c"]);
}

fn ranked_item(title: &str, score: f64) -> RankedSection {
    ranked("doc.txt", title, score)
}

#[test]
fn rank_sections_drops_short_content() {
    let scorer = scorer(&["valve"]);
    let sections = vec![Section {
        level: HeadingLevel::H2,
        heading: "Valve Notes".to_string(),
        page: 1,
        content: "valve too short.".to_string(),
    }];

    assert!(scorer.rank_sections("doc.txt", &sections).is_empty());
}

#[test]
fn segmentation_packs_paragraphs_greedily() {
    let first = filler(100);
    let second = filler(150);
    let third = filler(100);
    let text = format!("{first}\n\n{second}\n\n{third}");

    let fragments = segment_text(&text, 300, 20, 50);

    assert_eq!(fragments.len(), 2);
    assert_eq!(fragments[0], format!("{first}\n\n{second}"));
    assert_eq!(char_len(&fragments[0]), 252);
    assert_eq!(fragments[1], third);
}

#[test]
fn segmentation_splits_oversized_paragraphs_and_drops_tiny_ones() {
    let text = format!("tiny line.\n\n{}", filler(700));

    let fragments = segment_text(&text, 300, 20, 50);

    assert!(fragments.len() >= 3);
    for fragment in &fragments {
        let length = char_len(fragment);
        assert!((50..=300).contains(&length), "{length}");
        assert!(!fragment.contains("tiny"));
    }
}

#[test]
fn split_at_word_boundaries_cuts_long_words() {
    let pieces = split_at_word_boundaries("ab abcdefgh cd", 4);

    assert_eq!(pieces, vec!["ab", "abcd", "efgh", "cd"]);
}

#[test]
fn sub_sections_carry_parent_and_truncated_preview() {
    let scorer = scorer(&["abcd"]);
    let long_paragraph = filler(280);
    let mut section = ranked("doc.txt", "Parent Heading", 5.0);
    section.page_number = 4;
    section.content = format!("{long_paragraph}\n\n{}", filler(90));

    let fragments = scorer.analyze_sub_sections(&[section]);

    assert_eq!(fragments.len(), 2);
    for fragment in &fragments {
        assert_eq!(fragment.parent_section, "Parent Heading");
        assert_eq!(fragment.page_number, 4);
        assert!((0.0..=10.0).contains(&fragment.importance_rank));
    }
    let truncated = fragments
        .iter()
        .find(|fragment| fragment.refined_text.ends_with("..."))
        .expect("long fragment is previewed");
    assert_eq!(char_len(&truncated.refined_text), 203);
}

#[test]
fn sub_sections_respect_per_document_cap() {
    let ranking = RankingConfig {
        subsections_per_document: 2,
        ..RankingConfig::default()
    };
    let scorer = RelevanceScorer::new(KeywordSet::from_terms(["abcd"]), ranking);
    let sections = (0..4)
        .map(|index| {
            let mut section = ranked("doc.txt", &format!("Part {index}"), 5.0);
            section.page_number = index + 1;
            section.content = filler(120);
            section
        })
        .collect::<Vec<RankedSection>>();

    assert_eq!(scorer.analyze_sub_sections(&sections).len(), 2);
}

#[test]
fn repeated_page_text_does_not_crowd_out_other_fragments() {
    let ranking = RankingConfig {
        subsections_per_document: 2,
        ..RankingConfig::default()
    };
    let scorer = RelevanceScorer::new(KeywordSet::from_terms(["abcd"]), ranking);
    let mut sections = ["Scope and Aims", "Study Design", "Site Selection"]
        .iter()
        .map(|title| {
            let mut section = ranked("doc.txt", title, 5.0);
            section.content = filler(120);
            section
        })
        .collect::<Vec<RankedSection>>();
    let mut other_page = ranked("doc.txt", "Findings", 5.0);
    other_page.page_number = 2;
    other_page.content = filler(130);
    sections.push(other_page);

    let fragments = scorer.analyze_sub_sections(&sections);

    assert_eq!(fragments.len(), 2);
    assert_eq!(fragments[0].page_number, 1);
    assert_eq!(fragments[0].parent_section, "Scope and Aims");
    assert_eq!(fragments[1].page_number, 2);
}

#[test]
fn truncate_preview_appends_ellipsis_only_when_cut() {
    assert_eq!(truncate_preview("abcdef", 3), "abc...");
    assert_eq!(truncate_preview("abc", 3), "abc");
}

#[test]
fn merge_caps_totals_and_orders_across_documents() {
    let outcomes = (0..20)
        .map(|doc| {
            let id = format!("doc{doc:02}.txt");
            let ranked_sections = (0..10)
                .map(|index| ranked(&id, &format!("S{index}"), (doc * 10 + index) as f64 / 20.0))
                .collect();
            let sub_sections = (0..5)
                .map(|index| fragment(&id, &format!("fragment {index}"), index as f64))
                .collect();
            (
                id,
                Ok(DocumentAnalysis {
                    ranked_sections,
                    sub_sections,
                }),
            )
        })
        .collect::<Vec<(String, Result<DocumentAnalysis>)>>();

    let output = merge_results(
        outcomes,
        &PersonaSpec::default(),
        "2024-01-01T00:00:00Z".to_string(),
        &RankingConfig::default(),
    );

    assert_eq!(output.extracted_sections.len(), 50);
    assert_eq!(output.sub_section_analysis.len(), 30);
    assert_eq!(output.metadata.total_documents_processed, 20);
    assert_eq!(output.metadata.total_sections_found, 200);
    assert_eq!(output.metadata.total_sub_sections_analyzed, 100);
    assert!(
        output
            .extracted_sections
            .windows(2)
            .all(|pair| pair[0].importance_rank >= pair[1].importance_rank)
    );
    assert_eq!(output.extracted_sections[0].document, "doc19.txt");
}

#[test]
fn merge_drops_duplicate_fragments() {
    let analysis = DocumentAnalysis {
        ranked_sections: Vec::new(),
        sub_sections: vec![
            fragment("doc.txt", "same text", 2.0),
            fragment("doc.txt", "same text", 1.0),
            fragment("other.txt", "same text", 1.0),
        ],
    };

    let output = merge_results(
        vec![("doc.txt".to_string(), Ok(analysis))],
        &PersonaSpec::default(),
        "2024-01-01T00:00:00Z".to_string(),
        &RankingConfig::default(),
    );

    assert_eq!(output.sub_section_analysis.len(), 2);
    assert_eq!(output.sub_section_analysis[0].importance_rank, 2.0);
}

#[test]
fn failing_documents_are_skipped_not_fatal() {
    let pipeline = Pipeline::new(&PipelineConfig::default(), &PersonaSpec::default())
        .expect("pipeline builds");
    let refs = ["bad.txt", "empty.txt", "good.txt"]
        .iter()
        .map(|id| DocumentRef {
            id: id.to_string(),
            path: PathBuf::from(id),
            format: SourceFormat::Text,
        })
        .collect::<Vec<DocumentRef>>();

    let output = run_corpus(
        &pipeline,
        &refs,
        |reference| match reference.id.as_str() {
            "bad.txt" => bail!("unreadable bytes"),
            "empty.txt" => Ok(document(&reference.id, Vec::new(), None)),
            _ => Ok(document(
                &reference.id,
                vec![format!("Scope and Aims\n{}", filler(150))],
                None,
            )),
        },
        &PersonaSpec::default(),
        "2024-01-01T00:00:00Z".to_string(),
    );

    assert_eq!(
        output.metadata.input_documents,
        vec!["bad.txt", "empty.txt", "good.txt"]
    );
    assert_eq!(output.metadata.total_documents_processed, 1);
    assert_eq!(output.metadata.skipped_documents.len(), 2);
    assert!(
        output.metadata.skipped_documents[0]
            .reason
            .contains("unreadable bytes")
    );
    assert!(
        output
            .extracted_sections
            .iter()
            .all(|section| section.document == "good.txt")
    );
    assert!(!output.extracted_sections.is_empty());
}

#[test]
fn out_of_range_json_page_number_skips_only_that_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("good.txt"),
        format!("Scope and Aims\n{}", filler(150)),
    )
    .expect("write");
    std::fs::write(
        dir.path().join("huge.json"),
        r#"{ "pages": [ { "page": 18446744073709551615, "text": "x" } ] }"#,
    )
    .expect("write");

    let pipeline = Pipeline::new(&PipelineConfig::default(), &PersonaSpec::default())
        .expect("pipeline builds");
    let refs = discover_documents(dir.path(), &[]).expect("discover");

    let output = run_corpus(
        &pipeline,
        &refs,
        |reference| load_document(reference, LoadOptions::default()),
        &PersonaSpec::default(),
        "2024-01-01T00:00:00Z".to_string(),
    );

    assert_eq!(output.metadata.total_documents_processed, 1);
    assert_eq!(output.metadata.skipped_documents.len(), 1);
    assert_eq!(output.metadata.skipped_documents[0].document, "huge.json");
    assert!(!output.extracted_sections.is_empty());
    assert!(
        output
            .extracted_sections
            .iter()
            .all(|section| section.document == "good.txt")
    );
}

#[test]
fn empty_corpus_yields_well_formed_output() {
    let pipeline = Pipeline::new(&PipelineConfig::default(), &PersonaSpec::default())
        .expect("pipeline builds");

    let output = run_corpus(
        &pipeline,
        &[],
        |_| -> Result<SourceDocument> { bail!("no documents to load") },
        &PersonaSpec::default(),
        "2024-01-01T00:00:00Z".to_string(),
    );

    assert!(output.extracted_sections.is_empty());
    assert!(output.sub_section_analysis.is_empty());
    assert_eq!(output.metadata.total_documents_processed, 0);

    let value = serde_json::to_value(&output).expect("serializes");
    assert!(value["metadata"].get("skipped_documents").is_none());
    assert_eq!(value["metadata"]["persona"], PersonaSpec::default().persona);
}
