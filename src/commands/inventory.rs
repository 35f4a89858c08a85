use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::InventoryArgs;
use crate::config::{LanguageHints, load_config};
use crate::model::{DocumentEntry, DocumentInventoryManifest};
use crate::source::{LoadOptions, discover_documents, load_document};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let manifest = build_manifest(&args.input_dir, &config.language_hints)?;

    if args.dry_run {
        info!(
            document_count = manifest.document_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| args.input_dir.join("manifests").join("document_inventory.json"));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(document_count = manifest.document_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(
    input_dir: &Path,
    hints: &LanguageHints,
) -> Result<DocumentInventoryManifest> {
    let documents = discover_documents(input_dir, &[])?;
    if documents.is_empty() {
        warn!(input_dir = %input_dir.display(), "no documents found");
    }

    let mut entries = Vec::with_capacity(documents.len());
    for document in documents {
        let sha256 = sha256_file(&document.path)?;

        let (page_count, first_page) = match load_document(&document, LoadOptions::default()) {
            Ok(source) => {
                let first_page = source.pages.first().cloned();
                (Some(source.pages.len()), first_page)
            }
            Err(err) => {
                warn!(document = %document.id, error = %format!("{err:#}"), "could not load pages");
                (None, None)
            }
        };

        let language = detect_language(&document.id, first_page.as_deref(), hints);
        entries.push(DocumentEntry {
            file_name: document.id,
            format: document.format.as_str().to_string(),
            sha256,
            page_count,
            language,
        });
    }

    Ok(DocumentInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: input_dir.display().to_string(),
        document_count: entries.len(),
        documents: entries,
    })
}

/// Filename markers win, then CJK ideographs on the first page, then
/// first-page content markers.
pub fn detect_language(file_name: &str, first_page: Option<&str>, hints: &LanguageHints) -> String {
    let lowered_name = file_name.to_lowercase();
    for hint in &hints.hints {
        if hint
            .filename_markers
            .iter()
            .any(|marker| lowered_name.contains(&marker.to_lowercase()))
        {
            return hint.code.clone();
        }
    }

    let Some(first_page) = first_page else {
        return hints.default_language.clone();
    };

    if first_page.chars().any(is_cjk_ideograph) {
        return hints.cjk_language.clone();
    }

    let lowered_page = first_page.to_lowercase();
    for hint in &hints.hints {
        if hint
            .content_markers
            .iter()
            .any(|marker| lowered_page.contains(&marker.to_lowercase()))
        {
            return hint.code.clone();
        }
    }

    hints.default_language.clone()
}

fn is_cjk_ideograph(character: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&character)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn filename_markers_take_precedence_over_content() {
        let hints = LanguageHints::default();

        assert_eq!(
            detect_language("Handbuch_2020.pdf", Some("Introduzione"), &hints),
            "deu"
        );
        assert_eq!(detect_language("report.en.txt", None, &hints), "eng");
    }

    #[test]
    fn first_page_decides_when_filename_is_neutral() {
        let hints = LanguageHints::default();

        assert_eq!(detect_language("a.txt", Some("第一章 研究背景"), &hints), "chi_sim");
        assert_eq!(detect_language("a.txt", Some("INDICE\nCapitolo 1"), &hints), "ita");
        assert_eq!(detect_language("a.txt", Some("Vorwort des Autors"), &hints), "deu");
        assert_eq!(detect_language("a.txt", Some("Plain opening page."), &hints), "eng");
        assert_eq!(detect_language("a.txt", None, &hints), "eng");
    }

    #[test]
    fn manifest_lists_documents_with_hash_and_page_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("b.txt"), "one\u{000C}two\u{000C}three").expect("write");
        fs::write(dir.path().join("a.json"), "{ broken").expect("write");
        fs::write(dir.path().join("persona_job_input.json"), "{}").expect("write");

        let manifest =
            build_manifest(dir.path(), &LanguageHints::default()).expect("manifest builds");

        assert_eq!(manifest.document_count, 2);
        assert_eq!(manifest.documents[0].file_name, "a.json");
        assert_eq!(manifest.documents[0].page_count, None);
        assert_eq!(manifest.documents[1].file_name, "b.txt");
        assert_eq!(manifest.documents[1].format, "text");
        assert_eq!(manifest.documents[1].page_count, Some(3));
        assert_eq!(manifest.documents[1].sha256.len(), 64);
    }

    #[test]
    fn empty_directory_yields_empty_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");

        let manifest =
            build_manifest(dir.path(), &LanguageHints::default()).expect("manifest builds");

        assert_eq!(manifest.document_count, 0);
        assert!(manifest.documents.is_empty());
    }
}
