use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::OutlineArgs;
use crate::config::load_config;
use crate::model::DocumentOutline;
use crate::pipeline::HeadingClassifier;
use crate::source::{DocumentRef, LoadOptions, discover_documents, load_document};
use crate::util::write_json_pretty;

pub fn run(args: OutlineArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let classifier = HeadingClassifier::new(&config.classifier)?;
    let options = LoadOptions {
        strip_running_headers: args.strip_running_headers,
    };

    let documents = discover_documents(&args.input_dir, &[])?;
    if documents.is_empty() {
        warn!(input_dir = %args.input_dir.display(), "no documents found");
    }

    let mut written = 0usize;
    for document in &documents {
        match write_outline(&classifier, document, options, &args.output_dir) {
            Ok(path) => {
                written += 1;
                info!(document = %document.id, path = %path.display(), "wrote outline");
            }
            Err(err) => {
                warn!(document = %document.id, error = %format!("{err:#}"), "skipping document");
            }
        }
    }

    info!(
        documents = documents.len(),
        written,
        output_dir = %args.output_dir.display(),
        "outline completed"
    );

    Ok(())
}

fn write_outline(
    classifier: &HeadingClassifier,
    document: &DocumentRef,
    options: LoadOptions,
    output_dir: &Path,
) -> Result<PathBuf> {
    let source = load_document(document, options)
        .with_context(|| format!("failed to load document {}", document.id))?;

    let outline = DocumentOutline {
        title: source.title.clone(),
        outline: classifier.outline_for(&source),
    };

    let stem = document
        .path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(&document.id);
    let path = output_dir.join(format!("{stem}.json"));
    write_json_pretty(&path, &outline)?;

    Ok(path)
}
