//! Turns input files into per-page text. Three formats are understood:
//! form-feed separated text (what `pdftotext` writes), JSON page files and
//! PDFs decoded through the external `pdftotext` tool.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::debug;

use crate::model::Heading;

mod normalize;
mod pdftotext;

use normalize::*;
use pdftotext::*;

pub const DEFAULT_PERSONA_FILE: &str = "persona_job_input.json";

/// Numbered JSON pages may leave at most this many pages unlisted.
const MAX_MISSING_PAGES: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Text,
    Json,
    Pdf,
}

impl SourceFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceFormat::Text => "text",
            SourceFormat::Json => "json",
            SourceFormat::Pdf => "pdf",
        }
    }

    fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "txt" => Some(SourceFormat::Text),
            "json" => Some(SourceFormat::Json),
            "pdf" => Some(SourceFormat::Pdf),
            _ => None,
        }
    }
}

/// A discovered input file. `id` is the file name and doubles as the
/// document identifier in run output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub id: String,
    pub path: PathBuf,
    pub format: SourceFormat,
}

#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub id: String,
    pub title: String,
    /// Page 1 at index 0.
    pub pages: Vec<String>,
    pub outline: Option<Vec<Heading>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    pub strip_running_headers: bool,
}

#[derive(Debug, Deserialize)]
struct JsonDocument {
    #[serde(default)]
    title: Option<String>,
    pages: Vec<JsonPage>,
    #[serde(default)]
    outline: Option<Vec<Heading>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonPage {
    Text(String),
    Numbered { page: usize, text: String },
}

/// Lists loadable documents in `input_dir`, sorted by file name. Files in
/// `excluded` (persona files, typically) are skipped.
pub fn discover_documents(input_dir: &Path, excluded: &[PathBuf]) -> Result<Vec<DocumentRef>> {
    let excluded_names = excluded
        .iter()
        .filter(|path| path.parent().map(|parent| same_dir(parent, input_dir)).unwrap_or(false))
        .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
        .map(ToOwned::to_owned)
        .collect::<HashSet<String>>();

    let entries = fs::read_dir(input_dir)
        .with_context(|| format!("failed to read {}", input_dir.display()))?;

    let mut documents = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", input_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let Some(format) = SourceFormat::from_path(&path) else {
            continue;
        };

        let id = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        if id == DEFAULT_PERSONA_FILE || excluded_names.contains(&id) {
            continue;
        }

        documents.push(DocumentRef { id, path, format });
    }

    documents.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(documents)
}

pub fn load_document(document: &DocumentRef, options: LoadOptions) -> Result<SourceDocument> {
    let stem = document
        .path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(&document.id)
        .to_string();

    let (title, mut pages, outline) = match document.format {
        SourceFormat::Text => {
            let raw = fs::read_to_string(&document.path)
                .with_context(|| format!("failed to read {}", document.path.display()))?;
            (stem, split_form_feed_pages(&raw), None)
        }
        SourceFormat::Json => {
            let raw = fs::read(&document.path)
                .with_context(|| format!("failed to read {}", document.path.display()))?;
            let parsed: JsonDocument = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", document.path.display()))?;
            let title = parsed
                .title
                .map(|title| title.trim().to_string())
                .filter(|title| !title.is_empty())
                .unwrap_or(stem);
            (title, place_pages(parsed.pages)?, parsed.outline)
        }
        SourceFormat::Pdf => (stem, extract_pages_with_pdftotext(&document.path)?, None),
    };

    if options.strip_running_headers {
        let stats = strip_running_lines(&mut pages);
        debug!(
            document = %document.id,
            header_lines_removed = stats.header_lines_removed,
            footer_lines_removed = stats.footer_lines_removed,
            dehyphenation_merges = stats.dehyphenation_merges,
            "normalized pages"
        );
    }

    Ok(SourceDocument {
        id: document.id.clone(),
        title,
        pages,
        outline,
    })
}

/// Splits on form feeds and drops trailing blank pages.
pub(crate) fn split_form_feed_pages(raw: &str) -> Vec<String> {
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = pages.last() {
        if last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    pages
}

/// Places page entries by number. Plain strings take their array position;
/// numbered entries may arrive in any order. Gaps become empty pages, up to
/// `MAX_MISSING_PAGES` of them.
fn place_pages(entries: Vec<JsonPage>) -> Result<Vec<String>> {
    let entry_count = entries.len();
    let max_page = entry_count.saturating_add(MAX_MISSING_PAGES);
    let mut placed = HashMap::<usize, String>::new();

    for (index, entry) in entries.into_iter().enumerate() {
        let (number, text) = match entry {
            JsonPage::Text(text) => (index + 1, text),
            JsonPage::Numbered { page, text } => (page, text),
        };

        if number == 0 {
            bail!("page numbers are 1-based; found page 0");
        }
        if number > max_page {
            bail!("page {number} is out of range for a document with {entry_count} page entries");
        }
        if placed.insert(number, text).is_some() {
            bail!("page {number} appears more than once");
        }
    }

    let page_count = placed.keys().copied().max().unwrap_or(0);
    Ok((1..=page_count)
        .map(|number| placed.remove(&number).unwrap_or_default())
        .collect())
}

fn same_dir(left: &Path, right: &Path) -> bool {
    match (fs::canonicalize(left), fs::canonicalize(right)) {
        (Ok(left), Ok(right)) => left == right,
        _ => left == right,
    }
}
