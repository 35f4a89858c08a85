use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::cli::RankArgs;
use crate::config::load_config;
use crate::model::RunOutput;
use crate::persona::{Domain, PersonaSpec};
use crate::pipeline::{Pipeline, run_corpus};
use crate::source::{DEFAULT_PERSONA_FILE, LoadOptions, discover_documents, load_document};
use crate::util::{now_utc_string, read_json, write_json_pretty};

pub fn run(args: RankArgs) -> Result<()> {
    let output = rank_corpus(&args)?;

    write_json_pretty(&args.output_path, &output)?;
    info!(
        path = %args.output_path.display(),
        sections = output.extracted_sections.len(),
        sub_sections = output.sub_section_analysis.len(),
        skipped = output.metadata.skipped_documents.len(),
        "wrote ranked output"
    );

    Ok(())
}

fn rank_corpus(args: &RankArgs) -> Result<RunOutput> {
    let config = load_config(args.config.as_deref())?;
    let persona_path = args
        .persona_path
        .clone()
        .unwrap_or_else(|| args.input_dir.join(DEFAULT_PERSONA_FILE));
    let persona = apply_overrides(load_persona(&persona_path)?, args);

    info!(
        persona = %persona.persona,
        domain = persona.domain.as_str(),
        expertise = persona.expertise_level.as_str(),
        focus_areas = persona.focus_areas.len(),
        "resolved persona"
    );

    let pipeline = Pipeline::new(&config, &persona)?;
    info!(keywords = pipeline.keyword_count(), "built keyword set");

    let documents = discover_documents(&args.input_dir, std::slice::from_ref(&persona_path))?;
    let options = LoadOptions {
        strip_running_headers: args.strip_running_headers,
    };

    Ok(run_corpus(
        &pipeline,
        &documents,
        |document| load_document(document, options),
        &persona,
        now_utc_string(),
    ))
}

/// A missing persona file falls back to the built-in persona. A file that
/// exists but does not parse is an error.
fn load_persona(path: &Path) -> Result<PersonaSpec> {
    if !path.exists() {
        info!(path = %path.display(), "persona file not found; using default persona");
        return Ok(PersonaSpec::default());
    }

    let persona: PersonaSpec = read_json(path)?;
    info!(path = %path.display(), "loaded persona");
    Ok(persona)
}

fn apply_overrides(mut persona: PersonaSpec, args: &RankArgs) -> PersonaSpec {
    if let Some(text) = &args.persona {
        persona.persona = text.clone();
    }
    if let Some(job) = &args.job {
        persona.job_to_be_done = job.clone();
    }
    if !args.focus_areas.is_empty() {
        persona.focus_areas = args.focus_areas.clone();
    }
    if let Some(domain) = &args.domain {
        persona.domain = Domain::parse_lenient(domain);
    }
    persona
}
