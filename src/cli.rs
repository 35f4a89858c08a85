use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "docrank",
    version,
    about = "Persona-driven outline extraction and section ranking over page-text corpora"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Outline(OutlineArgs),
    Rank(RankArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = "input")]
    pub input_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct OutlineArgs {
    #[arg(long, default_value = "input")]
    pub input_dir: PathBuf,

    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Drop repeated first/last lines across pages and merge hyphenated line wraps.
    #[arg(long, default_value_t = false)]
    pub strip_running_headers: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RankArgs {
    #[arg(long, default_value = "input")]
    pub input_dir: PathBuf,

    #[arg(long, default_value = "output/ranked_sections.json")]
    pub output_path: PathBuf,

    /// Defaults to `<input-dir>/persona_job_input.json`.
    #[arg(long)]
    pub persona_path: Option<PathBuf>,

    #[arg(long)]
    pub persona: Option<String>,

    #[arg(long)]
    pub job: Option<String>,

    #[arg(long = "focus-area")]
    pub focus_areas: Vec<String>,

    #[arg(long)]
    pub domain: Option<String>,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub strip_running_headers: bool,
}
