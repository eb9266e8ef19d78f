use clap::Parser;
use std::path::PathBuf;

use crate::report::ReportFormat;

#[derive(Parser, Debug)]
#[command(
    name = "polyscan",
    version,
    about = "Configurable security scanner orchestrator",
    long_about = "polyscan runs a configurable set of security scanners against a repository \
and aggregates their findings into a single report (text, JSON, YAML, or SARIF)."
)]
pub struct Cli {
    /// Repository to scan
    #[arg(default_value = ".")]
    pub target: PathBuf,

    /// Configuration documents, merged in order over the built-in defaults
    #[arg(short, long = "config")]
    pub config: Vec<PathBuf>,

    /// Drop config entries by "section:id" before merging
    #[arg(long = "ignore-config-id")]
    pub ignore_config_id: Vec<String>,

    /// Report format written to stdout (or to --output)
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Txt)]
    pub format: ReportFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Leave {{NAME}} placeholders in config documents untouched
    #[arg(long)]
    pub no_env_substitution: bool,

    /// Verbose output (text format only)
    #[arg(short, long)]
    pub verbose: bool,
}
