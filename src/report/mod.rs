//! Scan reporting: normalization, classification, and renderers.

pub mod issue;
pub mod json;
pub mod sarif;
pub mod severity;
pub mod text;
pub mod yaml;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Deserialize;

use crate::config::EffectiveConfig;
use crate::error::{Result, ScanError};
use crate::scanner::RawScannerResult;

pub use issue::{CanonicalIssue, IssueFields, RawIssue, normalize};
pub use severity::{Level, classify};

/// Output format for a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Txt,
    Json,
    Yaml,
    Sarif,
}

impl FromStr for ReportFormat {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Txt),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "sarif" => Ok(Self::Sarif),
            other => Err(ScanError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Txt => "txt",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Sarif => "sarif",
        };
        f.write_str(label)
    }
}

/// One scanner's contribution to the report: its raw result plus whether
/// the scanner was enforced (a failure fails the whole scan).
#[derive(Debug, Clone)]
pub struct ScannerOutcome {
    pub scanner: String,
    pub required: bool,
    pub result: RawScannerResult,
}

impl ScannerOutcome {
    pub fn passed(&self) -> bool {
        self.result.status.passed()
    }

    /// True when this outcome fails the overall scan.
    pub fn blocking(&self) -> bool {
        self.required && !self.passed()
    }
}

/// Accumulated scan state, rendered into any [`ReportFormat`].
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub project_name: String,
    pub version: String,
    pub target: String,
    pub scanned_at: DateTime<Utc>,
    pub custom_info: serde_yaml::Value,
    pub outcomes: Vec<ScannerOutcome>,
}

impl ScanReport {
    pub fn new(config: &EffectiveConfig, target: impl Into<String>) -> Self {
        Self {
            project_name: config.project_name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            target: target.into(),
            scanned_at: Utc::now(),
            custom_info: config.custom_info.clone(),
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: ScannerOutcome) {
        self.outcomes.push(outcome);
    }

    /// The scan passes when no enforced scanner failed or errored.
    pub fn passed(&self) -> bool {
        !self.outcomes.iter().any(ScannerOutcome::blocking)
    }

    pub fn render(&self, format: ReportFormat, verbose: bool) -> String {
        let reporter: Box<dyn Reporter> = match format {
            ReportFormat::Txt => Box::new(text::TextReporter::new().with_verbose(verbose)),
            ReportFormat::Json => Box::new(json::JsonReporter::new()),
            ReportFormat::Yaml => Box::new(yaml::YamlReporter::new()),
            ReportFormat::Sarif => Box::new(sarif::SarifReporter::new()),
        };
        reporter.report(self)
    }
}

/// A report renderer. Serialization failures degrade to an inline error
/// payload rather than aborting the scan.
pub trait Reporter {
    fn report(&self, report: &ScanReport) -> String;
}
