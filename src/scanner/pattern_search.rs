//! Built-in pattern-search scanner: flags forbidden regex matches in
//! repository files.

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use super::{RawScannerResult, Scanner};
use crate::report::{IssueFields, RawIssue};

/// Per-pattern option entry under `scanner_configs.PatternSearch.matches`.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRule {
    pub pattern: String,
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_severity")]
    pub severity: f64,
    /// Rule identifier in reports; one identifier groups all its hits.
    #[serde(default = "default_rule_id")]
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct PatternSearchConfig {
    matches: Vec<MatchRule>,
    exclude_directories: Vec<String>,
    max_file_size: Option<u64>,
}

fn default_severity() -> f64 {
    5.0
}

fn default_rule_id() -> String {
    "ForbiddenPattern".to_string()
}

const DEFAULT_EXCLUDES: &[&str] = &[".git", "node_modules", "target", "vendor"];
const DEFAULT_MAX_FILE_SIZE: u64 = 1_048_576;

pub struct PatternSearchScanner;

impl PatternSearchScanner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PatternSearchScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner for PatternSearchScanner {
    fn identity(&self) -> &'static str {
        "PatternSearch"
    }

    fn run(&self, target: &Path, config: &Mapping) -> RawScannerResult {
        let config: PatternSearchConfig =
            match serde_yaml::from_value(Value::Mapping(config.clone())) {
                Ok(c) => c,
                Err(e) => return RawScannerResult::errored(format!("invalid options: {e}")),
            };

        let mut compiled = Vec::with_capacity(config.matches.len());
        for rule in &config.matches {
            match Regex::new(&rule.pattern) {
                Ok(re) => compiled.push((re, rule)),
                Err(e) => {
                    return RawScannerResult::errored(format!(
                        "invalid pattern {:?}: {e}",
                        rule.pattern
                    ));
                }
            }
        }

        let excludes: Vec<&str> = if config.exclude_directories.is_empty() {
            DEFAULT_EXCLUDES.to_vec()
        } else {
            config.exclude_directories.iter().map(|s| s.as_str()).collect()
        };
        let max_size = config.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE);

        let mut issues = Vec::new();
        let walker = WalkDir::new(target)
            .into_iter()
            .filter_entry(|e| !is_excluded(e, &excludes));

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.metadata().map(|m| m.len() > max_size).unwrap_or(true) {
                continue;
            }
            // Binary files fail utf-8 conversion and are skipped.
            let Ok(content) = fs::read_to_string(entry.path()) else {
                continue;
            };
            let relative = entry
                .path()
                .strip_prefix(target)
                .unwrap_or(entry.path())
                .display()
                .to_string();

            for (line_no, line) in content.lines().enumerate() {
                for (re, rule) in &compiled {
                    if re.is_match(line) {
                        issues.push(hit_record(rule, &relative, line_no + 1));
                    }
                }
            }
        }

        debug!(hits = issues.len(), "PatternSearch completed");
        RawScannerResult::completed(issues)
    }
}

fn hit_record(rule: &MatchRule, file: &str, line: usize) -> RawIssue {
    RawIssue::Tagged {
        kind: rule.id.clone(),
        source: Some(format!("{file}:{line}")),
        rest: vec![
            ("pattern".to_string(), rule.pattern.clone()),
            ("message".to_string(), rule.message.clone()),
        ],
        fields: IssueFields {
            cvss: rule.severity,
            resource: Some(file.to_string()),
            ..IssueFields::default()
        },
    }
}

fn is_excluded(entry: &DirEntry, excludes: &[&str]) -> bool {
    // The walk root is always scanned, whatever it happens to be named.
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| excludes.contains(&name))
            .unwrap_or(false)
}
