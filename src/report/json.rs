//! JSON report renderer, and the shared document builder the YAML
//! renderer reuses.

use serde_json::{Value, json};

use super::{Reporter, ScanReport, classify, normalize};

pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for JsonReporter {
    fn report(&self, report: &ScanReport) -> String {
        serde_json::to_string_pretty(&document(report))
            .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize report: {}"}}"#, e))
    }
}

/// Build the language-neutral report document: scan metadata plus one
/// entry per scanner with its normalized, classified issues.
pub fn document(report: &ScanReport) -> Value {
    let mut scans = serde_json::Map::new();
    for outcome in &report.outcomes {
        let issues: Vec<Value> = outcome
            .result
            .issues
            .iter()
            .map(|raw| {
                let issue = normalize(raw);
                let level = classify(issue.cvss);
                let mut value = serde_json::to_value(&issue).unwrap_or_default();
                if let Value::Object(map) = &mut value {
                    map.insert("level".to_string(), json!(level.to_string()));
                }
                value
            })
            .collect();

        scans.insert(
            outcome.scanner.clone(),
            json!({
                "passed": outcome.passed(),
                "required": outcome.required,
                "info": yaml_to_json(&serde_yaml::Value::Mapping(outcome.result.info.clone())),
                "error": outcome.result.error,
                "issues": issues,
            }),
        );
    }

    json!({
        "version": report.version,
        "project_name": report.project_name,
        "target": report.target,
        "scanned_at": report.scanned_at.to_rfc3339(),
        "passed": report.passed(),
        "custom_info": yaml_to_json(&report.custom_info),
        "scans": Value::Object(scans),
    })
}

fn yaml_to_json(value: &serde_yaml::Value) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
