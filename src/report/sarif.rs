//! Structured report assembly (SARIF 2.1.0).

use std::collections::HashMap;

use serde::Serialize;

use super::{Level, Reporter, ScanReport, ScannerOutcome, classify, normalize};

const SCHEMA_URI: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const SARIF_VERSION: &str = "2.1.0";
const INFORMATION_URI: &str = "https://github.com/polyscan/polyscan";

/// Resource locator used when a scanner reports no file of its own.
/// Dependency audits conventionally concern the lockfile.
const DEFAULT_ARTIFACT_URI: &str = "Gemfile.lock";

pub struct SarifReporter;

impl SarifReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SarifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for SarifReporter {
    fn report(&self, report: &ScanReport) -> String {
        let sarif = SarifReport::assemble(report);
        serde_json::to_string_pretty(&sarif)
            .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize SARIF: {}"}}"#, e))
    }
}

#[derive(Debug, Serialize)]
pub struct SarifReport {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub version: String,
    pub runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRun {
    pub tool: SarifTool,
    pub results: Vec<SarifResult>,
    pub invocations: Vec<SarifInvocation>,
}

#[derive(Debug, Serialize)]
pub struct SarifTool {
    pub driver: SarifDriver,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifDriver {
    pub name: String,
    pub version: String,
    pub information_uri: String,
    pub rules: Vec<SarifRule>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRule {
    pub id: String,
    pub name: String,
    pub full_description: SarifMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_uri: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifResult {
    pub rule_id: String,
    pub rule_index: usize,
    pub level: Level,
    pub message: SarifMessage,
    pub locations: Vec<SarifLocation>,
}

#[derive(Debug, Serialize)]
pub struct SarifMessage {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLocation {
    pub physical_location: SarifPhysicalLocation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifPhysicalLocation {
    pub artifact_location: SarifArtifactLocation,
}

#[derive(Debug, Serialize)]
pub struct SarifArtifactLocation {
    pub uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifInvocation {
    pub execution_successful: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_execution_notifications: Vec<SarifNotification>,
}

#[derive(Debug, Serialize)]
pub struct SarifNotification {
    pub message: SarifMessage,
}

impl SarifReport {
    /// Fold every scanner outcome into one SARIF document.
    ///
    /// The rule catalog is shared across scanners: an id gets an index the
    /// first time it appears and keeps it for the rest of the document, so
    /// identical input always produces identical indices.
    pub fn assemble(report: &ScanReport) -> Self {
        let mut rules: Vec<SarifRule> = Vec::new();
        let mut rule_indices: HashMap<String, usize> = HashMap::new();
        let mut results: Vec<SarifResult> = Vec::new();
        let mut invocations: Vec<SarifInvocation> = Vec::new();

        for outcome in &report.outcomes {
            invocations.push(Self::invocation(outcome));

            for raw in &outcome.result.issues {
                let issue = normalize(raw);

                let rule_index = *rule_indices
                    .entry(issue.id.clone())
                    .or_insert_with(|| {
                        rules.push(SarifRule {
                            id: issue.id.clone(),
                            name: issue.name.clone(),
                            full_description: SarifMessage {
                                text: issue.details.clone(),
                            },
                            help_uri: issue.url.clone(),
                        });
                        rules.len() - 1
                    });

                results.push(SarifResult {
                    rule_id: issue.id.clone(),
                    rule_index,
                    level: classify(issue.cvss),
                    message: SarifMessage {
                        text: issue.details.clone(),
                    },
                    locations: vec![SarifLocation {
                        physical_location: SarifPhysicalLocation {
                            artifact_location: SarifArtifactLocation {
                                uri: issue
                                    .resource
                                    .unwrap_or_else(|| DEFAULT_ARTIFACT_URI.to_string()),
                            },
                        },
                    }],
                });
            }
        }

        SarifReport {
            schema: SCHEMA_URI.to_string(),
            version: SARIF_VERSION.to_string(),
            runs: vec![SarifRun {
                tool: SarifTool {
                    driver: SarifDriver {
                        name: "polyscan".to_string(),
                        version: report.version.clone(),
                        information_uri: INFORMATION_URI.to_string(),
                        rules,
                    },
                },
                results,
                invocations,
            }],
        }
    }

    /// An invocation is unsuccessful only when an enforced scanner could
    /// not run to completion. Findings are not a failure to run, and a
    /// fatal error on an optional scanner does not block the invocation.
    fn invocation(outcome: &ScannerOutcome) -> SarifInvocation {
        let notifications = outcome
            .result
            .error
            .iter()
            .map(|error| SarifNotification {
                message: SarifMessage {
                    text: format!("{}: {error}", outcome.scanner),
                },
            })
            .collect();
        SarifInvocation {
            execution_successful: !(outcome.required && outcome.result.status.fatal()),
            tool_execution_notifications: notifications,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::RawScannerResult;
    use crate::test_utils::fixtures::{outcome_with_issues, raw_issue, test_report};

    fn parsed(report: &ScanReport) -> serde_json::Value {
        serde_json::from_str(&SarifReporter::new().report(report)).unwrap()
    }

    #[test]
    fn test_empty_report() {
        let doc = parsed(&test_report(vec![]));
        assert_eq!(doc["$schema"], SCHEMA_URI);
        assert_eq!(doc["version"], "2.1.0");
        assert_eq!(doc["runs"][0]["tool"]["driver"]["name"], "polyscan");
        assert!(doc["runs"][0]["results"].as_array().unwrap().is_empty());
        assert!(doc["runs"][0]["invocations"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_zero_findings_successful_invocation() {
        let report = test_report(vec![outcome_with_issues("PatternSearch", true, vec![])]);
        let doc = parsed(&report);
        assert_eq!(
            doc["runs"][0]["invocations"][0]["executionSuccessful"],
            true
        );
        assert!(doc["runs"][0]["results"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_rule_deduplication_and_index() {
        let report = test_report(vec![outcome_with_issues(
            "BundleAudit",
            true,
            vec![
                raw_issue("cve: CVE-1\ncvss: 9.0\n"),
                raw_issue("cve: CVE-2\ncvss: 2.0\n"),
                raw_issue("cve: CVE-1\ncvss: 9.0\n"),
            ],
        )]);
        let doc = parsed(&report);

        let rules = doc["runs"][0]["tool"]["driver"]["rules"].as_array().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0]["id"], "CVE-1");
        assert_eq!(rules[1]["id"], "CVE-2");

        let results = doc["runs"][0]["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["ruleIndex"], 0);
        assert_eq!(results[1]["ruleIndex"], 1);
        assert_eq!(results[2]["ruleIndex"], 0);
        assert_eq!(results[0]["level"], "error");
        assert_eq!(results[1]["level"], "warning");
    }

    #[test]
    fn test_rule_indices_stable_across_scanners() {
        let report = test_report(vec![
            outcome_with_issues("BundleAudit", true, vec![raw_issue("cve: CVE-1\n")]),
            outcome_with_issues(
                "CargoAudit",
                true,
                vec![raw_issue("cve: CVE-1\n"), raw_issue("cve: CVE-3\n")],
            ),
        ]);
        let doc = parsed(&report);

        let rules = doc["runs"][0]["tool"]["driver"]["rules"].as_array().unwrap();
        assert_eq!(rules.len(), 2);

        let results = doc["runs"][0]["results"].as_array().unwrap();
        assert_eq!(results[0]["ruleIndex"], 0);
        assert_eq!(results[1]["ruleIndex"], 0);
        assert_eq!(results[2]["ruleIndex"], 1);
    }

    #[test]
    fn test_default_artifact_uri() {
        let report = test_report(vec![outcome_with_issues(
            "BundleAudit",
            true,
            vec![raw_issue("cve: CVE-1\n")],
        )]);
        let doc = parsed(&report);
        assert_eq!(
            doc["runs"][0]["results"][0]["locations"][0]["physicalLocation"]["artifactLocation"]
                ["uri"],
            "Gemfile.lock"
        );
    }

    #[test]
    fn test_reported_resource_wins_over_default() {
        let report = test_report(vec![outcome_with_issues(
            "PatternSearch",
            true,
            vec![raw_issue("type: ForbiddenPattern\nresource: app.sh\n")],
        )]);
        let doc = parsed(&report);
        assert_eq!(
            doc["runs"][0]["results"][0]["locations"][0]["physicalLocation"]["artifactLocation"]
                ["uri"],
            "app.sh"
        );
    }

    #[test]
    fn test_required_fatal_failure_marks_invocation() {
        let mut report = test_report(vec![]);
        report.push(ScannerOutcome {
            scanner: "BundleAudit".to_string(),
            required: true,
            result: RawScannerResult::errored("bundler missing"),
        });
        report.push(ScannerOutcome {
            scanner: "CargoAudit".to_string(),
            required: false,
            result: RawScannerResult::errored("cargo missing"),
        });

        let doc = parsed(&report);
        let invocations = doc["runs"][0]["invocations"].as_array().unwrap();
        assert_eq!(invocations[0]["executionSuccessful"], false);
        assert_eq!(invocations[1]["executionSuccessful"], true);
        assert_eq!(
            invocations[0]["toolExecutionNotifications"][0]["message"]["text"],
            "BundleAudit: bundler missing"
        );
    }

    #[test]
    fn test_findings_do_not_fail_invocation() {
        let report = test_report(vec![outcome_with_issues(
            "BundleAudit",
            true,
            vec![raw_issue("cve: CVE-1\ncvss: 9.9\n")],
        )]);
        let doc = parsed(&report);
        assert_eq!(
            doc["runs"][0]["invocations"][0]["executionSuccessful"],
            true
        );
    }
}
