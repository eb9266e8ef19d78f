//! YAML report renderer. Same document as the JSON renderer, different
//! serialization.

use super::json::document;
use super::{Reporter, ScanReport};

pub struct YamlReporter;

impl YamlReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for YamlReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for YamlReporter {
    fn report(&self, report: &ScanReport) -> String {
        serde_yaml::to_string(&document(report))
            .unwrap_or_else(|e| format!("error: \"Failed to serialize report: {}\"\n", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{outcome_with_issues, raw_issue, test_report};

    #[test]
    fn test_yaml_output_parses_back() {
        let report = test_report(vec![outcome_with_issues(
            "BundleAudit",
            true,
            vec![raw_issue("cve: CVE-1\ncvss: 3.0\n")],
        )]);
        let output = YamlReporter::new().report(&report);

        let doc: serde_yaml::Value = serde_yaml::from_str(&output).unwrap();
        assert_eq!(doc["project_name"], "demo");
        assert_eq!(doc["scans"]["BundleAudit"]["issues"][0]["level"], "warning");
    }
}
