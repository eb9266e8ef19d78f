//! Shared test fixtures.

pub mod fixtures {
    use chrono::Utc;
    use serde_yaml::Value;

    use crate::report::{RawIssue, ScanReport, ScannerOutcome};
    use crate::scanner::RawScannerResult;

    pub fn raw_issue(yaml: &str) -> RawIssue {
        let record: Value = serde_yaml::from_str(yaml).unwrap();
        RawIssue::from_value(&record)
    }

    pub fn outcome_with_issues(
        scanner: &str,
        required: bool,
        issues: Vec<RawIssue>,
    ) -> ScannerOutcome {
        ScannerOutcome {
            scanner: scanner.to_string(),
            required,
            result: RawScannerResult::completed(issues),
        }
    }

    pub fn passed_outcome(scanner: &str, required: bool) -> ScannerOutcome {
        outcome_with_issues(scanner, required, vec![])
    }

    pub fn failed_outcome(scanner: &str, required: bool) -> ScannerOutcome {
        outcome_with_issues(scanner, required, vec![raw_issue("cve: CVE-0000\ncvss: 8.0\n")])
    }

    pub fn test_report(outcomes: Vec<ScannerOutcome>) -> ScanReport {
        ScanReport {
            project_name: "demo".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            target: ".".to_string(),
            scanned_at: Utc::now(),
            custom_info: Value::Mapping(serde_yaml::Mapping::new()),
            outcomes,
        }
    }
}
