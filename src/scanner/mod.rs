//! Scanner adapter boundary.
//!
//! Each adapter owns one scanner identity: given a target path and its
//! resolved option dictionary it produces a [`RawScannerResult`]. Adapters
//! for external tools live outside this crate; the registry simply skips
//! active identities with no registered adapter.

pub mod pattern_search;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use crate::report::RawIssue;

/// Every scanner identity this engine knows about. `active_scanners: all`
/// expands to exactly this set.
pub const KNOWN_SCANNERS: &[&str] = &[
    "BundleAudit",
    "CargoAudit",
    "NpmAudit",
    "YarnAudit",
    "PatternSearch",
    "SecretScan",
];

/// A group of package-manager-specific variants of one logical audit
/// capability. Their option dictionaries are consolidated under the
/// canonical key and mirrored back to every member.
pub struct AliasGroup {
    pub canonical: &'static str,
    /// Declaration order matters: later members win on option conflicts.
    pub members: &'static [&'static str],
}

pub const ALIAS_GROUPS: &[AliasGroup] = &[AliasGroup {
    canonical: "NodeAudit",
    members: &["NpmAudit", "YarnAudit"],
}];

/// Outcome of one scanner execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScannerStatus {
    /// Ran to completion with no findings.
    Passed,
    /// Ran to completion and found issues (recoverable failure).
    Failed,
    /// Could not run to completion (fatal failure).
    Errored,
}

impl ScannerStatus {
    pub fn passed(&self) -> bool {
        matches!(self, ScannerStatus::Passed)
    }

    pub fn fatal(&self) -> bool {
        matches!(self, ScannerStatus::Errored)
    }
}

/// Raw per-scanner payload: scanner-specific info, raw issue records, and
/// an execution status. Opaque to the core until normalization.
#[derive(Debug, Clone)]
pub struct RawScannerResult {
    pub info: Mapping,
    pub issues: Vec<RawIssue>,
    pub status: ScannerStatus,
    pub error: Option<String>,
}

impl RawScannerResult {
    pub fn passed() -> Self {
        Self {
            info: Mapping::new(),
            issues: Vec::new(),
            status: ScannerStatus::Passed,
            error: None,
        }
    }

    /// Completed scan; status derives from whether issues were found.
    pub fn completed(issues: Vec<RawIssue>) -> Self {
        let status = if issues.is_empty() {
            ScannerStatus::Passed
        } else {
            ScannerStatus::Failed
        };
        Self {
            info: Mapping::new(),
            issues,
            status,
            error: None,
        }
    }

    pub fn errored(message: impl Into<String>) -> Self {
        Self {
            info: Mapping::new(),
            issues: Vec::new(),
            status: ScannerStatus::Errored,
            error: Some(message.into()),
        }
    }

    pub fn with_info(mut self, info: Mapping) -> Self {
        self.info = info;
        self
    }
}

/// One pluggable scanning capability.
pub trait Scanner: Send + Sync {
    fn identity(&self) -> &'static str;

    /// Run against `target` with the scanner's resolved option dictionary.
    /// Failures are reported through the returned status, never panics.
    fn run(&self, target: &Path, config: &Mapping) -> RawScannerResult;
}

/// Registry of adapters, keyed by scanner identity.
#[derive(Default)]
pub struct ScannerRegistry {
    scanners: BTreeMap<&'static str, Box<dyn Scanner>>,
}

impl ScannerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the adapters built into this crate.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(pattern_search::PatternSearchScanner::new()));
        registry
    }

    pub fn register(&mut self, scanner: Box<dyn Scanner>) {
        self.scanners.insert(scanner.identity(), scanner);
    }

    pub fn get(&self, identity: &str) -> Option<&dyn Scanner> {
        self.scanners.get(identity).map(|s| s.as_ref())
    }

    pub fn identities(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.scanners.keys().copied()
    }
}
