pub mod cli;
pub mod config;
pub mod error;
pub mod report;
pub mod run;
pub mod scanner;

#[cfg(test)]
pub mod test_utils;

pub use cli::Cli;
pub use config::{
    ConfigError, ConfigFilter, ConfigResolver, ConfigSource, EffectiveConfig, FilterChain,
    ReportTarget, deep_merge,
};
pub use error::{Result, ScanError};
pub use report::{
    CanonicalIssue, Level, RawIssue, ReportFormat, Reporter, ScanReport, ScannerOutcome, classify,
    normalize, sarif::SarifReport,
};
pub use run::{execute_scanners, run_scan};
pub use scanner::{
    KNOWN_SCANNERS, RawScannerResult, Scanner, ScannerRegistry, ScannerStatus,
    pattern_search::PatternSearchScanner,
};
