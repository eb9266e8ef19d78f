//! Scan orchestration: resolve configuration, execute the active scanner
//! set, and emit reports.

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use rayon::prelude::*;
use serde_yaml::Value;
use tracing::{info, warn};

use crate::cli::Cli;
use crate::config::{ConfigResolver, ConfigSource, EffectiveConfig, ReportTarget};
use crate::error::{Result, ScanError};
use crate::report::{ScanReport, ScannerOutcome};
use crate::scanner::{RawScannerResult, ScannerRegistry, ScannerStatus};

/// Full scan pipeline for one CLI invocation. Returns whether the scan
/// passed; report emission errors surface before the verdict.
pub fn run_scan(cli: &Cli) -> Result<bool> {
    if !cli.target.exists() {
        return Err(ScanError::TargetNotFound(cli.target.display().to_string()));
    }

    let mut paths = cli.config.clone();
    if paths.is_empty() {
        // Conventional in-repo config, picked up when no -c is given.
        let default = cli.target.join("polyscan.yaml");
        if default.is_file() {
            paths.push(default);
        }
    }

    let mut docs = Vec::with_capacity(paths.len());
    for path in &paths {
        docs.push(ConfigSource::Path(path.clone()).load()?);
    }

    let config = ConfigResolver::new()
        .with_ignore_ids(&cli.ignore_config_id)
        .with_env_substitution(!cli.no_env_substitution)
        .resolve(&docs)?;

    let registry = ScannerRegistry::builtin();
    let report = execute_scanners(&config, &registry, &cli.target);

    emit_reports(&report, &config, cli)?;
    Ok(report.passed())
}

/// Run every active scanner with a registered adapter, in parallel.
///
/// Outcomes keep the active set's order regardless of which scanner
/// finishes first, so report assembly stays deterministic. A panicking
/// adapter is recorded as an errored outcome rather than tearing down the
/// scan.
pub fn execute_scanners(
    config: &EffectiveConfig,
    registry: &ScannerRegistry,
    target: &Path,
) -> ScanReport {
    let mut report = ScanReport::new(config, target.display().to_string());

    let runnable: Vec<&str> = config
        .active_scanners
        .iter()
        .map(String::as_str)
        .filter(|name| {
            let registered = registry.get(name).is_some();
            if !registered {
                warn!(scanner = name, "No adapter registered, skipping");
            }
            registered
        })
        .collect();

    let empty = serde_yaml::Mapping::new();
    let outcomes: Vec<ScannerOutcome> = runnable
        .par_iter()
        .map(|&name| {
            let options = config.scanner_config(name).unwrap_or(&empty);
            let result = run_one(registry, name, target, options, config);
            ScannerOutcome {
                scanner: name.to_string(),
                required: config.is_enforced(name),
                result,
            }
        })
        .collect();

    for outcome in outcomes {
        info!(
            scanner = %outcome.scanner,
            passed = outcome.passed(),
            issues = outcome.result.issues.len(),
            "Scanner finished"
        );
        report.push(outcome);
    }
    report
}

fn run_one(
    registry: &ScannerRegistry,
    name: &str,
    target: &Path,
    options: &serde_yaml::Mapping,
    config: &EffectiveConfig,
) -> RawScannerResult {
    let Some(scanner) = registry.get(name) else {
        return RawScannerResult::errored("no adapter registered");
    };

    let mut result = panic::catch_unwind(AssertUnwindSafe(|| scanner.run(target, options)))
        .unwrap_or_else(|_| RawScannerResult::errored("scanner panicked"));

    // pass_on_raise: the scanner's inability to run is tolerated, its
    // error kept for the report.
    if result.status.fatal() && pass_on_raise(config, name) {
        warn!(scanner = name, error = ?result.error, "Scanner errored, tolerated by pass_on_raise");
        result.status = ScannerStatus::Passed;
    }
    result
}

fn pass_on_raise(config: &EffectiveConfig, scanner: &str) -> bool {
    config
        .scanner_option(scanner, "pass_on_raise")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Write the report to every configured destination, then to the CLI's
/// own output (file or stdout).
pub fn emit_reports(report: &ScanReport, config: &EffectiveConfig, cli: &Cli) -> Result<()> {
    for target in &config.reports {
        emit_target(report, target)?;
    }

    let rendered = report.render(cli.format, cli.verbose);
    match &cli.output {
        Some(path) => {
            fs::write(path, rendered).map_err(|e| ScanError::WriteReport {
                path: path.display().to_string(),
                source: e,
            })?;
            info!(path = %path.display(), "Report written");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn emit_target(report: &ScanReport, target: &ReportTarget) -> Result<()> {
    let path = match target.uri.strip_prefix("file://") {
        Some(stripped) => stripped,
        None if !target.uri.contains("://") => target.uri.as_str(),
        None => {
            warn!(uri = %target.uri, "Remote report destinations are not supported, skipping");
            return Ok(());
        }
    };

    let rendered = report.render(target.format, target.verbose);
    fs::write(path, rendered).map_err(|e| ScanError::WriteReport {
        path: path.to_string(),
        source: e,
    })?;
    info!(path, format = %target.format, "Report written");
    Ok(())
}
