//! Human-readable terminal renderer.

use colored::Colorize;

use super::{Level, Reporter, ScanReport, ScannerOutcome, classify, normalize};

pub struct TextReporter {
    verbose: bool,
}

impl TextReporter {
    pub fn new() -> Self {
        Self { verbose: false }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn level_label(&self, level: Level) -> colored::ColoredString {
        let label = format!("[{}]", level);
        match level {
            Level::Error => label.red().bold(),
            Level::Warning => label.yellow(),
            Level::Note => label.white(),
        }
    }

    fn status_label(&self, outcome: &ScannerOutcome) -> colored::ColoredString {
        if outcome.passed() {
            "PASSED".green().bold()
        } else if outcome.result.status.fatal() {
            "ERRORED".red().bold()
        } else {
            "FAILED".red().bold()
        }
    }

    fn format_outcome(&self, outcome: &ScannerOutcome, output: &mut String) {
        let required = if outcome.required { "" } else { " (not enforced)" };
        output.push_str(&format!(
            "{} {}{}\n",
            self.status_label(outcome),
            outcome.scanner.bold(),
            required.dimmed()
        ));

        if let Some(error) = &outcome.result.error {
            output.push_str(&format!("  {} {}\n", "error:".red(), error));
        }

        for raw in &outcome.result.issues {
            let issue = normalize(raw);
            output.push_str(&format!(
                "  {} {}: {}\n",
                self.level_label(classify(issue.cvss)),
                issue.id.cyan(),
                issue.name
            ));
            if self.verbose {
                for line in issue.details.lines() {
                    output.push_str(&format!("      {}\n", line.dimmed()));
                }
                if let Some(url) = &issue.url {
                    output.push_str(&format!("      {}\n", url.underline().dimmed()));
                }
            }
        }
    }
}

impl Default for TextReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for TextReporter {
    fn report(&self, report: &ScanReport) -> String {
        let mut output = String::new();

        let title = if report.project_name.is_empty() {
            report.target.clone()
        } else {
            report.project_name.clone()
        };
        output.push_str(&format!(
            "{} {} ({})\n\n",
            "Scan of".bold(),
            title.bold(),
            report.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        for outcome in &report.outcomes {
            self.format_outcome(outcome, &mut output);
        }

        let verdict = if report.passed() {
            "overall: PASSED".green().bold()
        } else {
            "overall: FAILED".red().bold()
        };
        output.push_str(&format!("\n{}\n", verdict));
        output
    }
}
