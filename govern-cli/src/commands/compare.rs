//! `govern compare` - classify the change between two package versions.

use std::time::Instant;

use colored::Colorize;
use govern_core::differ::ReportSummary;
use govern_core::{compare_packages, Classification, CompareOptions, Diagnostic, Report};
use serde::Serialize;
use tracing::info;

use crate::model;
use crate::output::{Output, OutputConfig, Outputter};

/// Result of comparing two model versions.
#[derive(Debug, Serialize)]
pub struct CompareResult {
    pub old: String,
    pub new: String,
    pub package: String,
    pub classification: Classification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_version: Option<String>,
    pub explanation: String,
    pub summary: ReportSummary,
    pub diagnostics: Vec<Diagnostic>,
    pub duration_ms: u64,
}

impl CompareResult {
    fn from_report(
        old: String,
        new: String,
        package: String,
        report: Report,
        current_version: Option<&semver::Version>,
    ) -> Self {
        let classification = report.classification();
        Self {
            old,
            new,
            package,
            classification,
            current_version: current_version.map(|v| v.to_string()),
            next_version: current_version.map(|v| classification.next_version(v).to_string()),
            explanation: report.explain(),
            summary: report.summary(),
            diagnostics: report.diagnostics,
            duration_ms: 0,
        }
    }
}

/// Colored label for a classification.
pub fn paint(classification: Classification) -> colored::ColoredString {
    let label = classification.as_str().to_uppercase();
    match classification {
        Classification::Major => label.red().bold(),
        Classification::Minor => label.yellow().bold(),
        Classification::Patch => label.green().bold(),
    }
}

impl Outputter for CompareResult {
    fn to_table(&self, _config: &OutputConfig) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{} {} {} -> {}\n",
            "COMPARE:".cyan().bold(),
            self.package.bold(),
            self.old.yellow(),
            self.new.green()
        ));
        output.push_str(&format!(
            "Classification: {} ({}ms)\n",
            paint(self.classification),
            self.duration_ms
        ));
        if let (Some(current), Some(next)) = (&self.current_version, &self.next_version) {
            output.push_str(&format!("Version: {} -> {}\n", current, next.cyan()));
        }
        output.push_str(&format!("Summary: {}\n", self.summary.text()));

        if self.diagnostics.is_empty() {
            output.push_str(&format!("\n{}\n", "No exported changes.".dimmed()));
            return output;
        }

        let (major, minor): (Vec<&Diagnostic>, Vec<&Diagnostic>) =
            self.diagnostics.iter().partition(|d| d.is_major());

        if !major.is_empty() {
            output.push_str(&format!("\n{}\n", "BREAKING CHANGES:".red().bold()));
            output.push_str(&format!("{}\n", "-".repeat(60)));
            for d in major {
                output.push_str(&format!(
                    "  {} {} {}\n",
                    "-".red(),
                    d.message,
                    format!("[{}]", d.kind.as_str()).dimmed()
                ));
            }
        }

        if !minor.is_empty() {
            output.push_str(&format!("\n{}\n", "ADDITIONS:".yellow().bold()));
            output.push_str(&format!("{}\n", "-".repeat(60)));
            for d in minor {
                output.push_str(&format!(
                    "  {} {} {}\n",
                    "+".green(),
                    d.message,
                    format!("[{}]", d.kind.as_str()).dimmed()
                ));
            }
        }

        output
    }
}

/// Compare two model paths and print the result.
///
/// Returns the classification so the caller can apply the exit-code gate.
pub fn run(
    old_path: &str,
    new_path: &str,
    current_version: Option<&str>,
    options: &CompareOptions,
    config: &OutputConfig,
) -> anyhow::Result<Classification> {
    let start = Instant::now();
    let current_version = current_version.map(super::parse_version).transpose()?;

    let old = model::load(old_path)?;
    let new = model::load(new_path)?;

    let report = compare_packages(&old.package, &new.package, options);
    let classification = report.classification();
    info!(
        "{}: {} diagnostics, {}",
        new.package.name,
        report.diagnostics.len(),
        classification
    );

    let mut result = CompareResult::from_report(
        old.source,
        new.source,
        new.package.name,
        report,
        current_version.as_ref(),
    );
    result.duration_ms = start.elapsed().as_millis() as u64;

    Output::new(result, config).render()?;
    Ok(classification)
}
