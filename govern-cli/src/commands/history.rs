//! `govern history` - classify every step across a sequence of versions.
//!
//! Each consecutive pair is an independent comparison with its own guard
//! chain, so the steps run in parallel.

use std::time::Instant;

use colored::Colorize;
use govern_core::{compare_packages, Classification, CompareOptions, Report};
use rayon::prelude::*;
use serde::Serialize;

use super::compare::paint;
use crate::model::{self, LoadedModel};
use crate::output::{Output, OutputConfig, Outputter};

/// One consecutive pair in the history.
#[derive(Debug, Serialize)]
pub struct HistoryStep {
    pub from: String,
    pub to: String,
    pub classification: Classification,
    pub diagnostics: usize,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResult {
    pub steps: Vec<HistoryStep>,
    /// Strongest classification over all steps.
    pub overall: Classification,
    pub duration_ms: u64,
}

impl HistoryResult {
    fn from_reports(
        models: &[LoadedModel],
        reports: Vec<Report>,
        start_version: Option<semver::Version>,
    ) -> Self {
        let mut version = start_version;
        let steps: Vec<HistoryStep> = models
            .windows(2)
            .zip(reports)
            .map(|(pair, report)| {
                let classification = report.classification();
                version = version.as_ref().map(|v| classification.next_version(v));
                HistoryStep {
                    from: pair[0].source.clone(),
                    to: pair[1].source.clone(),
                    classification,
                    diagnostics: report.diagnostics.len(),
                    explanation: report.explain(),
                    version: version.as_ref().map(|v| v.to_string()),
                }
            })
            .collect();
        let overall = steps
            .iter()
            .map(|s| s.classification)
            .max()
            .unwrap_or(Classification::Patch);

        Self {
            steps,
            overall,
            duration_ms: 0,
        }
    }
}

impl Outputter for HistoryResult {
    fn to_table(&self, _config: &OutputConfig) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{} {} steps, overall {} ({}ms)\n",
            "HISTORY:".cyan().bold(),
            self.steps.len(),
            paint(self.overall),
            self.duration_ms
        ));
        output.push_str(&format!("{}\n", "-".repeat(60)));

        for step in &self.steps {
            let version = step
                .version
                .as_deref()
                .map(|v| format!(" {}", v.cyan()))
                .unwrap_or_default();
            output.push_str(&format!(
                "  {} -> {}  {}{}\n",
                step.from.yellow(),
                step.to.green(),
                paint(step.classification),
                version
            ));
            output.push_str(&format!("     {}\n", step.explanation.dimmed()));
        }

        output
    }
}

pub fn run(
    paths: &[String],
    start_version: Option<&str>,
    options: &CompareOptions,
    config: &OutputConfig,
) -> anyhow::Result<Classification> {
    let start = Instant::now();
    if paths.len() < 2 {
        anyhow::bail!("history needs at least two versions, got {}", paths.len());
    }
    let start_version = start_version.map(super::parse_version).transpose()?;

    let models = paths
        .par_iter()
        .map(|path| model::load(path))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let reports: Vec<Report> = models
        .par_windows(2)
        .map(|pair| compare_packages(&pair[0].package, &pair[1].package, options))
        .collect();

    let mut result = HistoryResult::from_reports(&models, reports, start_version);
    result.duration_ms = start.elapsed().as_millis() as u64;
    let overall = result.overall;

    Output::new(result, config).render()?;
    Ok(overall)
}

#[cfg(test)]
mod tests {
    use super::*;
    use govern_core::differ::{ChangeKind, Diagnostic};
    use govern_core::{Package, Scope};

    fn make_model(source: &str) -> LoadedModel {
        LoadedModel {
            source: source.to_string(),
            package: Package::new("geometry", Scope::new()),
        }
    }

    fn make_report(kind: Option<ChangeKind>) -> Report {
        let mut report = Report::new();
        if let Some(kind) = kind {
            report.push(Diagnostic::new(kind, "\"Area\" changed"));
        }
        report
    }

    #[test]
    fn test_versions_advance_per_step() {
        let models = vec![make_model("v1"), make_model("v2"), make_model("v3"), make_model("v4")];
        let reports = vec![
            make_report(Some(ChangeKind::DeclarationAdded)),
            make_report(None),
            make_report(Some(ChangeKind::DeclarationRemoved)),
        ];
        let start = semver::Version::new(1, 2, 3);

        let result = HistoryResult::from_reports(&models, reports, Some(start));

        let versions: Vec<_> = result.steps.iter().map(|s| s.version.clone().unwrap()).collect();
        assert_eq!(versions, vec!["1.3.0", "1.3.1", "2.0.0"]);
        assert_eq!(result.overall, Classification::Major);
        assert_eq!(result.steps[1].from, "v2");
        assert_eq!(result.steps[1].to, "v3");
        assert_eq!(result.steps[1].explanation, "patch: no exported changes");
    }

    #[test]
    fn test_overall_without_changes_is_patch() {
        let models = vec![make_model("v1"), make_model("v2")];
        let result = HistoryResult::from_reports(&models, vec![make_report(None)], None);
        assert_eq!(result.overall, Classification::Patch);
        assert!(result.steps[0].version.is_none());
    }
}
