//! `govern explain` - one line saying why a change has its classification.

use govern_core::{compare_packages, Classification, CompareOptions};
use serde::Serialize;

use crate::model;
use crate::output::{Output, OutputConfig, Outputter};

#[derive(Debug, Serialize)]
pub struct ExplainResult {
    pub classification: Classification,
    pub explanation: String,
}

impl Outputter for ExplainResult {
    fn to_table(&self, _config: &OutputConfig) -> String {
        self.explanation.clone()
    }
}

pub fn run(
    old_path: &str,
    new_path: &str,
    options: &CompareOptions,
    config: &OutputConfig,
) -> anyhow::Result<()> {
    let old = model::load(old_path)?;
    let new = model::load(new_path)?;

    let report = compare_packages(&old.package, &new.package, options);
    let result = ExplainResult {
        classification: report.classification(),
        explanation: report.explain(),
    };

    Output::new(result, config).render()
}
