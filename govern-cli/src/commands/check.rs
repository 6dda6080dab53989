//! `govern check` - load a model and report whether it is well-formed.

use colored::Colorize;
use govern_core::SymbolKind;
use serde::Serialize;

use crate::model;
use crate::output::{Output, OutputConfig, Outputter};

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub source: String,
    pub package: String,
    pub symbols: usize,
    pub exported: usize,
    pub types: usize,
    pub by_kind: Vec<(String, usize)>,
    /// First structural problem found, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

impl Outputter for CheckResult {
    fn to_table(&self, _config: &OutputConfig) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} {} ({})\n",
            "CHECK:".cyan().bold(),
            self.package.bold(),
            self.source.dimmed()
        ));
        output.push_str(&format!(
            "  {} symbols, {} exported, {} types\n",
            self.symbols, self.exported, self.types
        ));
        for (kind, count) in &self.by_kind {
            output.push_str(&format!("  {:<10} {}\n", kind, count));
        }
        match &self.error {
            None => output.push_str(&format!("{}\n", "Model is well-formed.".green())),
            Some(e) => output.push_str(&format!("{} {}\n", "Malformed:".red().bold(), e)),
        }
        output
    }
}

const KINDS: [SymbolKind; 6] = [
    SymbolKind::Constant,
    SymbolKind::Variable,
    SymbolKind::Struct,
    SymbolKind::Interface,
    SymbolKind::Function,
    SymbolKind::Type,
];

/// Returns whether the model is well-formed.
pub fn run(path: &str, config: &OutputConfig) -> anyhow::Result<bool> {
    let loaded = model::load(path)?;
    let scope = &loaded.package.scope;

    let by_kind = KINDS
        .iter()
        .map(|kind| {
            let count = scope.exported().filter(|s| s.kind == *kind).count();
            (kind.as_str().to_string(), count)
        })
        .filter(|(_, count)| *count > 0)
        .collect();

    let result = CheckResult {
        source: loaded.source.clone(),
        package: loaded.package.name.clone(),
        symbols: scope.len(),
        exported: scope.exported().count(),
        types: scope.types.len(),
        by_kind,
        error: scope.validate().err().map(|e| e.to_string()),
    };
    let valid = result.is_valid();

    Output::new(result, config).render()?;
    Ok(valid)
}
