//! Output formatting for the govern CLI.
//!
//! Every command result renders either as a human-readable table or as JSON.
//! Colors follow the TTY unless overridden by `--no-color` or the config.

use clap::ValueEnum;
use serde::Serialize;
use std::io::IsTerminal;
use std::str::FromStr;

mod json;

pub use self::json::JsonOutput;

/// Output format for CLI results
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format (default)
    #[default]
    Table,
    /// JSON format for machine consumption
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: '{}'", s)),
        }
    }
}

/// Configuration for output rendering
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Disable colored output
    pub no_color: bool,
    /// Compact mode (single-line JSON)
    pub compact: bool,
}

impl OutputConfig {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            no_color: false,
            compact: false,
        }
    }

    /// Detect color support from stdout, unless `color_override` decides it.
    pub fn auto_detect_with_color_override(
        format: OutputFormat,
        color_override: Option<bool>,
    ) -> Self {
        let use_color = color_override.unwrap_or_else(|| std::io::stdout().is_terminal());
        Self {
            no_color: !use_color,
            ..Self::new(format)
        }
    }

    pub fn use_colors(&self) -> bool {
        !self.no_color
    }

    /// Builder: enable compact mode
    pub fn compact(mut self) -> Self {
        self.compact = true;
        self
    }
}

/// Types that can be rendered in any supported format.
pub trait Outputter: Serialize + Sized {
    fn to_table(&self, config: &OutputConfig) -> String;

    fn to_json(&self, config: &OutputConfig) -> String {
        JsonOutput::format(self, config)
    }

    fn render(&self, config: &OutputConfig) -> String {
        match config.format {
            OutputFormat::Table => self.to_table(config),
            OutputFormat::Json => self.to_json(config),
        }
    }

    /// Render and print to stdout
    fn output(&self, config: &OutputConfig) {
        println!("{}", self.render(config));
    }
}

/// Result wrapper for formatted output
pub struct Output<'c, T> {
    data: T,
    config: &'c OutputConfig,
}

impl<'c, T: Outputter> Output<'c, T> {
    pub fn new(data: T, config: &'c OutputConfig) -> Self {
        Self { data, config }
    }

    /// Render the output to stdout
    pub fn render(&self) -> anyhow::Result<()> {
        self.data.output(self.config);
        Ok(())
    }
}
