//! Configuration loading from `.governrc.toml`.
//!
//! The file is optional; govern uses defaults when it is missing or broken.
//!
//! # Example Configuration
//!
//! ```toml
//! [output]
//! format = "table"
//! color = true
//!
//! [compare]
//! fail_on = "major"
//! check_package_name = true
//! ```

use clap::ValueEnum;
use govern_core::{Classification, CompareOptions};
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILE: &str = ".governrc.toml";

/// Root configuration structure loaded from `.governrc.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct GovernConfig {
    /// Output formatting preferences.
    #[serde(default)]
    pub output: OutputSettings,

    /// Comparison and gating behavior.
    #[serde(default)]
    pub compare: CompareSettings,
}

/// Output formatting preferences.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Default output format: `table` or `json`.
    #[serde(default)]
    pub format: Option<String>,

    /// Force colors on or off. Unset means auto-detect.
    #[serde(default)]
    pub color: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CompareSettings {
    /// Lowest classification that makes `govern compare` exit non-zero.
    #[serde(default)]
    pub fail_on: FailOn,

    /// Report a renamed package as a single breaking change.
    #[serde(default = "default_check_package_name")]
    pub check_package_name: bool,
}

fn default_check_package_name() -> bool {
    true
}

impl Default for CompareSettings {
    fn default() -> Self {
        Self {
            fail_on: FailOn::default(),
            check_package_name: true,
        }
    }
}

/// Gate threshold for the exit code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailOn {
    #[default]
    Major,
    Minor,
    Never,
}

impl FailOn {
    /// Whether a change of this level should fail the run.
    pub fn trips(&self, classification: Classification) -> bool {
        match self {
            FailOn::Major => classification >= Classification::Major,
            FailOn::Minor => classification >= Classification::Minor,
            FailOn::Never => false,
        }
    }
}

impl GovernConfig {
    /// Load configuration from `.governrc.toml` in the given directory.
    ///
    /// Read and parse errors are logged as warnings and yield defaults.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse {}: {}", CONFIG_FILE, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", CONFIG_FILE, e);
                }
            }
        }
        Self::default()
    }

    /// Get the default output format, if configured.
    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    /// Configured color preference, `None` for auto-detection.
    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }

    pub fn fail_on(&self) -> FailOn {
        self.compare.fail_on
    }

    pub fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            check_package_name: self.compare.check_package_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = GovernConfig::default();
        assert!(config.default_format().is_none());
        assert!(config.use_color().is_none());
        assert_eq!(config.fail_on(), FailOn::Major);
        assert!(config.compare_options().check_package_name);
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[output]
format = "json"
color = false

[compare]
fail_on = "minor"
check_package_name = false
"#;
        let config: GovernConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.default_format(), Some("json"));
        assert_eq!(config.use_color(), Some(false));
        assert_eq!(config.fail_on(), FailOn::Minor);
        assert!(!config.compare_options().check_package_name);
    }

    #[test]
    fn test_partial_compare_section_keeps_defaults() {
        let config: GovernConfig = toml::from_str("[compare]\nfail_on = \"never\"\n").unwrap();
        assert_eq!(config.fail_on(), FailOn::Never);
        assert!(config.compare.check_package_name);
    }

    #[test]
    fn test_fail_on_thresholds() {
        assert!(FailOn::Major.trips(Classification::Major));
        assert!(!FailOn::Major.trips(Classification::Minor));
        assert!(FailOn::Minor.trips(Classification::Minor));
        assert!(FailOn::Minor.trips(Classification::Major));
        assert!(!FailOn::Minor.trips(Classification::Patch));
        assert!(!FailOn::Never.trips(Classification::Major));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = GovernConfig::load(dir.path());
        assert_eq!(config.fail_on(), FailOn::Major);
    }

    #[test]
    fn test_load_invalid_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[compare\nfail_on = 3").unwrap();
        let config = GovernConfig::load(dir.path());
        assert_eq!(config.fail_on(), FailOn::Major);
    }

    #[test]
    fn test_load_from_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[output]\nformat = \"json\"\n",
        )
        .unwrap();
        let config = GovernConfig::load(dir.path());
        assert_eq!(config.default_format(), Some("json"));
    }
}
