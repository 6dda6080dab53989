//! Command implementations for the govern CLI.
//!
//! Each command module provides a `run` function that loads its models,
//! drives `govern-core` and renders the result.

pub mod check;
pub mod compare;
pub mod explain;
pub mod history;

use anyhow::{Context, Result};

/// Parse a `--current-version` style argument.
pub fn parse_version(raw: &str) -> Result<semver::Version> {
    semver::Version::parse(raw).with_context(|| format!("invalid version {:?}", raw))
}
