//! govern core - structural API compatibility checking.
//!
//! Given two versions of a package's exported interface, decide whether the
//! change between them is breaking (major), additive (minor) or neither
//! (patch), and say why.
//!
//! The crate works purely on an in-memory model: [`types::Package`] values
//! built by a front end. It reads no files and runs no compiler.
//!
//! # Usage
//!
//! ```
//! use govern_core::{compare_packages, CompareOptions, Package};
//!
//! let old: Package = serde_json::from_str(r#"{ "name": "multi" }"#).unwrap();
//! let new = old.clone();
//!
//! let report = compare_packages(&old, &new, &CompareOptions::default());
//! assert_eq!(report.explain(), "patch: no exported changes");
//! ```

pub mod differ;
pub mod error;
pub mod types;

pub use differ::{
    compare_packages, compare_scopes, explain_package_change, Classification, CompareOptions,
    Diagnostic, Report,
};
pub use error::{ModelError, Result};
pub use types::{Package, Scope, Symbol, SymbolKind, TypeArena, TypeId, TypeNode};

/// Get the version of govern-core.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
