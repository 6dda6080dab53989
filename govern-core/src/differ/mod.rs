//! Structural compatibility checking between two package versions.
//!
//! The differ walks two type graphs side by side and classifies every
//! difference it finds as breaking (major) or additive (minor).
//!
//! # Features
//!
//! - **Recursive type identity**: basic kinds, arrays, slices, pointers,
//!   tuples, signatures, maps, channels and named types
//! - **Composite diffing**: exported struct fields and interface methods,
//!   with removals and additions told apart at every nesting level
//! - **Cycle guard**: self-referential and mutually recursive types terminate
//! - **Full reports**: every difference is collected, not just the first
//!
//! # Example
//!
//! ```
//! use govern_core::differ::{compare_scopes, Classification};
//! use govern_core::types::{BasicKind, Scope, Symbol, SymbolKind};
//!
//! let mut old = Scope::new();
//! let int = old.types.basic(BasicKind::Int);
//! old.insert(Symbol::new("Limit", true, SymbolKind::Variable, int)).unwrap();
//!
//! let mut new = old.clone();
//! let s = new.types.basic(BasicKind::String);
//! new.insert(Symbol::new("Name", true, SymbolKind::Variable, s)).unwrap();
//!
//! let report = compare_scopes(&old, &new);
//! assert_eq!(report.classification(), Classification::Minor);
//! ```

pub mod changes;
pub mod comparator;
mod composite;
pub mod guard;
pub mod scope;

pub use changes::{
    ChangeKind, Classification, Diagnostic, Diagnostics, Outcome, Report, ReportSummary, Severity,
};
pub use comparator::TypeComparator;
pub use guard::ComparisonPair;
pub use scope::{compare_packages, compare_scopes, explain_package_change, CompareOptions};
