//! Error types for govern-core.
//!
//! These cover building and validating package models. Differences found
//! while comparing two models are never errors; they are collected as
//! diagnostics in a [`Report`](crate::differ::Report).

use thiserror::Error;

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised while constructing or validating a package model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Two partial models of different packages were combined.
    #[error("package name mismatch: {left:?} != {right:?}")]
    PackageNameMismatch {
        /// Name of the receiving package.
        left: String,
        /// Name of the package being merged in.
        right: String,
    },

    /// A symbol name is declared twice in one scope.
    #[error("duplicate symbol: {name:?}")]
    DuplicateSymbol {
        /// The colliding name.
        name: String,
    },

    /// A scope entry is stored under a key other than its symbol's name.
    #[error("scope key {key:?} does not match symbol name {name:?}")]
    KeyMismatch { key: String, name: String },

    /// A struct declares the same exported field name twice.
    #[error("duplicate field {field:?} in struct type #{type_id}")]
    DuplicateField { type_id: usize, field: String },

    /// An interface declares the same method id twice.
    #[error("duplicate method {method:?} in interface type #{type_id}")]
    DuplicateMethod { type_id: usize, method: String },

    /// An operation that needs a named type was given another kind of node.
    #[error("type #{id} is not a named type")]
    NotNamed { id: usize },

    /// A type id points outside its arena.
    #[error("type #{id} referenced by {referrer} is not in the type table")]
    DanglingType { id: usize, referrer: String },

    /// A chain of named types that only points at other names and loops.
    #[error("named type #{id} never reaches a structural type")]
    NamedCycle { id: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ModelError::PackageNameMismatch {
            left: "multi".to_string(),
            right: "other".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "package name mismatch: \"multi\" != \"other\""
        );

        let err = ModelError::DuplicateField {
            type_id: 4,
            field: "Name".to_string(),
        };
        assert!(err.to_string().contains("#4"));
        assert!(err.to_string().contains("Name"));
    }
}
