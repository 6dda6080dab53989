//! Package- and scope-level comparison.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::differ::changes::{ChangeKind, Diagnostic, Outcome, Report};
use crate::differ::comparator::TypeComparator;
use crate::types::{Package, Scope, Symbol};

/// Knobs for [`compare_packages`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareOptions {
    /// Treat a changed package name as a breaking change and stop there.
    pub check_package_name: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            check_package_name: true,
        }
    }
}

/// Compare two versions of a package.
///
/// Assumes the two versions are known to differ: an empty report means a
/// patch-level change, not "no change".
pub fn compare_packages(old: &Package, new: &Package, options: &CompareOptions) -> Report {
    if options.check_package_name && old.name != new.name {
        let mut report = Report::new();
        report.push(Diagnostic::new(
            ChangeKind::PackageRenamed,
            format!("package renamed: {:?} != {:?}", old.name, new.name),
        ));
        return report;
    }

    compare_scopes(&old.scope, &new.scope)
}

/// One-line explanation of the change between two package versions.
pub fn explain_package_change(old: &Package, new: &Package, options: &CompareOptions) -> String {
    compare_packages(old, new, options).explain()
}

/// Compare the exported symbols of two scopes.
///
/// Removed or unexported-in-new symbols are major, new exported symbols are
/// minor, and matched symbols are compared by type. Every symbol is visited
/// even when an earlier one is malformed.
pub fn compare_scopes(old: &Scope, new: &Scope) -> Report {
    let comparator = TypeComparator::new(&old.types, &new.types);
    let same_scope = std::ptr::eq(old, new);
    let mut report = Report::new();
    let mut matched: HashSet<&str> = HashSet::new();

    for old_symbol in old.exported() {
        let name = old_symbol.name.as_str();
        let new_symbol = match new.get(name) {
            Some(symbol) if symbol.exported => symbol,
            _ => {
                report.push(Diagnostic::new(
                    ChangeKind::DeclarationRemoved,
                    format!("{:?} removed", name),
                ));
                continue;
            }
        };
        matched.insert(name);

        if same_scope {
            continue;
        }

        let outcome = compare_symbols(&comparator, old, new, old_symbol, new_symbol);
        debug!(
            symbol = name,
            major = outcome.major,
            minor = outcome.minor,
            "compared symbol"
        );
        report.record(outcome);
    }

    for new_symbol in new.exported() {
        if !matched.contains(new_symbol.name.as_str()) {
            report.push(Diagnostic::new(
                ChangeKind::DeclarationAdded,
                format!("{:?} added", new_symbol.name),
            ));
        }
    }

    debug!(
        classification = report.classification().as_str(),
        diagnostics = report.diagnostics.len(),
        "scope comparison finished"
    );
    report
}

fn compare_symbols(
    comparator: &TypeComparator<'_>,
    old: &Scope,
    new: &Scope,
    old_symbol: &Symbol,
    new_symbol: &Symbol,
) -> Outcome {
    let context = format!("{:?} changed", old_symbol.name);

    if old_symbol.kind != new_symbol.kind {
        return Outcome::change(
            ChangeKind::DeclarationKindChanged,
            format!("{} -> {}", old_symbol.kind, new_symbol.kind),
        )
        .within(context);
    }

    let mut malformed = Outcome::identical();
    for (side, scope, symbol) in [("old", old, old_symbol), ("new", new, new_symbol)] {
        if let Some(problem) = symbol.shape_mismatch(&scope.types) {
            malformed.push(Diagnostic::new(
                ChangeKind::MalformedDeclaration,
                format!("{} {}", side, problem),
            ));
        }
    }
    if !malformed.is_identical() {
        return malformed.within(context);
    }

    comparator
        .compare(old_symbol.ty, new_symbol.ty, None)
        .within(context)
}
