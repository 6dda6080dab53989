//! Change taxonomy, per-comparison outcomes and the aggregated report.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// How a change affects consumers of the package.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Existing consumer code may stop compiling.
    Major,
    /// New exported capability only.
    Minor,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Major => "major",
            Severity::Minor => "minor",
        }
    }
}

/// Why a diagnostic was raised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    PackageRenamed,
    DeclarationRemoved,
    DeclarationKindChanged,
    TypeMismatch,
    ArrayLengthMismatch,
    ArityMismatch,
    VariadicMismatch,
    ChannelDirectionMismatch,
    FieldRemoved,
    FieldEmbeddingMismatch,
    FieldTagMismatch,
    MethodRemoved,
    MalformedType,
    MalformedDeclaration,
    DeclarationAdded,
    FieldAdded,
    MethodAdded,
}

impl ChangeKind {
    /// Fixed severity of each kind. Additions are the only minor kinds.
    pub fn severity(&self) -> Severity {
        match self {
            ChangeKind::DeclarationAdded | ChangeKind::FieldAdded | ChangeKind::MethodAdded => {
                Severity::Minor
            }
            ChangeKind::PackageRenamed
            | ChangeKind::DeclarationRemoved
            | ChangeKind::DeclarationKindChanged
            | ChangeKind::TypeMismatch
            | ChangeKind::ArrayLengthMismatch
            | ChangeKind::ArityMismatch
            | ChangeKind::VariadicMismatch
            | ChangeKind::ChannelDirectionMismatch
            | ChangeKind::FieldRemoved
            | ChangeKind::FieldEmbeddingMismatch
            | ChangeKind::FieldTagMismatch
            | ChangeKind::MethodRemoved
            | ChangeKind::MalformedType
            | ChangeKind::MalformedDeclaration => Severity::Major,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::PackageRenamed => "package_renamed",
            ChangeKind::DeclarationRemoved => "declaration_removed",
            ChangeKind::DeclarationKindChanged => "declaration_kind_changed",
            ChangeKind::TypeMismatch => "type_mismatch",
            ChangeKind::ArrayLengthMismatch => "array_length_mismatch",
            ChangeKind::ArityMismatch => "arity_mismatch",
            ChangeKind::VariadicMismatch => "variadic_mismatch",
            ChangeKind::ChannelDirectionMismatch => "channel_direction_mismatch",
            ChangeKind::FieldRemoved => "field_removed",
            ChangeKind::FieldEmbeddingMismatch => "field_embedding_mismatch",
            ChangeKind::FieldTagMismatch => "field_tag_mismatch",
            ChangeKind::MethodRemoved => "method_removed",
            ChangeKind::MalformedType => "malformed_type",
            ChangeKind::MalformedDeclaration => "malformed_declaration",
            ChangeKind::DeclarationAdded => "declaration_added",
            ChangeKind::FieldAdded => "field_added",
            ChangeKind::MethodAdded => "method_added",
        }
    }
}

/// A single reason found while comparing two versions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: ChangeKind,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic; the severity follows from the kind.
    pub fn new(kind: ChangeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message: message.into(),
        }
    }

    pub fn is_major(&self) -> bool {
        self.severity == Severity::Major
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Every diagnostic of a comparison as one error value.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{}", render_diagnostics(.0))]
pub struct Diagnostics(pub Vec<Diagnostic>);

fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut out = String::from("multiple changes:");
    for d in diagnostics {
        out.push_str(&format!("\n  {}: {}", d.severity.as_str(), d.message));
    }
    out
}

impl Diagnostics {
    /// `None` when there is nothing to report.
    pub fn err_or_none(diagnostics: Vec<Diagnostic>) -> Option<Self> {
        if diagnostics.is_empty() {
            None
        } else {
            Some(Diagnostics(diagnostics))
        }
    }
}

/// Result of comparing one pair of types.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub major: bool,
    pub minor: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl Outcome {
    /// No difference.
    pub fn identical() -> Self {
        Self::default()
    }

    /// A single-diagnostic outcome whose flag follows the kind's severity.
    pub fn change(kind: ChangeKind, message: impl Into<String>) -> Self {
        let mut outcome = Self::default();
        outcome.push(Diagnostic::new(kind, message));
        outcome
    }

    pub fn is_identical(&self) -> bool {
        !self.major && !self.minor && self.diagnostics.is_empty()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Major => self.major = true,
            Severity::Minor => self.minor = true,
        }
        self.diagnostics.push(diagnostic);
    }

    /// Fold another outcome into this one.
    pub fn merge(&mut self, other: Outcome) {
        self.major |= other.major;
        self.minor |= other.minor;
        self.diagnostics.extend(other.diagnostics);
    }

    /// Prefix every diagnostic message with where it was found.
    pub fn within(mut self, context: impl fmt::Display) -> Self {
        for d in &mut self.diagnostics {
            d.message = format!("{}: {}", context, d.message);
        }
        self
    }
}

/// Semantic-versioning level of a change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Patch,
    Minor,
    Major,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Patch => "patch",
            Classification::Minor => "minor",
            Classification::Major => "major",
        }
    }

    /// The version that follows `current` for a change of this level.
    pub fn next_version(&self, current: &semver::Version) -> semver::Version {
        match self {
            Classification::Major => semver::Version::new(current.major + 1, 0, 0),
            Classification::Minor => semver::Version::new(current.major, current.minor + 1, 0),
            Classification::Patch => {
                semver::Version::new(current.major, current.minor, current.patch + 1)
            }
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts of changes by family.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub declarations_added: u32,
    pub declarations_removed: u32,
    pub fields_added: u32,
    pub fields_removed: u32,
    pub methods_added: u32,
    pub methods_removed: u32,
    pub type_changes: u32,
    pub malformed: u32,
}

impl ReportSummary {
    /// Increment the counter for one diagnostic.
    pub fn record(&mut self, kind: ChangeKind) {
        match kind {
            ChangeKind::DeclarationAdded => self.declarations_added += 1,
            ChangeKind::DeclarationRemoved => self.declarations_removed += 1,
            ChangeKind::FieldAdded => self.fields_added += 1,
            ChangeKind::FieldRemoved => self.fields_removed += 1,
            ChangeKind::MethodAdded => self.methods_added += 1,
            ChangeKind::MethodRemoved => self.methods_removed += 1,
            ChangeKind::MalformedType | ChangeKind::MalformedDeclaration => self.malformed += 1,
            ChangeKind::PackageRenamed
            | ChangeKind::DeclarationKindChanged
            | ChangeKind::TypeMismatch
            | ChangeKind::ArrayLengthMismatch
            | ChangeKind::ArityMismatch
            | ChangeKind::VariadicMismatch
            | ChangeKind::ChannelDirectionMismatch
            | ChangeKind::FieldEmbeddingMismatch
            | ChangeKind::FieldTagMismatch => self.type_changes += 1,
        }
    }

    /// Generate human-readable summary string.
    pub fn text(&self) -> String {
        let mut parts = Vec::new();

        let families = [
            ("declarations", self.declarations_added, self.declarations_removed),
            ("fields", self.fields_added, self.fields_removed),
            ("methods", self.methods_added, self.methods_removed),
        ];
        for (label, added, removed) in families {
            if added == 0 && removed == 0 {
                continue;
            }
            let mut family_parts = Vec::new();
            if added > 0 {
                family_parts.push(format!("{} added", added));
            }
            if removed > 0 {
                family_parts.push(format!("{} removed", removed));
            }
            parts.push(format!("{}: {}", label, family_parts.join(", ")));
        }

        if self.type_changes > 0 {
            parts.push(format!("type changes: {}", self.type_changes));
        }
        if self.malformed > 0 {
            parts.push(format!("malformed: {}", self.malformed));
        }

        if parts.is_empty() {
            "No structural changes".to_string()
        } else {
            parts.join("; ")
        }
    }
}

/// Aggregated verdict for a whole scope comparison.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub major: bool,
    pub minor: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one comparison outcome into the report.
    pub fn record(&mut self, outcome: Outcome) {
        self.major |= outcome.major;
        self.minor |= outcome.minor;
        self.diagnostics.extend(outcome.diagnostics);
    }

    /// Add a single diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        let mut outcome = Outcome::identical();
        outcome.push(diagnostic);
        self.record(outcome);
    }

    /// Major beats minor beats patch.
    pub fn classification(&self) -> Classification {
        if self.major {
            Classification::Major
        } else if self.minor {
            Classification::Minor
        } else {
            Classification::Patch
        }
    }

    /// First diagnostic of the dominant severity.
    pub fn primary(&self) -> Option<&Diagnostic> {
        let wanted = match self.classification() {
            Classification::Major => Severity::Major,
            Classification::Minor => Severity::Minor,
            Classification::Patch => return self.diagnostics.first(),
        };
        self.diagnostics
            .iter()
            .find(|d| d.severity == wanted)
            .or_else(|| self.diagnostics.first())
    }

    /// One-line explanation: the classification and its primary reason.
    pub fn explain(&self) -> String {
        match self.primary() {
            Some(d) => format!("{}: {}", self.classification(), d.message),
            None => format!("{}: no exported changes", self.classification()),
        }
    }

    /// All diagnostics as one error, or `None` when there are none.
    pub fn errors(&self) -> Option<Diagnostics> {
        Diagnostics::err_or_none(self.diagnostics.clone())
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();
        for d in &self.diagnostics {
            summary.record(d.kind);
        }
        summary
    }

    pub fn major_changes(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_major())
    }

    pub fn filter_kind(&self, kind: ChangeKind) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.kind == kind).collect()
    }
}
