//! Structured diagnostics returned alongside every core operation.
//!
//! Topology building, structural validation, path discovery and record
//! normalisation never abort on bad data. They collect issues here instead,
//! so callers decide whether to halt a batch or surface warnings.
//!
//! Each issue carries a severity, a category (`"reference"`, `"cycle"`,
//! `"topology"`, `"path"`, `"sizing"`, `"parse"`...) and optionally the bus or
//! cable it concerns.
//!
//! # Example
//!
//! ```
//! use sceap_core::diagnostics::{Diagnostics, Severity};
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning_with_entity("topology", "bus is not reachable from any root", "MCC-7");
//! diag.add_error("cycle", "circular bus reference");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert_eq!(diag.error_count(), 1);
//! assert_eq!(diag.summary(), "1 warning, 1 error");
//! ```

use serde::Serialize;

/// Severity level for diagnostic issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Unusual but the operation continued (defaulted value, incomplete path)
    Warning,
    /// An element was excluded or a structural rule is broken
    Error,
}

/// A single diagnostic issue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Category for grouping (e.g. "reference", "cycle", "path")
    pub category: String,
    /// Human-readable description
    pub message: String,
    /// Source row (1-based, for imported tables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    /// Bus or cable the issue refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DiagnosticIssue {
    pub fn new(
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            row: None,
            entity: None,
        }
    }

    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

impl std::fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };

        write!(f, "[{}:{}] {}", severity, self.category, self.message)?;

        if let Some(entity) = &self.entity {
            write!(f, " ({})", entity)?;
        }
        if let Some(row) = self.row {
            write!(f, " at row {}", row)?;
        }

        Ok(())
    }
}

/// Ordered collection of diagnostic issues for one operation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: DiagnosticIssue) {
        self.issues.push(issue);
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.add(DiagnosticIssue::new(Severity::Warning, category, message));
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.add(DiagnosticIssue::new(Severity::Warning, category, message).with_entity(entity));
    }

    pub fn add_warning_at_row(&mut self, category: &str, message: &str, row: usize) {
        self.add(DiagnosticIssue::new(Severity::Warning, category, message).with_row(row));
    }

    pub fn add_error(&mut self, category: &str, message: &str) {
        self.add(DiagnosticIssue::new(Severity::Error, category, message));
    }

    pub fn add_error_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.add(DiagnosticIssue::new(Severity::Error, category, message).with_entity(entity));
    }

    pub fn add_error_at_row(&mut self, category: &str, message: &str, row: usize) {
        self.add(DiagnosticIssue::new(Severity::Error, category, message).with_row(row));
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter()
    }

    /// Issues of one category, in insertion order
    pub fn issues_by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    /// Rendered issue lines, in insertion order
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.issues.extend(other.issues);
    }

    pub fn summary(&self) -> String {
        let plural = |n: usize| if n == 1 { "" } else { "s" };
        match (self.warning_count(), self.error_count()) {
            (0, 0) => "No issues".to_string(),
            (w, 0) => format!("{} warning{}", w, plural(w)),
            (0, e) => format!("{} error{}", e, plural(e)),
            (w, e) => format!("{} warning{}, {} error{}", w, plural(w), e, plural(e)),
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Diagnostics: {}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}

/// Counters kept while turning table rows into feeder records
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportStats {
    pub rows: usize,
    pub feeders: usize,
    pub skipped_rows: usize,
    pub defaulted_values: usize,
}

/// Import counters plus the issues raised while normalising rows
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportDiagnostics {
    pub stats: ImportStats,
    #[serde(flatten)]
    pub diagnostics: Diagnostics,
}

impl ImportDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a defaulted cell; bumps `defaulted_values`
    pub fn add_default(&mut self, message: &str, row: usize) {
        self.diagnostics.add_warning_at_row("default", message, row);
        self.stats.defaulted_values += 1;
    }

    /// Record a dropped row; bumps `skipped_rows`
    pub fn add_skipped(&mut self, message: &str, row: usize) {
        self.diagnostics.add_error_at_row("parse", message, row);
        self.stats.skipped_rows += 1;
    }

    pub fn summary(&self) -> String {
        format!(
            "{} rows, {} feeders, {} skipped, {} defaulted | {}",
            self.stats.rows,
            self.stats.feeders,
            self.stats.skipped_rows,
            self.stats.defaulted_values,
            self.diagnostics.summary()
        )
    }
}
