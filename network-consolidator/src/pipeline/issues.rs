//! Issue reporting.
//!
//! Recoverable problems found while consolidating are reported here rather
//! than returned as errors. The batch keeps going.

use serde::Serialize;
use std::fmt;
use tracing::{error, info, warn};

/// How bad an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    /// Data was kept, possibly adjusted.
    Warning,
    /// Data was dropped.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A record disagrees with an overlapping version already stored.
    Conflict,
    /// A record refers to something that does not exist.
    MissingReference,
    /// Validity calendars that should nest do not.
    CalendarInconsistency,
    /// A field could not be parsed.
    MalformedInput,
    /// Stop times were adjusted.
    TimeCorrection,
    /// A referenced entity was made up or taken from another period.
    Substitution,
    /// Part of a trip's geometry could not be reconstructed.
    GeometryGap,
}

/// Where an issue came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRef {
    pub file: String,
    /// Record description, e.g. `trip 105#3`.
    pub record: String,
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.record, self.file)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub kind: IssueKind,
    pub message: String,
    pub source: Option<SourceRef>,
}

impl Issue {
    pub fn new(severity: Severity, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn warning(kind: IssueKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, kind, message)
    }

    pub fn error(kind: IssueKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, kind, message)
    }

    pub fn with_source(mut self, source: SourceRef) -> Self {
        self.source = Some(source);
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(source) = &self.source {
            write!(f, " [{source}]")?;
        }
        Ok(())
    }
}

/// Sink for issues found during consolidation.
pub trait IssueLog {
    fn report(&mut self, issue: Issue);
}

/// Keeps every issue in memory.
#[derive(Debug, Default)]
pub struct CollectingLog {
    issues: Vec<Issue>,
}

impl CollectingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

impl IssueLog for CollectingLog {
    fn report(&mut self, issue: Issue) {
        self.issues.push(issue);
    }
}

/// Forwards issues to `tracing`, counting them by severity.
#[derive(Debug, Default)]
pub struct TracingLog {
    warnings: usize,
    errors: usize,
}

impl TracingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> usize {
        self.warnings
    }

    pub fn errors(&self) -> usize {
        self.errors
    }
}

impl IssueLog for TracingLog {
    fn report(&mut self, issue: Issue) {
        let kind = issue.kind;
        let source = issue.source.as_ref().map(ToString::to_string);
        let source = source.as_deref().unwrap_or("-");
        match issue.severity {
            Severity::Info => info!(kind = ?kind, source = %source, "{}", issue.message),
            Severity::Warning => {
                self.warnings += 1;
                warn!(kind = ?kind, source = %source, "{}", issue.message);
            }
            Severity::Error => {
                self.errors += 1;
                error!(kind = ?kind, source = %source, "{}", issue.message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SourceRef {
        SourceRef {
            file: "north.json".into(),
            record: "trip 105#3".into(),
        }
    }

    #[test]
    fn issue_display() {
        let issue = Issue::warning(IssueKind::Substitution, "route 105 taken from another period");
        assert_eq!(issue.to_string(), "warning: route 105 taken from another period");

        let issue = Issue::error(IssueKind::MissingReference, "graph 7 not found").with_source(source());
        assert_eq!(
            issue.to_string(),
            "error: graph 7 not found [trip 105#3 (north.json)]"
        );
    }

    #[test]
    fn collecting_log_filters() {
        let mut log = CollectingLog::new();
        log.report(Issue::warning(IssueKind::Conflict, "a"));
        log.report(Issue::error(IssueKind::MissingReference, "b"));
        log.report(Issue::warning(IssueKind::Conflict, "c"));

        assert_eq!(log.count(Severity::Warning), 2);
        assert_eq!(log.count(Severity::Error), 1);
        assert_eq!(log.of_kind(IssueKind::Conflict).count(), 2);
        assert_eq!(log.into_issues().len(), 3);
    }

    #[test]
    fn tracing_log_counts() {
        let mut log = TracingLog::new();
        log.report(Issue::new(Severity::Info, IssueKind::Substitution, "x"));
        log.report(Issue::warning(IssueKind::GeometryGap, "y").with_source(source()));
        log.report(Issue::error(IssueKind::MalformedInput, "z"));
        assert_eq!(log.warnings(), 1);
        assert_eq!(log.errors(), 1);
    }

    #[test]
    fn severity_orders_by_badness() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }
}
