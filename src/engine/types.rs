//! Engine types
//!
//! Run configuration, per-group outcomes and the run report.

use crate::output::NamedTable;
use crate::tabular::CoercionReport;
use std::fmt;

/// Configuration for an export run
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Only run these groups; empty runs all
    pub groups: Vec<String>,
    /// Whether to run the augmentation fetch
    pub augment: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            augment: true,
        }
    }
}

impl ExportConfig {
    /// Create a new export config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the run to the named groups
    #[must_use]
    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    /// Enable or disable the augmentation fetch
    #[must_use]
    pub fn with_augmentation(mut self, augment: bool) -> Self {
        self.augment = augment;
        self
    }

    /// Whether a group is selected
    pub fn selects(&self, group: &str) -> bool {
        self.groups.is_empty() || self.groups.iter().any(|g| g == group)
    }
}

/// How one query group ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOutcome {
    /// The query matched nothing; no sheet
    Empty,
    /// A table was produced
    Exported {
        /// Data rows
        rows: usize,
        /// Columns
        columns: usize,
    },
    /// The group failed; other groups are unaffected
    Failed {
        /// What went wrong
        reason: String,
    },
}

impl GroupOutcome {
    /// Whether the group failed
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for GroupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "no records"),
            Self::Exported { rows, columns } => write!(f, "{rows} rows x {columns} columns"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Report for one query group
#[derive(Debug, Clone)]
pub struct GroupReport {
    /// Group name
    pub name: String,
    /// Documents fetched
    pub documents: usize,
    /// Outcome
    pub outcome: GroupOutcome,
}

/// How the augmentation step ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AugmentationOutcome {
    /// The step did not run
    Skipped {
        /// Why
        reason: String,
    },
    /// The service returned no records
    Empty,
    /// A table was produced
    Exported {
        /// Data rows
        rows: usize,
        /// Columns
        columns: usize,
    },
    /// The fetch failed; the sheet is omitted
    Failed {
        /// What went wrong
        reason: String,
    },
}

impl AugmentationOutcome {
    pub(crate) fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for AugmentationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped { reason } => write!(f, "skipped ({reason})"),
            Self::Empty => write!(f, "no records"),
            Self::Exported { rows, columns } => write!(f, "{rows} rows x {columns} columns"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Statistics from an export run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Groups run
    pub groups: usize,
    /// Data rows across all produced tables
    pub rows: usize,
    /// Failed groups plus a failed augmentation
    pub errors: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ExportStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group
    pub fn add_group(&mut self) {
        self.groups += 1;
    }

    /// Add rows
    pub fn add_rows(&mut self, count: usize) {
        self.rows += count;
    }

    /// Add an error
    pub fn add_error(&mut self) {
        self.errors += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

/// Everything a run reports besides its tables
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Per-group reports, in run order
    pub groups: Vec<GroupReport>,
    /// Augmentation outcome
    pub augmentation: AugmentationOutcome,
    /// Values coerced to strings across all groups
    pub coercion: CoercionReport,
    /// Totals
    pub stats: ExportStats,
}

impl ExportReport {
    /// One line per group, then one for the augmentation step
    pub fn summary(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .groups
            .iter()
            .map(|g| format!("{}: {} ({} documents)", g.name, g.outcome, g.documents))
            .collect();
        lines.push(format!("augmentation: {}", self.augmentation));
        lines
    }

    /// Whether every group that ran failed
    pub fn all_failed(&self) -> bool {
        !self.groups.is_empty() && self.groups.iter().all(|g| g.outcome.is_failed())
    }

    /// Report for a group
    pub fn group(&self, name: &str) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.name == name)
    }
}

/// Tables and report from one run
#[derive(Debug, Clone)]
pub struct ExportRun {
    /// Produced tables, in sheet order
    pub tables: Vec<NamedTable>,
    /// Run report
    pub report: ExportReport,
}
