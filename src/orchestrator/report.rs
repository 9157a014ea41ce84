//! Per-node outcomes of a reload or restore operation.

use crate::core::{ProjectId, ProjectInfo};
use crate::graph::DiscoveryIssue;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// What happened to one claimed node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NodeStatus {
    /// The restore tool ran to completion (the exit code is not interpreted).
    Restored {
        /// Exit code of the restore tool
        exit_code: i32,
    },
    /// A step of the node's unit failed.
    Failed {
        /// Rendered error
        error: String,
    },
    /// The node was not attempted.
    Skipped {
        /// Why it was skipped
        reason: String,
    },
    /// The operation was cancelled before or while the node ran.
    Cancelled,
}

impl NodeStatus {
    /// Whether this status counts as a failure of the node.
    ///
    /// A completed restore with a non-zero exit code is a failure; a skip is
    /// not.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        match self {
            Self::Restored {
                exit_code,
            } => *exit_code != 0,
            Self::Failed {
                ..
            } => true,
            Self::Skipped {
                ..
            }
            | Self::Cancelled => false,
        }
    }

    /// Whether dependents of this node should be held back when failures
    /// escalate.
    #[must_use]
    pub const fn blocks_dependents(&self) -> bool {
        !matches!(
            self,
            Self::Restored {
                exit_code: 0
            }
        )
    }
}

/// Outcome of one node's unit of work.
#[derive(Debug, Clone, Serialize)]
pub struct NodeOutcome {
    /// Project identifier
    pub id: ProjectId,
    /// Display name
    pub name: String,
    /// Project file path
    pub path: PathBuf,
    /// Result of the unit
    #[serde(flatten)]
    pub status: NodeStatus,
    /// When the unit started
    pub started_at: DateTime<Utc>,
    /// Wall-clock time spent on the unit
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

impl NodeOutcome {
    /// Record `status` for the project described by `info`.
    pub fn new(
        info: &ProjectInfo,
        status: NodeStatus,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            id: info.id,
            name: info.name.clone(),
            path: info.path.clone(),
            status,
            started_at,
            duration,
        }
    }
}

/// A selected root that could not be processed at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootFailure {
    /// Root as given by the caller
    pub root: String,
    /// Rendered error
    pub error: String,
}

/// Counts over a report's outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    /// Restores that exited with code 0
    pub restored: usize,
    /// Failed units, including non-zero exits
    pub failed: usize,
    /// Nodes that were not attempted
    pub skipped: usize,
    /// Nodes cut short by cancellation
    pub cancelled: usize,
}

/// Result of one reload or restore operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReloadReport {
    /// Outcomes in processing order
    pub outcomes: Vec<NodeOutcome>,
    /// Discovery problems below the roots
    pub issues: Vec<DiscoveryIssue>,
    /// Roots that could not be discovered
    pub root_failures: Vec<RootFailure>,
    /// Whether the operation was cancelled
    pub cancelled: bool,
}

impl ReloadReport {
    /// Tally outcomes by status.
    #[must_use]
    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();
        for outcome in &self.outcomes {
            match &outcome.status {
                status if status.is_failure() => summary.failed += 1,
                NodeStatus::Restored {
                    ..
                } => summary.restored += 1,
                NodeStatus::Skipped {
                    ..
                } => summary.skipped += 1,
                NodeStatus::Cancelled => summary.cancelled += 1,
                NodeStatus::Failed {
                    ..
                } => summary.failed += 1,
            }
        }
        summary
    }

    /// Whether any node or root failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.root_failures.is_empty() || self.outcomes.iter().any(|o| o.status.is_failure())
    }

    /// Outcome recorded for `id`, if the node was claimed.
    #[must_use]
    pub fn outcome(&self, id: ProjectId) -> Option<&NodeOutcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }
}
