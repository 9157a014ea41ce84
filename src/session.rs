//! Claim tracking for one user-triggered reload operation.
//!
//! A [`ReloadSession`] spans every root selected for one command invocation.
//! Each project may be claimed at most once; a project reachable from two
//! roots, or twice within one root's graph, is therefore processed once.
//!
//! Claims are backed by a concurrent hash set, so the check-then-insert of
//! [`try_process`](ReloadSession::try_process) is a single atomic operation
//! even when several traversals race for the same project.

use crate::core::ProjectId;
use dashmap::DashSet;

/// Set of projects already claimed within one operation.
///
/// Claims are permanent: there is no release operation.
#[derive(Debug, Default)]
pub struct ReloadSession {
    claimed: DashSet<ProjectId>,
}

impl ReloadSession {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` has not been claimed yet.
    ///
    /// This is a pure read; calling it any number of times never changes the
    /// session.
    #[must_use]
    pub fn can_process(&self, id: &ProjectId) -> bool {
        !self.claimed.contains(id)
    }

    /// Claim `id` for processing.
    ///
    /// Returns `true` if this call acquired the claim and `false` if a prior
    /// caller already holds it. Concurrent calls for the same id yield exactly
    /// one `true`.
    pub fn try_process(&self, id: ProjectId) -> bool {
        let acquired = self.claimed.insert(id);
        if acquired {
            tracing::trace!(target: "orchestrator", "Claimed {id}");
        }
        acquired
    }

    /// Number of claimed projects.
    #[must_use]
    pub fn claimed_count(&self) -> usize {
        self.claimed.len()
    }
}
