//! Running the external restore tool.
//!
//! - [`ProcessRunner`] spawns the tool for one project and streams its output
//! - [`RestoreInvoker`] is the single-project entry point without traversal
//!
//! The orchestrator talks to the runner through the [`Restorer`] trait so the
//! scheduling logic can be exercised without spawning processes.

mod invoker;
mod runner;

pub use invoker::RestoreInvoker;
pub use runner::ProcessRunner;

use crate::core::Result;
use crate::environment::OutputDirs;
use async_trait::async_trait;
use std::path::PathBuf;

/// Everything needed to restore one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreRequest {
    /// Display name, used in log lines and errors
    pub project_name: String,
    /// Absolute path of the project file
    pub project_path: PathBuf,
    /// Directories deleted before the tool runs
    pub dirs: OutputDirs,
}

/// Something that can restore one project and report the tool's exit code.
#[async_trait]
pub trait Restorer: Send + Sync {
    /// Restore the project described by `request`.
    ///
    /// Returns the tool's exit code, which callers do not interpret beyond
    /// zero/non-zero.
    async fn restore(&self, request: &RestoreRequest) -> Result<i32>;
}
