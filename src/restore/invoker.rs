//! Single-project restore without dependency traversal.

use crate::constants::DEFAULT_RESTORABLE_EXTENSIONS;
use crate::core::{ReloadError, Result};
use crate::environment::ProjectEnvironment;
use crate::main_thread::MainThread;
use crate::orchestrator::{NodeOutcome, NodeStatus, ReloadReport, RootFailure};
use crate::restore::{RestoreRequest, Restorer};
use crate::selection::can_restore_path;
use crate::sink::LogSink;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

/// Restores selected projects one after another.
///
/// Unlike the orchestrator, the invoker neither unloads the project nor walks
/// its dependencies; it only cleans the output directories, runs the restore
/// tool and reloads the project afterwards if the environment left it
/// unloaded.
pub struct RestoreInvoker<E: ProjectEnvironment> {
    environment: Arc<E>,
    restorer: Arc<dyn Restorer>,
    main_thread: MainThread,
    sink: Arc<dyn LogSink>,
    restorable_extensions: Vec<String>,
}

impl<E: ProjectEnvironment> RestoreInvoker<E> {
    /// Create an invoker restoring through `restorer`.
    pub fn new(
        environment: Arc<E>,
        restorer: Arc<dyn Restorer>,
        main_thread: MainThread,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            environment,
            restorer,
            main_thread,
            sink,
            restorable_extensions: DEFAULT_RESTORABLE_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Override which project file extensions may be restored.
    #[must_use]
    pub fn with_restorable_extensions(mut self, extensions: Vec<String>) -> Self {
        self.restorable_extensions = extensions;
        self
    }

    /// Restore one project.
    ///
    /// Returns an error only when the project cannot be described; every
    /// later problem is reported in the outcome.
    pub async fn restore(&self, handle: &E::Handle) -> Result<NodeOutcome> {
        let info = self.environment.describe(handle)?;
        let started_at = Utc::now();
        let start = Instant::now();

        if !info.path.is_file() {
            tracing::warn!(target: "restore", "Project file {} does not exist", info.path.display());
            let status = NodeStatus::Skipped {
                reason: "project file does not exist".to_string(),
            };
            return Ok(NodeOutcome::new(&info, status, started_at, start.elapsed()));
        }
        if !can_restore_path(&info.path, &self.restorable_extensions) {
            tracing::info!(target: "restore", "{} is not a restorable project", info.name);
            let status = NodeStatus::Skipped {
                reason: "project type cannot be restored".to_string(),
            };
            return Ok(NodeOutcome::new(&info, status, started_at, start.elapsed()));
        }

        let status = match self.restore_project(handle, &info.name, &info.path).await {
            Ok(exit_code) => NodeStatus::Restored {
                exit_code,
            },
            Err(ReloadError::Cancelled) => NodeStatus::Cancelled,
            Err(e) => {
                tracing::error!(target: "restore", "Restore of {} failed: {e}", info.name);
                self.sink.append_line(&format!("Restore of {} failed: {e}", info.name));
                NodeStatus::Failed {
                    error: e.to_string(),
                }
            }
        };
        Ok(NodeOutcome::new(&info, status, started_at, start.elapsed()))
    }

    /// Restore every handle in order.
    pub async fn restore_selected(&self, handles: &[E::Handle]) -> ReloadReport {
        let mut report = ReloadReport::default();
        for handle in handles {
            match self.restore(handle).await {
                Ok(outcome) => {
                    let cancelled = outcome.status == NodeStatus::Cancelled;
                    report.outcomes.push(outcome);
                    if cancelled {
                        report.cancelled = true;
                        break;
                    }
                }
                Err(e) => report.root_failures.push(RootFailure {
                    root: format!("{handle:?}"),
                    error: e.to_string(),
                }),
            }
        }
        report
    }

    async fn restore_project(
        &self,
        handle: &E::Handle,
        name: &str,
        path: &std::path::Path,
    ) -> Result<i32> {
        let env = Arc::clone(&self.environment);
        let config_handle = handle.clone();
        let dirs = self.main_thread.run(move || env.output_dirs(&config_handle)).await??;

        let request = RestoreRequest {
            project_name: name.to_string(),
            project_path: path.to_path_buf(),
            dirs,
        };
        let exit_code = self.restorer.restore(&request).await?;

        let env = Arc::clone(&self.environment);
        let reload_handle = handle.clone();
        let project = name.to_string();
        self.main_thread
            .run(move || -> Result<()> {
                if env.is_loaded(&reload_handle) {
                    return Ok(());
                }
                let id = env.describe(&reload_handle)?.id;
                env.reload(id).map_err(|e| ReloadError::mutation("reload", &project, e))
            })
            .await??;

        Ok(exit_code)
    }
}
