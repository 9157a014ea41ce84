//! restore-tree: dependency-aware restore and reload of project graphs.
//!
//! Restoring a project whose referenced projects are still loaded (or not yet
//! restored) produces stale build outputs. restore-tree treats a selection of
//! root projects as a dependency graph and processes it dependencies-first:
//! every project is saved if dirty, unloaded, cleaned, restored with an
//! external tool and reloaded. A project shared by several roots is processed
//! once per operation, and independent projects restore concurrently.
//!
//! # Architecture
//!
//! - [`environment`] - the host seam: describe, enumerate, save, unload and
//!   reload projects ([`ProjectEnvironment`](environment::ProjectEnvironment)),
//!   plus a directory-backed implementation reading MSBuild project files
//! - [`graph`] - per-root dependency graph discovery with shared nodes and
//!   cycle detection
//! - [`session`] - the per-operation claim set that makes processing
//!   exactly-once across roots
//! - [`orchestrator`] - work-list flattening, level scheduling and per-node
//!   processing into a [`ReloadReport`](orchestrator::ReloadReport)
//! - [`restore`] - the restore tool runner and the single-project restore
//! - [`main_thread`] - the affinity thread that owns every host mutation
//! - [`sink`] - destinations for restore tool output
//! - [`selection`] - predicates deciding whether a selection is actionable
//! - [`config`] - the optional TOML configuration file
//! - [`cli`] - the `rtree` command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use restore_tree::environment::WorkspaceEnvironment;
//! use restore_tree::main_thread::MainThread;
//! use restore_tree::orchestrator::ReloadOrchestrator;
//! use restore_tree::restore::ProcessRunner;
//! use restore_tree::sink::{LogSink, TracingSink};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let env = Arc::new(WorkspaceEnvironment::discover(Path::new("/src/solution"))?);
//! let app = env.handle_for(Path::new("/src/solution/App/App.csproj"))?;
//! let sink: Arc<dyn LogSink> = Arc::new(TracingSink);
//!
//! let orchestrator = ReloadOrchestrator::new(
//!     Arc::clone(&env),
//!     Arc::new(ProcessRunner::new(Arc::clone(&sink))),
//!     MainThread::spawn()?,
//!     sink,
//! );
//! let report = orchestrator.reload(&[app]).await;
//! println!("{} restored", report.summary().restored);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod environment;
pub mod graph;
pub mod main_thread;
pub mod orchestrator;
pub mod restore;
pub mod selection;
pub mod session;
pub mod sink;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
