//! Dependency-aware reload of selected root projects.
//!
//! One [`ReloadOrchestrator::reload`] call is one user-triggered operation:
//!
//! 1. every selected root's dependency graph is discovered up front
//! 2. per root, the graph is flattened into a dependencies-first
//!    [`work_list`](worklist::work_list) filtered by the shared
//!    [`ReloadSession`], and every entry is claimed in list order
//! 3. the claimed nodes are partitioned into
//!    [`dependency_levels`](worklist::dependency_levels); each level runs
//!    concurrently (bounded by `max_parallel`) and must finish before the next
//!    level, and each root before the next root
//! 4. each claimed node is saved if dirty, unloaded, restored and optionally
//!    reloaded
//!
//! Failures are confined to the node they happen on and collected into a
//! [`ReloadReport`].

mod report;
pub mod worklist;

pub use report::{NodeOutcome, NodeStatus, ReloadReport, ReportSummary, RootFailure};

use crate::constants::default_max_parallel;
use crate::core::{ProjectId, ReloadError, Result};
use crate::environment::{OutputDirs, ProjectEnvironment};
use crate::graph::{DependencyGraphBuilder, ProjectGraph, ProjectNode};
use crate::main_thread::MainThread;
use crate::restore::{RestoreRequest, Restorer};
use crate::session::ReloadSession;
use crate::sink::LogSink;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use petgraph::graph::NodeIndex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Tuning knobs of one reload operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadOptions {
    /// Maximum number of nodes processed concurrently within a level
    pub max_parallel: usize,
    /// Skip nodes whose dependency failed earlier in the same operation
    pub escalate_failures: bool,
    /// Explicitly reload each project after its restore
    pub reload_after_restore: bool,
}

impl Default for ReloadOptions {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            escalate_failures: false,
            reload_after_restore: false,
        }
    }
}

/// Claimed work for one root, ready to execute.
#[derive(Debug)]
pub struct RootPlan<H> {
    /// The root's dependency graph
    pub graph: ProjectGraph<H>,
    /// Claimed nodes grouped into dependency levels
    pub levels: Vec<Vec<NodeIndex>>,
}

impl<H> RootPlan<H> {
    /// Number of claimed nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    /// Whether nothing was claimed for this root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(Vec::is_empty)
    }
}

/// Walks root projects dependencies-first and restores every node once.
pub struct ReloadOrchestrator<E: ProjectEnvironment> {
    environment: Arc<E>,
    restorer: Arc<dyn Restorer>,
    main_thread: MainThread,
    sink: Arc<dyn LogSink>,
    cancel: CancellationToken,
    options: ReloadOptions,
}

impl<E: ProjectEnvironment> ReloadOrchestrator<E> {
    /// Create an orchestrator with default options.
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
            cancel: CancellationToken::new(),
            options: ReloadOptions::default(),
        }
    }

    /// Replace the options.
    #[must_use]
    pub fn with_options(mut self, options: ReloadOptions) -> Self {
        self.options = options;
        self
    }

    /// Stop processing when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Discover every root's graph.
    ///
    /// Roots that cannot be described are returned as failures; the others
    /// keep their selection order.
    pub fn discover(
        &self,
        roots: &[E::Handle],
    ) -> (Vec<ProjectGraph<E::Handle>>, Vec<RootFailure>) {
        let builder = DependencyGraphBuilder::new(self.environment.as_ref());
        let mut graphs = Vec::with_capacity(roots.len());
        let mut failures = Vec::new();

        for root in roots {
            match builder.build(root) {
                Ok(graph) => graphs.push(graph),
                Err(e) => {
                    tracing::error!(target: "orchestrator", "Skipping root {root:?}: {e}");
                    failures.push(RootFailure {
                        root: format!("{root:?}"),
                        error: e.to_string(),
                    });
                }
            }
        }
        (graphs, failures)
    }

    /// Flatten `graph`, claim its work list in `session` and group the claimed
    /// nodes into levels.
    pub fn plan(
        &self,
        graph: ProjectGraph<E::Handle>,
        session: &ReloadSession,
    ) -> RootPlan<E::Handle> {
        let claimed: Vec<NodeIndex> = worklist::work_list(&graph, session)
            .into_iter()
            .filter(|index| session.try_process(graph.node(*index).id()))
            .collect();
        let levels = worklist::dependency_levels(&graph, &claimed);
        tracing::debug!(
            target: "orchestrator",
            "{}: {} projects claimed in {} levels",
            graph.node(graph.root()).name(),
            claimed.len(),
            levels.len()
        );
        RootPlan {
            graph,
            levels,
        }
    }

    /// Discover, plan and process every root.
    pub async fn reload(&self, roots: &[E::Handle]) -> ReloadReport {
        let session = ReloadSession::new();
        let mut report = ReloadReport::default();
        // Failures block dependents in later roots too
        let mut blocked: HashSet<ProjectId> = HashSet::new();

        let (graphs, failures) = self.discover(roots);
        report.root_failures = failures;
        for graph in &graphs {
            report.issues.extend(graph.issues().iter().cloned());
        }

        for graph in graphs {
            if self.cancel.is_cancelled() {
                tracing::info!(target: "orchestrator", "Cancelled, remaining roots not processed");
                break;
            }
            let plan = self.plan(graph, &session);
            self.run_plan(&plan, &mut blocked, &mut report).await;
        }

        report.cancelled = self.cancel.is_cancelled();
        let summary = report.summary();
        tracing::info!(
            target: "orchestrator",
            "Reload finished: {} restored, {} failed, {} skipped, {} cancelled",
            summary.restored,
            summary.failed,
            summary.skipped,
            summary.cancelled
        );
        report
    }

    async fn run_plan(
        &self,
        plan: &RootPlan<E::Handle>,
        blocked: &mut HashSet<ProjectId>,
        report: &mut ReloadReport,
    ) {
        let graph = &plan.graph;

        for (depth, level) in plan.levels.iter().enumerate() {
            tracing::debug!(
                target: "orchestrator",
                "{}: level {depth} with {} projects",
                graph.node(graph.root()).name(),
                level.len()
            );

            let units = level.iter().enumerate().map(|(position, &index)| {
                let node = graph.node(index);
                let dependency_failed = self.options.escalate_failures
                    && graph
                        .dependencies(index)
                        .iter()
                        .any(|dep| blocked.contains(&graph.node(*dep).id()));
                async move { (position, self.process_node(node, dependency_failed).await) }
            });
            let mut outcomes: Vec<(usize, NodeOutcome)> = stream::iter(units)
                .buffer_unordered(self.options.max_parallel.max(1))
                .collect()
                .await;
            outcomes.sort_by_key(|(position, _)| *position);

            for (_, outcome) in outcomes {
                if outcome.status.blocks_dependents() {
                    blocked.insert(outcome.id);
                }
                report.outcomes.push(outcome);
            }
        }
    }

    async fn process_node(&self, node: &ProjectNode<E::Handle>, dependency_failed: bool) -> NodeOutcome {
        let started_at = Utc::now();
        let start = Instant::now();

        let status = if self.cancel.is_cancelled() {
            NodeStatus::Cancelled
        } else if dependency_failed {
            tracing::info!(target: "orchestrator", "Skipping {}: a dependency failed", node.name());
            NodeStatus::Skipped {
                reason: "a dependency failed to restore".to_string(),
            }
        } else {
            match self.unload_and_restore(node).await {
                Ok(exit_code) => NodeStatus::Restored {
                    exit_code,
                },
                Err(ReloadError::Cancelled) => NodeStatus::Cancelled,
                Err(e) => {
                    tracing::error!(target: "orchestrator", "{}: {e}", node.name());
                    self.sink.append_line(&format!("Failed to reload {}: {e}", node.name()));
                    NodeStatus::Failed {
                        error: e.to_string(),
                    }
                }
            }
        };

        NodeOutcome::new(&node.info, status, started_at, start.elapsed())
    }

    async fn unload_and_restore(&self, node: &ProjectNode<E::Handle>) -> Result<i32> {
        let name = node.name().to_string();
        self.sink.append_line(&format!("Unloading {name}"));

        let env = Arc::clone(&self.environment);
        let handle = node.handle.clone();
        let id = node.id();
        let project = name.clone();
        let dirs = self
            .main_thread
            .run(move || -> Result<OutputDirs> {
                let dirty = env.is_dirty(&handle).map_err(|e| ReloadError::mutation("save", &project, e))?;
                if dirty {
                    tracing::debug!(target: "environment", "Saving {project} before unload");
                    env.save(&handle).map_err(|e| ReloadError::mutation("save", &project, e))?;
                }
                let dirs = env.output_dirs(&handle)?;
                env.unload(id).map_err(|e| ReloadError::mutation("unload", &project, e))?;
                Ok(dirs)
            })
            .await??;

        let request = RestoreRequest {
            project_name: name.clone(),
            project_path: node.info.path.clone(),
            dirs,
        };
        let exit_code = self.restorer.restore(&request).await?;

        if self.options.reload_after_restore {
            let env = Arc::clone(&self.environment);
            self.main_thread
                .run(move || env.reload(id).map_err(|e| ReloadError::mutation("reload", &name, e)))
                .await??;
        }

        Ok(exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeEnvironment, RecordingRestorer, RecordingSink};
    use std::time::Duration;

    struct Harness {
        env: Arc<FakeEnvironment>,
        restorer: Arc<RecordingRestorer>,
        sink: Arc<RecordingSink>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                env: Arc::new(FakeEnvironment::new()),
                restorer: Arc::new(RecordingRestorer::new()),
                sink: Arc::new(RecordingSink::new()),
            }
        }

        fn orchestrator(&self, options: ReloadOptions) -> ReloadOrchestrator<FakeEnvironment> {
            ReloadOrchestrator::new(
                Arc::clone(&self.env),
                self.restorer.clone(),
                MainThread::spawn().unwrap(),
                self.sink.clone(),
            )
            .with_options(options)
        }
    }

    fn options(max_parallel: usize) -> ReloadOptions {
        ReloadOptions {
            max_parallel,
            ..ReloadOptions::default()
        }
    }

    fn statuses(report: &ReloadReport) -> Vec<(String, NodeStatus)> {
        report.outcomes.iter().map(|o| (o.name.clone(), o.status.clone())).collect()
    }

    #[tokio::test]
    async fn test_diamond_processed_dependencies_first() {
        let h = Harness::new();
        let a = h.env.add_project("A");
        let b = h.env.add_project("B");
        let c = h.env.add_project("C");
        h.env.add_reference(a, b);
        h.env.add_reference(a, c);
        h.env.add_reference(c, b);

        let report = h.orchestrator(options(1)).reload(&[a]).await;

        assert_eq!(h.restorer.restored_names(), vec!["B", "C", "A"]);
        assert_eq!(h.env.calls(), vec!["unload B", "unload C", "unload A"]);
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn test_shared_dependency_claimed_once_across_roots() {
        let h = Harness::new();
        let x = h.env.add_project("X");
        let y = h.env.add_project("Y");
        let core = h.env.add_project("Core");
        h.env.add_reference(x, core);
        h.env.add_reference(y, core);

        let report = h.orchestrator(options(4)).reload(&[x, y, x]).await;

        assert_eq!(h.restorer.restored_names(), vec!["Core", "X", "Y"]);
        let ids: HashSet<ProjectId> = report.outcomes.iter().map(|o| o.id).collect();
        assert_eq!(ids.len(), report.outcomes.len());
    }

    #[tokio::test]
    async fn test_independent_leaf_roots_each_processed_once() {
        let h = Harness::new();
        let x = h.env.add_project("X");
        let y = h.env.add_project("Y");

        let report = h.orchestrator(options(2)).reload(&[x, y]).await;

        assert_eq!(report.outcomes.len(), 2);
        let mut names = h.restorer.restored_names();
        names.sort();
        assert_eq!(names, vec!["X", "Y"]);
    }

    #[tokio::test]
    async fn test_root_is_dependency_of_another_root() {
        let h = Harness::new();
        let app = h.env.add_project("App");
        let lib = h.env.add_project("Lib");
        h.env.add_reference(app, lib);

        h.orchestrator(options(2)).reload(&[lib, app]).await;

        assert_eq!(h.restorer.restored_names(), vec!["Lib", "App"]);
    }

    #[tokio::test]
    async fn test_level_barrier() {
        let h = Harness::new();
        let app = h.env.add_project("App");
        let deps: Vec<_> = (0..4).map(|i| h.env.add_project(&format!("L{i}"))).collect();
        for dep in &deps {
            h.env.add_reference(app, *dep);
        }
        h.restorer.set_delay(Duration::from_millis(30));

        h.orchestrator(options(4)).reload(&[app]).await;

        let events = h.restorer.events();
        let app_start = events.iter().position(|e| e == "start App").unwrap();
        for i in 0..4 {
            let end = events.iter().position(|e| e == &format!("end L{i}")).unwrap();
            assert!(end < app_start, "L{i} must finish before App starts: {events:?}");
        }
        assert!(h.restorer.max_concurrency() > 1);
    }

    #[tokio::test]
    async fn test_max_parallel_bounds_concurrency() {
        let h = Harness::new();
        let roots: Vec<_> = (0..6).map(|i| h.env.add_project(&format!("P{i}"))).collect();
        let app = h.env.add_project("App");
        for dep in &roots {
            h.env.add_reference(app, *dep);
        }
        h.restorer.set_delay(Duration::from_millis(20));

        h.orchestrator(options(2)).reload(&[app]).await;

        assert!(h.restorer.max_concurrency() <= 2);
        assert_eq!(h.restorer.restored_names().len(), 7);
    }

    #[tokio::test]
    async fn test_dirty_project_saved_before_unload() {
        let h = Harness::new();
        let app = h.env.add_project("App");
        h.env.set_dirty(app, true);

        h.orchestrator(options(1)).reload(&[app]).await;

        assert_eq!(h.env.calls(), vec!["save App", "unload App"]);
    }

    #[tokio::test]
    async fn test_mutations_run_on_main_thread() {
        let h = Harness::new();
        let app = h.env.add_project("App");
        let lib = h.env.add_project("Lib");
        h.env.add_reference(app, lib);
        h.env.set_dirty(app, true);

        let main_thread = MainThread::spawn().unwrap();
        h.env.expect_main_thread(main_thread.clone());
        ReloadOrchestrator::new(
            Arc::clone(&h.env),
            h.restorer.clone(),
            main_thread,
            h.sink.clone(),
        )
        .with_options(ReloadOptions {
            max_parallel: 2,
            reload_after_restore: true,
            ..ReloadOptions::default()
        })
        .reload(&[app])
        .await;

        assert_eq!(h.env.off_thread_mutations(), 0);
        assert_eq!(h.env.calls(), vec!["unload Lib", "reload Lib", "save App", "unload App", "reload App"]);
    }

    #[tokio::test]
    async fn test_unload_failure_is_isolated() {
        let h = Harness::new();
        let app = h.env.add_project("App");
        let bad = h.env.add_project("Bad");
        let good = h.env.add_project("Good");
        h.env.add_reference(app, bad);
        h.env.add_reference(app, good);
        h.env.fail_unload(bad);

        let report = h.orchestrator(options(2)).reload(&[app]).await;

        let statuses = statuses(&report);
        assert!(matches!(statuses[0], (ref n, NodeStatus::Failed { .. }) if n == "Bad"));
        assert_eq!(statuses[1], ("Good".to_string(), NodeStatus::Restored { exit_code: 0 }));
        assert_eq!(statuses[2], ("App".to_string(), NodeStatus::Restored { exit_code: 0 }));
        assert_eq!(h.restorer.restored_names(), vec!["Good", "App"]);
        assert!(report.has_failures());
        assert!(h.sink.lines().iter().any(|l| l.starts_with("Failed to reload Bad")));
    }

    #[tokio::test]
    async fn test_failures_do_not_escalate_by_default() {
        let h = Harness::new();
        let app = h.env.add_project("App");
        let lib = h.env.add_project("Lib");
        h.env.add_reference(app, lib);
        h.restorer.exit_code_for("Lib", 1);

        let report = h.orchestrator(options(1)).reload(&[app]).await;

        assert_eq!(h.restorer.restored_names(), vec!["Lib", "App"]);
        assert_eq!(report.summary().failed, 1);
    }

    #[tokio::test]
    async fn test_escalation_skips_dependents() {
        let h = Harness::new();
        let app = h.env.add_project("App");
        let mid = h.env.add_project("Mid");
        let lib = h.env.add_project("Lib");
        let other = h.env.add_project("Other");
        h.env.add_reference(app, mid);
        h.env.add_reference(app, other);
        h.env.add_reference(mid, lib);
        h.restorer.fail_for("Lib");

        let report = h
            .orchestrator(ReloadOptions {
                max_parallel: 1,
                escalate_failures: true,
                ..ReloadOptions::default()
            })
            .reload(&[app])
            .await;

        assert_eq!(h.restorer.restored_names(), vec!["Other"]);
        let mid_outcome = report.outcome(mid).unwrap();
        assert!(matches!(mid_outcome.status, NodeStatus::Skipped { .. }));
        let app_outcome = report.outcome(app).unwrap();
        assert!(matches!(app_outcome.status, NodeStatus::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_escalation_spans_roots() {
        let h = Harness::new();
        let app = h.env.add_project("App");
        let lib = h.env.add_project("Lib");
        h.env.add_reference(app, lib);
        h.restorer.fail_for("Lib");

        let report = h
            .orchestrator(ReloadOptions {
                max_parallel: 1,
                escalate_failures: true,
                ..ReloadOptions::default()
            })
            .reload(&[lib, app])
            .await;

        assert!(!h.restorer.restored_names().contains(&"App".to_string()));
        assert!(matches!(report.outcome(lib).unwrap().status, NodeStatus::Failed { .. }));
        assert!(matches!(report.outcome(app).unwrap().status, NodeStatus::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_cycle_processes_each_node_once() {
        let h = Harness::new();
        let a = h.env.add_project("A");
        let b = h.env.add_project("B");
        h.env.add_reference(a, b);
        h.env.add_reference(b, a);

        let report = h.orchestrator(options(2)).reload(&[a, b]).await;

        assert_eq!(h.restorer.restored_names(), vec!["B", "A"]);
        assert_eq!(report.outcomes.len(), 2);
    }

    #[tokio::test]
    async fn test_root_discovery_failure_does_not_stop_other_roots() {
        let h = Harness::new();
        let broken = h.env.add_project("Broken");
        let ok = h.env.add_project("Ok");
        h.env.fail_describe(broken);

        let report = h.orchestrator(options(1)).reload(&[broken, ok]).await;

        assert_eq!(report.root_failures.len(), 1);
        assert_eq!(h.restorer.restored_names(), vec!["Ok"]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_processes_nothing() {
        let h = Harness::new();
        let app = h.env.add_project("App");
        let token = CancellationToken::new();
        token.cancel();

        let report = h.orchestrator(options(1)).with_cancellation(token).reload(&[app]).await;

        assert!(report.cancelled);
        assert!(report.outcomes.is_empty());
        assert!(h.env.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_stops_later_levels() {
        let h = Harness::new();
        let app = h.env.add_project("App");
        let lib = h.env.add_project("Lib");
        h.env.add_reference(app, lib);
        let token = CancellationToken::new();
        h.restorer.cancel_after("Lib", token.clone());

        let report = h.orchestrator(options(1)).with_cancellation(token).reload(&[app]).await;

        assert!(report.cancelled);
        assert_eq!(report.outcome(app).unwrap().status, NodeStatus::Cancelled);
        assert_eq!(h.restorer.restored_names(), vec!["Lib"]);
    }

    #[tokio::test]
    async fn test_plan_claims_in_session() {
        let h = Harness::new();
        let app = h.env.add_project("App");
        let lib = h.env.add_project("Lib");
        h.env.add_reference(app, lib);
        let orchestrator = h.orchestrator(options(1));
        let session = ReloadSession::new();

        let (mut graphs, _) = orchestrator.discover(&[app]);
        let plan = orchestrator.plan(graphs.remove(0), &session);

        assert_eq!(plan.len(), 2);
        assert!(!session.can_process(&app));
        assert!(!session.can_process(&lib));
    }
}
