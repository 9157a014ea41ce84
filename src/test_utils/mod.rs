//! Test utilities for restore-tree
//!
//! This module provides fakes for the environment and restore seams plus
//! on-disk fixtures, so orchestration can be tested without an IDE host or a
//! real restore tool.
//!
//! - [`FakeEnvironment`] - scriptable [`ProjectEnvironment`](crate::environment::ProjectEnvironment)
//! - [`RecordingRestorer`] - [`Restorer`](crate::restore::Restorer) that records calls
//! - [`RecordingSink`] - [`LogSink`](crate::sink::LogSink) that keeps lines
//! - [`WorkspaceFixture`] - a temporary directory of project files
//!
//! # Example
//!
//! ```rust,no_run
//! use restore_tree::test_utils::{FakeEnvironment, init_test_logging};
//!
//! init_test_logging(None);
//! let env = FakeEnvironment::new();
//! let app = env.add_project("App");
//! ```

pub mod environment;
pub mod fixtures;

pub use environment::FakeEnvironment;
pub use fixtures::{RecordingRestorer, RecordingSink, WorkspaceFixture};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `level` set, that level is used;
/// otherwise logging is enabled only when `RUST_LOG` is set.
///
/// ```bash
/// RUST_LOG=orchestrator=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
