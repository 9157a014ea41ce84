//! The privileged thread on which environment mutations run.
//!
//! Hosting environments typically require that project state is only touched
//! from one designated thread. [`MainThread`] models that thread explicitly: a
//! dedicated OS thread drains a FIFO queue of closures, so every save, unload,
//! reload and log append runs there in submission order, while restore
//! processes are awaited on the async runtime without blocking it.

use crate::core::{ReloadError, Result};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::ThreadId;
use tokio::sync::{mpsc, oneshot};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle to the dispatcher thread.
///
/// Clones share the same thread. The thread exits once every handle has been
/// dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct MainThread {
    sender: mpsc::UnboundedSender<Job>,
    thread_id: ThreadId,
}

impl MainThread {
    /// Start the dispatcher thread.
    pub fn spawn() -> Result<Self> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let handle = std::thread::Builder::new()
            .name("restore-tree-main".to_string())
            .spawn(move || {
                while let Some(job) = receiver.blocking_recv() {
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        tracing::error!(target: "orchestrator", "Main thread job panicked");
                    }
                }
                tracing::trace!(target: "orchestrator", "Main thread dispatcher stopped");
            })?;

        Ok(Self {
            sender,
            thread_id: handle.thread().id(),
        })
    }

    /// Run `f` on the main thread and wait for its result.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (reply, result) = oneshot::channel();
        self.sender
            .send(Box::new(move || {
                let _ = reply.send(f());
            }))
            .map_err(|_| ReloadError::MainThreadClosed)?;
        // a dropped reply means the job panicked
        result.await.map_err(|_| ReloadError::MainThreadClosed)
    }

    /// Queue `f` on the main thread without waiting for it.
    pub fn post<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.sender.send(Box::new(f)).is_err() {
            tracing::trace!(target: "orchestrator", "Dropped job posted after shutdown");
        }
    }

    /// Wait until every job queued so far has run.
    pub async fn flush(&self) -> Result<()> {
        self.run(|| ()).await
    }

    /// Whether the caller is running on the main thread.
    #[must_use]
    pub fn is_current(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }
}
