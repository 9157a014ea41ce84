//! User-visible log surfaces.
//!
//! Restore output and progress messages are appended line by line to a
//! [`LogSink`]. The CLI prints them to the terminal, library users can route
//! them into `tracing`, and [`DispatchingSink`] moves every append onto the
//! [`MainThread`] the way an IDE output pane requires.

use crate::main_thread::MainThread;
use colored::Colorize;
use std::sync::Arc;

/// Destination for restore output and progress lines.
pub trait LogSink: Send + Sync {
    /// Append one line. Must be safe to call any number of times.
    fn append_line(&self, line: &str);
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn append_line(&self, line: &str) {
        (**self).append_line(line);
    }
}

/// Emits each line as an `info` event with target `restore`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn append_line(&self, line: &str) {
        tracing::info!(target: "restore", "{line}");
    }
}

/// Prints each line to stdout, optionally dimmed.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink {
    dim: bool,
}

impl ConsoleSink {
    /// Console sink printing lines as-is.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dim: false,
        }
    }

    /// Console sink printing lines dimmed, to set tool output apart.
    #[must_use]
    pub const fn dimmed() -> Self {
        Self {
            dim: true,
        }
    }
}

impl LogSink for ConsoleSink {
    fn append_line(&self, line: &str) {
        if self.dim {
            println!("{}", line.dimmed());
        } else {
            println!("{line}");
        }
    }
}

/// Forwards appends to an inner sink on the main thread.
///
/// Appends are queued without waiting, so callers on the async runtime never
/// block on the sink; ordering between appends from one caller is preserved.
#[derive(Clone)]
pub struct DispatchingSink {
    inner: Arc<dyn LogSink>,
    main_thread: MainThread,
}

impl DispatchingSink {
    /// Wrap `inner` so it is only called on `main_thread`.
    pub fn new(inner: Arc<dyn LogSink>, main_thread: MainThread) -> Self {
        Self {
            inner,
            main_thread,
        }
    }
}

impl LogSink for DispatchingSink {
    fn append_line(&self, line: &str) {
        let inner = Arc::clone(&self.inner);
        let line = line.to_string();
        self.main_thread.post(move || inner.append_line(&line));
    }
}
