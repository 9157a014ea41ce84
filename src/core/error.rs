//! Error handling for restore-tree
//!
//! This module provides the error taxonomy of the reload orchestrator and the
//! user-friendly error reporting used by the CLI. The error system follows two
//! principles:
//! 1. **Strongly-typed errors** so the orchestrator can isolate failures per node
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! - **Discovery**: [`ReloadError::Discovery`] - reading a project's dependency metadata failed
//! - **Process**: [`ReloadError::ProcessLaunch`], [`ReloadError::Timeout`] - the restore tool
//!   could not be started or did not finish in time
//! - **Environment**: [`ReloadError::EnvironmentMutation`] - save/unload/reload failed
//! - **Filesystem**: [`ReloadError::Cleanup`], [`ReloadError::Io`]
//! - **Input/Configuration**: [`ReloadError::ProjectNotFound`], [`ReloadError::ConfigError`]
//!
//! A dependency path that resolves to no known project is deliberately *not* an
//! error: discovery drops it and continues.
//!
//! # Examples
//!
//! ```rust,no_run
//! use restore_tree::core::{ErrorContext, ReloadError, user_friendly_error};
//!
//! let error = ReloadError::ProjectNotFound {
//!     path: "src/App/App.csproj".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Convenience alias for results produced by the orchestrator core.
pub type Result<T, E = ReloadError> = std::result::Result<T, E>;

/// The main error type for reload and restore operations.
///
/// Node-level variants ([`ProcessLaunch`], [`EnvironmentMutation`], [`Cleanup`],
/// [`Timeout`], [`Cancelled`]) end a single node's unit of work; the
/// orchestrator records them in the report and carries on with other nodes.
///
/// [`ProcessLaunch`]: ReloadError::ProcessLaunch
/// [`EnvironmentMutation`]: ReloadError::EnvironmentMutation
/// [`Cleanup`]: ReloadError::Cleanup
/// [`Timeout`]: ReloadError::Timeout
/// [`Cancelled`]: ReloadError::Cancelled
#[derive(Error, Debug)]
pub enum ReloadError {
    /// Reading a project's identity or dependency metadata failed.
    #[error("Failed to discover dependencies of '{project}': {reason}")]
    Discovery {
        /// Project name or path the failure relates to
        project: String,
        /// Underlying reason
        reason: String,
    },

    /// The restore tool could not be started.
    #[error("Failed to launch '{tool}' for '{project}': {reason}")]
    ProcessLaunch {
        /// Restore tool that was invoked
        tool: String,
        /// Project the restore was for
        project: String,
        /// Underlying reason
        reason: String,
    },

    /// The restore tool did not exit within the configured timeout.
    #[error("Restore of '{project}' timed out after {seconds} seconds")]
    Timeout {
        /// Project the restore was for
        project: String,
        /// Timeout that elapsed
        seconds: u64,
    },

    /// The operation was cancelled before or while the node was processed.
    #[error("Operation cancelled")]
    Cancelled,

    /// Saving, unloading or reloading a project in the environment failed.
    #[error("Failed to {operation} project '{project}': {reason}")]
    EnvironmentMutation {
        /// The mutation that failed ("save", "unload", "reload")
        operation: String,
        /// Project the mutation was applied to
        project: String,
        /// Underlying reason
        reason: String,
    },

    /// Deleting an intermediate or output directory failed.
    #[error("Failed to clean directory '{path}': {reason}")]
    Cleanup {
        /// Directory that could not be removed
        path: String,
        /// Underlying reason
        reason: String,
    },

    /// A project given on input is not known to the environment.
    #[error("Project not found: {path}")]
    ProjectNotFound {
        /// Path that was looked up
        path: String,
    },

    /// Configuration file problems.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// The privileged environment thread is gone.
    #[error("Main thread dispatcher has shut down")]
    MainThreadClosed,

    /// I/O error from the standard library.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for messages without a dedicated variant.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl Clone for ReloadError {
    fn clone(&self) -> Self {
        match self {
            Self::Discovery {
                project,
                reason,
            } => Self::Discovery {
                project: project.clone(),
                reason: reason.clone(),
            },
            Self::ProcessLaunch {
                tool,
                project,
                reason,
            } => Self::ProcessLaunch {
                tool: tool.clone(),
                project: project.clone(),
                reason: reason.clone(),
            },
            Self::Timeout {
                project,
                seconds,
            } => Self::Timeout {
                project: project.clone(),
                seconds: *seconds,
            },
            Self::Cancelled => Self::Cancelled,
            Self::EnvironmentMutation {
                operation,
                project,
                reason,
            } => Self::EnvironmentMutation {
                operation: operation.clone(),
                project: project.clone(),
                reason: reason.clone(),
            },
            Self::Cleanup {
                path,
                reason,
            } => Self::Cleanup {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::ProjectNotFound {
                path,
            } => Self::ProjectNotFound {
                path: path.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            Self::MainThreadClosed => Self::MainThreadClosed,
            // io::Error is not Clone; keep the message
            Self::Io(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

impl ReloadError {
    /// Shorthand for an [`EnvironmentMutation`](ReloadError::EnvironmentMutation) error.
    pub fn mutation(
        operation: impl Into<String>,
        project: impl Into<String>,
        reason: impl fmt::Display,
    ) -> Self {
        Self::EnvironmentMutation {
            operation: operation.into(),
            project: project.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for a [`Discovery`](ReloadError::Discovery) error.
    pub fn discovery(project: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Discovery {
            project: project.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true when the error is the result of cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Error wrapper that adds user-friendly suggestions and details.
///
/// The CLI converts every terminal error into an `ErrorContext` before
/// printing it, so the user sees what went wrong and what to try next.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ReloadError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: ReloadError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    ///
    /// Suggestions are displayed in green in the terminal.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    ///
    /// Details are displayed in yellow in the terminal.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// Known [`ReloadError`] variants get tailored suggestions; TOML errors are
/// treated as configuration problems; everything else keeps its full context
/// chain as the message.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(reload_error) = error.downcast_ref::<ReloadError>() {
        return create_error_context(reload_error.clone());
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(ReloadError::ConfigError {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of your restore-tree configuration file")
        .with_details("Run 'rtree config path' to see which file was loaded");
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>()
        && io_error.kind() == std::io::ErrorKind::PermissionDenied
    {
        return ErrorContext::new(ReloadError::Other {
            message: format!("{error:#}"),
        })
        .with_suggestion("Check file ownership of the project and its obj/bin directories");
    }

    ErrorContext::new(ReloadError::Other {
        message: format!("{error:#}"),
    })
}

fn create_error_context(error: ReloadError) -> ErrorContext {
    match &error {
        ReloadError::ProcessLaunch {
            tool,
            ..
        } => {
            let suggestion = format!("Install '{tool}' or set `tool` in the configuration file");
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("The restore tool must be on PATH or given as an absolute path")
        }
        ReloadError::Timeout {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Increase the timeout with --timeout or `restore_timeout_secs`")
            .with_details("The restore process was killed after the timeout elapsed"),
        ReloadError::ProjectNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check the project path, or point --workspace at the directory that contains it")
            .with_details("Only project files found under the workspace directory can be selected"),
        ReloadError::ConfigError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Run 'rtree config init --force' to write a fresh configuration file"),
        ReloadError::Cleanup {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Close programs holding files in the obj/bin directories and retry"),
        _ => ErrorContext::new(error),
    }
}
