//! Core types for restore-tree
//!
//! This module holds the types every other module depends on:
//!
//! - [`ReloadError`] and [`ErrorContext`] - the error taxonomy and its
//!   user-facing presentation (see [`error`])
//! - [`ProjectId`] and [`ProjectInfo`] - the stable identity of a project as
//!   reported by the environment
//!
//! Library code returns [`Result`] with a [`ReloadError`]; the CLI wraps
//! failures with `anyhow` and renders them through [`user_friendly_error`].

pub mod error;
mod project;

pub use error::{ErrorContext, ReloadError, Result, user_friendly_error};
pub use project::{ProjectId, ProjectInfo};
