//! Integration test suite for rtree
//!
//! End-to-end tests that drive the `rtree` binary against temporary
//! workspaces of project files. Restores use `sh` as the restore tool, so the
//! tests that spawn it only run on Unix.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! - **config**: `config` subcommands
//! - **reload**: dependency-ordered reload, dry runs and failure reporting
//! - **restore**: single-project restore
//! - **tree**: dependency tree output

#[path = "../common/mod.rs"]
mod common;

mod config;
#[cfg(unix)]
mod reload;
#[cfg(unix)]
mod restore;
mod tree;
