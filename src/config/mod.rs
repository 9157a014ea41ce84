//! Configuration management for restore-tree
//!
//! restore-tree reads one optional user-wide TOML file,
//! `~/.restore-tree/config.toml` (`%LOCALAPPDATA%\restore-tree\config.toml` on
//! Windows). Its location can be overridden with the `RESTORE_TREE_CONFIG`
//! environment variable or the `--config` flag.
//!
//! Precedence, highest first:
//! 1. command-line flags (`--max-parallel`, `--timeout`, ...)
//! 2. the configuration file
//! 3. built-in defaults from [`constants`](crate::constants)

mod global;

pub use global::RestoreConfig;
