//! Cross-platform utilities shared across restore-tree.
//!
//! - [`fs`] - lexical path normalisation and guarded output directory cleanup

pub mod fs;

pub use fs::{normalize_path, remove_dir_if_exists, remove_output_dir, resolve_relative};
