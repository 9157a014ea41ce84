//! Global constants used throughout the restore-tree codebase.
//!
//! This module contains the restore tool defaults, timeouts, and parallelism
//! parameters shared by the runner, the orchestrator, and the CLI. Defining
//! them centrally keeps the defaults of [`RestoreConfig`](crate::config::RestoreConfig)
//! and the CLI help text in agreement.

use std::time::Duration;

/// Restore tool invoked for every project when no override is configured.
pub const DEFAULT_RESTORE_TOOL: &str = "dotnet";

/// Fixed flags passed to the restore tool ahead of the project path.
///
/// `-f` forces re-evaluation of every dependency and `--no-cache` bypasses
/// the HTTP cache, so each run is a clean restore.
pub const DEFAULT_RESTORE_ARGS: &[&str] = &["restore", "-f", "--no-cache"];

/// Intermediate output directory used when the project file does not set
/// `BaseIntermediateOutputPath`.
pub const DEFAULT_INTERMEDIATE_DIR: &str = "obj";

/// Output directory used when the project file does not set `BaseOutputPath`.
pub const DEFAULT_OUTPUT_DIR: &str = "bin";

/// Project file extensions the restore command accepts.
pub const DEFAULT_RESTORABLE_EXTENSIONS: &[&str] = &["csproj", "vbproj"];

/// Project file extensions whose `ProjectReference` items can be enumerated.
///
/// `.fsproj` files participate in the dependency graph even though the
/// single-project restore command does not offer them.
pub const DEPENDENCY_AWARE_EXTENSIONS: &[&str] = &["csproj", "vbproj", "fsproj"];

/// Default timeout for one restore process (10 minutes).
///
/// Restores usually take tens of seconds; the timeout only guards against a
/// tool that hangs waiting for credentials or a lock.
pub const DEFAULT_RESTORE_TIMEOUT: Duration = Duration::from_secs(600);

/// Prefix of the synthetic log line emitted after the restore tool exits.
pub const EXIT_CODE_LINE_PREFIX: &str = "Restore command exit code:";

/// How long output is still forwarded after the restore tool has exited.
///
/// Processes the tool leaves behind (build server nodes) can inherit its
/// output pipes and keep them open long after it exits.
pub const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Exit code reported when the restore process was terminated by a signal.
pub const SIGNAL_EXIT_CODE: i32 = -1;

/// Minimum number of parallel restores regardless of CPU count.
pub const MIN_PARALLELISM: usize = 1;

/// Divisor applied to the CPU core count for default parallelism.
///
/// Restores are CPU and disk heavy, so the default leaves half the cores free.
pub const PARALLELISM_CORE_DIVISOR: usize = 2;

/// Default CPU core count when detection fails.
pub const FALLBACK_CORE_COUNT: usize = 4;

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "RESTORE_TREE_CONFIG";

/// Default number of restores run concurrently within one dependency level.
pub fn default_max_parallel() -> usize {
    let cores =
        std::thread::available_parallelism().map(usize::from).unwrap_or(FALLBACK_CORE_COUNT);
    (cores / PARALLELISM_CORE_DIVISOR).max(MIN_PARALLELISM)
}
