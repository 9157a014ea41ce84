//! Capabilities the reload core consumes from its hosting environment.
//!
//! The orchestrator never talks to a concrete IDE or filesystem layout. It is
//! written against [`ProjectEnvironment`], which bundles the four capabilities
//! the core needs:
//!
//! - **Project directory**: [`describe`](ProjectEnvironment::describe) and
//!   [`dependencies`](ProjectEnvironment::dependencies) enumerate a project's
//!   identity and declared build dependencies
//! - **Handle resolver**: [`resolve`](ProjectEnvironment::resolve) maps an
//!   absolute project path back to a handle, if the project is known
//! - **Build configuration**: [`output_dirs`](ProjectEnvironment::output_dirs)
//!   reports where the project writes intermediate and final output
//! - **State mutator**: dirty tracking, save, unload and reload
//!
//! Mutating calls are always issued from the [`MainThread`](crate::main_thread::MainThread),
//! so implementations may assume they are never invoked concurrently with each
//! other.
//!
//! [`WorkspaceEnvironment`] implements the trait on top of MSBuild-style project
//! files found under a directory.

pub mod msbuild;
mod workspace;

pub use workspace::{WorkspaceEnvironment, WorkspaceHandle};

use crate::core::{ProjectId, ProjectInfo, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind tag of a declared dependency entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// A build-time reference to another project; the only kind that becomes
    /// an edge of the dependency graph.
    BuildProject,
    /// A package reference resolved by the restore tool itself.
    Package,
    /// Any other kind reported by the environment.
    Other(String),
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuildProject => write!(f, "project"),
            Self::Package => write!(f, "package"),
            Self::Other(kind) => write!(f, "{kind}"),
        }
    }
}

/// One entry of a project's declared dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEntry {
    /// What the entry refers to
    pub kind: DependencyKind,
    /// Canonical name as declared; for project references this is a path
    /// relative to the declaring project's directory.
    pub canonical_name: String,
}

impl DependencyEntry {
    /// A build-project reference to `relative_path`.
    pub fn project(relative_path: impl Into<String>) -> Self {
        Self {
            kind: DependencyKind::BuildProject,
            canonical_name: relative_path.into(),
        }
    }

    /// A package reference named `name`.
    pub fn package(name: impl Into<String>) -> Self {
        Self {
            kind: DependencyKind::Package,
            canonical_name: name.into(),
        }
    }

    /// Whether this entry is a build-project reference.
    #[must_use]
    pub fn is_build_project(&self) -> bool {
        self.kind == DependencyKind::BuildProject
    }
}

/// Answer of [`ProjectEnvironment::dependencies`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyListing {
    /// The project kind cannot enumerate dependencies.
    Unsupported,
    /// Declared entries in declaration order (possibly empty).
    Entries(Vec<DependencyEntry>),
}

/// Build output locations of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirs {
    /// `BaseIntermediateOutputPath`, absolute
    pub base_intermediate: PathBuf,
    /// `BaseOutputPath`, absolute
    pub base_output: PathBuf,
}

impl OutputDirs {
    /// Resolve (possibly relative) directory settings against `project_dir`.
    pub fn resolve(
        project_dir: &Path,
        intermediate: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Self {
        Self {
            base_intermediate: project_dir.join(intermediate),
            base_output: project_dir.join(output),
        }
    }
}

/// The environment capabilities consumed by discovery and orchestration.
///
/// All methods are synchronous: the core calls the read-only ones during
/// discovery and routes the mutating ones through the main thread.
pub trait ProjectEnvironment: Send + Sync + 'static {
    /// Opaque handle to one project inside the environment.
    type Handle: Clone + fmt::Debug + Send + Sync + 'static;

    /// Identity, name and path of the project behind `handle`.
    fn describe(&self, handle: &Self::Handle) -> Result<ProjectInfo>;

    /// Declared dependency entries of the project behind `handle`.
    fn dependencies(&self, handle: &Self::Handle) -> Result<DependencyListing>;

    /// Handle of the project stored at `path`, if the environment knows it.
    fn resolve(&self, path: &Path) -> Option<Self::Handle>;

    /// Intermediate/output directories from the project's build configuration.
    fn output_dirs(&self, handle: &Self::Handle) -> Result<OutputDirs>;

    /// Whether the project is currently loaded.
    fn is_loaded(&self, handle: &Self::Handle) -> bool;

    /// Whether the project has unsaved in-memory edits.
    fn is_dirty(&self, handle: &Self::Handle) -> Result<bool>;

    /// Persist unsaved edits.
    fn save(&self, handle: &Self::Handle) -> Result<()>;

    /// Remove the project from the environment's active set.
    fn unload(&self, id: ProjectId) -> Result<()>;

    /// Load a previously unloaded project again.
    ///
    /// Environments that reload lazily may keep the default no-op.
    fn reload(&self, id: ProjectId) -> Result<()> {
        let _ = id;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_entry_kinds() {
        assert!(DependencyEntry::project("../Lib/Lib.csproj").is_build_project());
        assert!(!DependencyEntry::package("Newtonsoft.Json").is_build_project());
        assert_eq!(DependencyKind::Other("com".into()).to_string(), "com");
    }

    #[test]
    fn test_output_dirs_resolve_relative_to_project() {
        let dirs = OutputDirs::resolve(Path::new("/work/App"), "obj", "../out/bin");
        assert_eq!(dirs.base_intermediate, PathBuf::from("/work/App/obj"));
        assert_eq!(dirs.base_output, PathBuf::from("/work/App/../out/bin"));
    }
}
