//! Filesystem-backed environment over a directory of project files.
//!
//! [`WorkspaceEnvironment::discover`] scans a directory tree once and assigns
//! every project file a fresh [`ProjectId`]. Only discovered projects can be
//! resolved, which mirrors an IDE that only knows the projects of the open
//! solution: a `ProjectReference` pointing outside the workspace resolves to
//! nothing and is dropped by discovery.
//!
//! Load state lives in memory for the lifetime of the environment. Files on
//! disk are never dirty from this environment's point of view, so `save` is a
//! no-op.

use crate::constants::{DEFAULT_INTERMEDIATE_DIR, DEFAULT_OUTPUT_DIR, DEPENDENCY_AWARE_EXTENSIONS};
use crate::core::{ProjectId, ProjectInfo, ReloadError, Result};
use crate::environment::msbuild::{self, to_native_path};
use crate::environment::{DependencyListing, OutputDirs, ProjectEnvironment};
use crate::utils::fs::normalize_path;
use dashmap::DashSet;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories never descended into while scanning.
const SKIPPED_DIRS: &[&str] = &["bin", "obj", ".git", ".vs", "node_modules", "target"];

/// Handle of a project inside a [`WorkspaceEnvironment`]: its absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkspaceHandle(PathBuf);

impl WorkspaceHandle {
    /// Absolute path of the project file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for WorkspaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Projects found under a workspace root, with in-memory load state.
#[derive(Debug)]
pub struct WorkspaceEnvironment {
    root: PathBuf,
    projects: HashMap<PathBuf, ProjectInfo>,
    unloaded: DashSet<ProjectId>,
}

impl WorkspaceEnvironment {
    /// Scan `root` recursively for project files.
    ///
    /// Any file whose extension ends in `proj` is a project; only the
    /// extensions in [`DEPENDENCY_AWARE_EXTENSIONS`] can enumerate dependencies.
    pub fn discover(root: &Path) -> Result<Self> {
        let root = std::fs::canonicalize(root).map_err(|e| ReloadError::ProjectNotFound {
            path: format!("{} ({e})", root.display()),
        })?;

        let mut projects = HashMap::new();
        let walker = WalkDir::new(&root).follow_links(false).into_iter().filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && entry.depth() > 0
                && entry.file_name().to_str().is_some_and(|name| SKIPPED_DIRS.contains(&name)))
        });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(target: "environment", "Skipping unreadable entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_project_file(entry.path()) {
                continue;
            }

            let path = normalize_path(entry.path());
            let name = path
                .file_stem()
                .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());
            tracing::trace!(target: "environment", "Found project {}", path.display());
            projects.insert(path.clone(), ProjectInfo::new(ProjectId::new_v4(), name, path));
        }

        tracing::debug!(
            target: "environment",
            "Discovered {} projects under {}",
            projects.len(),
            root.display()
        );

        Ok(Self {
            root,
            projects,
            unloaded: DashSet::new(),
        })
    }

    /// The canonical workspace root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of discovered projects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Whether no projects were discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// All discovered projects, sorted by path.
    #[must_use]
    pub fn projects(&self) -> Vec<&ProjectInfo> {
        let mut projects: Vec<_> = self.projects.values().collect();
        projects.sort_by(|a, b| a.path.cmp(&b.path));
        projects
    }

    /// Handle for a user-supplied project path (relative to the current
    /// directory or absolute).
    pub fn handle_for(&self, path: &Path) -> Result<WorkspaceHandle> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        let absolute = std::fs::canonicalize(&absolute).unwrap_or_else(|_| normalize_path(&absolute));

        self.resolve(&absolute).ok_or_else(|| ReloadError::ProjectNotFound {
            path: path.display().to_string(),
        })
    }

    fn info(&self, handle: &WorkspaceHandle) -> Result<&ProjectInfo> {
        self.projects.get(handle.path()).ok_or_else(|| ReloadError::ProjectNotFound {
            path: handle.to_string(),
        })
    }

    fn read_project_file(&self, info: &ProjectInfo) -> Result<String> {
        std::fs::read_to_string(&info.path).map_err(|e| ReloadError::discovery(&info.name, e))
    }
}

fn is_project_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.len() > 4 && ext.to_ascii_lowercase().ends_with("proj"))
}

fn is_dependency_aware(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()).is_some_and(|ext| {
        DEPENDENCY_AWARE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext))
    })
}

impl ProjectEnvironment for WorkspaceEnvironment {
    type Handle = WorkspaceHandle;

    fn describe(&self, handle: &WorkspaceHandle) -> Result<ProjectInfo> {
        self.info(handle).cloned()
    }

    fn dependencies(&self, handle: &WorkspaceHandle) -> Result<DependencyListing> {
        let info = self.info(handle)?;
        if !is_dependency_aware(&info.path) {
            return Ok(DependencyListing::Unsupported);
        }

        let contents = self.read_project_file(info)?;
        let entries = msbuild::parse_dependencies(&contents)
            .into_iter()
            .map(|mut entry| {
                entry.canonical_name =
                    to_native_path(&entry.canonical_name).to_string_lossy().into_owned();
                entry
            })
            .collect();
        Ok(DependencyListing::Entries(entries))
    }

    fn resolve(&self, path: &Path) -> Option<WorkspaceHandle> {
        let path = normalize_path(path);
        self.projects.contains_key(&path).then(|| WorkspaceHandle(path))
    }

    fn output_dirs(&self, handle: &WorkspaceHandle) -> Result<OutputDirs> {
        let info = self.info(handle)?;
        let contents = if is_dependency_aware(&info.path) {
            self.read_project_file(info)?
        } else {
            String::new()
        };

        let intermediate = msbuild::read_property(&contents, "BaseIntermediateOutputPath")
            .unwrap_or_else(|| DEFAULT_INTERMEDIATE_DIR.to_string());
        let output = msbuild::read_property(&contents, "BaseOutputPath")
            .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string());

        let dirs =
            OutputDirs::resolve(info.directory(), to_native_path(&intermediate), to_native_path(&output));
        Ok(OutputDirs {
            base_intermediate: normalize_path(&dirs.base_intermediate),
            base_output: normalize_path(&dirs.base_output),
        })
    }

    fn is_loaded(&self, handle: &WorkspaceHandle) -> bool {
        self.info(handle).is_ok_and(|info| !self.unloaded.contains(&info.id))
    }

    fn is_dirty(&self, _handle: &WorkspaceHandle) -> Result<bool> {
        Ok(false)
    }

    fn save(&self, _handle: &WorkspaceHandle) -> Result<()> {
        Ok(())
    }

    fn unload(&self, id: ProjectId) -> Result<()> {
        if !self.projects.values().any(|info| info.id == id) {
            return Err(ReloadError::mutation("unload", id.to_string(), "unknown project id"));
        }
        self.unloaded.insert(id);
        tracing::debug!(target: "environment", "Unloaded {id}");
        Ok(())
    }

    fn reload(&self, id: ProjectId) -> Result<()> {
        if self.unloaded.remove(&id).is_some() {
            tracing::debug!(target: "environment", "Reloaded {id}");
        }
        Ok(())
    }
}
