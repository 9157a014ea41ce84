//! In-memory [`ProjectEnvironment`] for orchestrator and discovery tests.

use crate::core::{ProjectId, ProjectInfo, ReloadError, Result};
use crate::environment::{DependencyEntry, DependencyListing, OutputDirs, ProjectEnvironment};
use crate::main_thread::MainThread;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

#[derive(Debug, Clone)]
struct FakeProject {
    info: ProjectInfo,
    entries: Vec<DependencyEntry>,
    unsupported: bool,
    fail_dependencies: bool,
    fail_describe: bool,
    fail_unload: bool,
    loaded: bool,
    dirty: bool,
}

/// Scriptable environment whose handles are plain [`ProjectId`]s.
///
/// Projects live at `<root>/<Name>/<Name>.<ext>`. References are stored the
/// way project files declare them: relative to the referencing project's
/// directory. Every mutation is recorded as `"<operation> <Name>"`.
///
/// # Example
///
/// ```rust,no_run
/// use restore_tree::test_utils::FakeEnvironment;
///
/// let env = FakeEnvironment::new();
/// let app = env.add_project("App");
/// let lib = env.add_project("Lib");
/// env.add_reference(app, lib);
/// env.set_dirty(app, true);
/// ```
pub struct FakeEnvironment {
    root: PathBuf,
    temp: Option<TempDir>,
    projects: Mutex<HashMap<ProjectId, FakeProject>>,
    calls: Mutex<Vec<String>>,
    main_thread: Mutex<Option<MainThread>>,
    off_thread_mutations: AtomicUsize,
}

impl Default for FakeEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEnvironment {
    /// Environment whose project files do not exist on disk.
    #[must_use]
    pub fn new() -> Self {
        Self::at(PathBuf::from("/fake-workspace"), None)
    }

    /// Environment that writes an empty project file for every project.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn with_files() -> Self {
        let temp = TempDir::new().expect("create temp workspace");
        Self::at(temp.path().to_path_buf(), Some(temp))
    }

    fn at(root: PathBuf, temp: Option<TempDir>) -> Self {
        Self {
            root,
            temp,
            projects: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            main_thread: Mutex::new(None),
            off_thread_mutations: AtomicUsize::new(0),
        }
    }

    /// Workspace root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Add a loaded, clean `.csproj` project.
    pub fn add_project(&self, name: &str) -> ProjectId {
        self.add_project_with_extension(name, "csproj")
    }

    /// Add a loaded, clean project with file extension `extension`.
    ///
    /// # Panics
    ///
    /// Panics if the project file cannot be written.
    pub fn add_project_with_extension(&self, name: &str, extension: &str) -> ProjectId {
        let dir = self.root.join(name);
        let path = dir.join(format!("{name}.{extension}"));
        if self.temp.is_some() {
            std::fs::create_dir_all(&dir).expect("create project dir");
            std::fs::write(&path, "<Project Sdk=\"Microsoft.NET.Sdk\" />\n")
                .expect("write project file");
        }

        let id = ProjectId::new_v4();
        let project = FakeProject {
            info: ProjectInfo::new(id, name, path),
            entries: Vec::new(),
            unsupported: false,
            fail_dependencies: false,
            fail_describe: false,
            fail_unload: false,
            loaded: true,
            dirty: false,
        };
        self.projects.lock().unwrap().insert(id, project);
        id
    }

    /// Declare that `from` references the project `to`.
    pub fn add_reference(&self, from: ProjectId, to: ProjectId) {
        let target = {
            let projects = self.projects.lock().unwrap();
            let to = &projects[&to].info;
            let file = to.path.file_name().map(|f| f.to_string_lossy().into_owned()).unwrap_or_default();
            format!("../{}/{file}", to.name)
        };
        self.update(from, |p| p.entries.push(DependencyEntry::project(target)));
    }

    /// Declare a project reference to a path no project lives at.
    pub fn add_dangling_reference(&self, from: ProjectId, relative_path: &str) {
        self.update(from, |p| p.entries.push(DependencyEntry::project(relative_path)));
    }

    /// Declare a package reference.
    pub fn add_package_reference(&self, from: ProjectId, package: &str) {
        self.update(from, |p| p.entries.push(DependencyEntry::package(package)));
    }

    /// Make dependency enumeration unsupported for `id`.
    pub fn set_unsupported(&self, id: ProjectId) {
        self.update(id, |p| p.unsupported = true);
    }

    /// Make dependency enumeration fail for `id`.
    pub fn fail_dependencies(&self, id: ProjectId) {
        self.update(id, |p| p.fail_dependencies = true);
    }

    /// Make describing `id` fail.
    pub fn fail_describe(&self, id: ProjectId) {
        self.update(id, |p| p.fail_describe = true);
    }

    /// Make unloading `id` fail.
    pub fn fail_unload(&self, id: ProjectId) {
        self.update(id, |p| p.fail_unload = true);
    }

    /// Set the load state of `id`.
    pub fn set_loaded(&self, id: ProjectId, loaded: bool) {
        self.update(id, |p| p.loaded = loaded);
    }

    /// Set whether `id` has unsaved edits.
    pub fn set_dirty(&self, id: ProjectId, dirty: bool) {
        self.update(id, |p| p.dirty = dirty);
    }

    /// Count mutations that do not run on `main_thread` from now on.
    pub fn expect_main_thread(&self, main_thread: MainThread) {
        *self.main_thread.lock().unwrap() = Some(main_thread);
    }

    /// Mutations observed off the expected main thread.
    #[must_use]
    pub fn off_thread_mutations(&self) -> usize {
        self.off_thread_mutations.load(Ordering::SeqCst)
    }

    /// Recorded mutations, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn update(&self, id: ProjectId, f: impl FnOnce(&mut FakeProject)) {
        let mut projects = self.projects.lock().unwrap();
        f(projects.get_mut(&id).expect("unknown fake project"));
    }

    fn project(&self, id: ProjectId) -> Result<FakeProject> {
        self.projects.lock().unwrap().get(&id).cloned().ok_or_else(|| ReloadError::ProjectNotFound {
            path: id.to_string(),
        })
    }

    fn record(&self, operation: &str, id: ProjectId) -> Result<()> {
        if let Some(main_thread) = self.main_thread.lock().unwrap().as_ref()
            && !main_thread.is_current()
        {
            self.off_thread_mutations.fetch_add(1, Ordering::SeqCst);
        }
        let project = self.project(id)?;
        self.calls.lock().unwrap().push(format!("{operation} {}", project.info.name));
        Ok(())
    }
}

impl ProjectEnvironment for FakeEnvironment {
    type Handle = ProjectId;

    fn describe(&self, handle: &ProjectId) -> Result<ProjectInfo> {
        let project = self.project(*handle)?;
        if project.fail_describe {
            return Err(ReloadError::Other {
                message: format!("cannot read properties of {}", project.info.name),
            });
        }
        Ok(project.info)
    }

    fn dependencies(&self, handle: &ProjectId) -> Result<DependencyListing> {
        let project = self.project(*handle)?;
        if project.fail_dependencies {
            return Err(ReloadError::discovery(&project.info.name, "project file is corrupt"));
        }
        if project.unsupported {
            return Ok(DependencyListing::Unsupported);
        }
        Ok(DependencyListing::Entries(project.entries))
    }

    fn resolve(&self, path: &Path) -> Option<ProjectId> {
        self.projects.lock().unwrap().values().find(|p| p.info.path == path).map(|p| p.info.id)
    }

    fn output_dirs(&self, handle: &ProjectId) -> Result<OutputDirs> {
        let project = self.project(*handle)?;
        Ok(OutputDirs::resolve(project.info.directory(), "obj", "bin"))
    }

    fn is_loaded(&self, handle: &ProjectId) -> bool {
        self.project(*handle).is_ok_and(|p| p.loaded)
    }

    fn is_dirty(&self, handle: &ProjectId) -> Result<bool> {
        Ok(self.project(*handle)?.dirty)
    }

    fn save(&self, handle: &ProjectId) -> Result<()> {
        self.record("save", *handle)?;
        self.update(*handle, |p| p.dirty = false);
        Ok(())
    }

    fn unload(&self, id: ProjectId) -> Result<()> {
        let project = self.project(id)?;
        if project.fail_unload {
            return Err(ReloadError::Other {
                message: "project is locked by another operation".to_string(),
            });
        }
        self.record("unload", id)?;
        self.update(id, |p| p.loaded = false);
        Ok(())
    }

    fn reload(&self, id: ProjectId) -> Result<()> {
        self.record("reload", id)?;
        self.update(id, |p| p.loaded = true);
        Ok(())
    }
}
