//! Project identity types shared by discovery, the session and the orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Stable unique identifier of a project within one environment session.
///
/// The identifier is the claim key of a [`ReloadSession`](crate::session::ReloadSession)
/// and the argument of [`ProjectEnvironment::unload`](crate::environment::ProjectEnvironment::unload).
/// Two handles that refer to the same project always describe to the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(Uuid);

impl ProjectId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0)
    }
}

/// Identity and location of one project as reported by the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Stable identifier
    pub id: ProjectId,
    /// Display name (usually the project file stem)
    pub name: String,
    /// Absolute path of the project file
    pub path: PathBuf,
}

impl ProjectInfo {
    /// Build a project description.
    pub fn new(id: ProjectId, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            name: name.into(),
            path: path.into(),
        }
    }

    /// Directory containing the project file.
    ///
    /// Relative dependency paths are resolved against this directory and the
    /// restore tool runs with it as working directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

impl fmt::Display for ProjectInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_id_display_is_braced_guid() {
        let id = ProjectId::from_uuid(Uuid::nil());
        assert_eq!(id.to_string(), "{00000000-0000-0000-0000-000000000000}");
    }

    #[test]
    fn test_project_ids_are_unique() {
        assert_ne!(ProjectId::new_v4(), ProjectId::new_v4());
    }

    #[test]
    fn test_directory_of_project() {
        let info = ProjectInfo::new(ProjectId::new_v4(), "App", "/src/App/App.csproj");
        assert_eq!(info.directory(), Path::new("/src/App"));
        assert_eq!(info.to_string(), "App");
    }
}
