//! Filesystem helpers for path normalisation and directory cleanup.

use crate::core::{ReloadError, Result};
use std::path::{Component, Path, PathBuf};

/// Normalizes a path by resolving `.` and `..` components.
///
/// This performs logical resolution without touching the filesystem, the same
/// way the environment combines a project directory with a relative
/// dependency path. Symbolic links are not resolved.
///
/// # Examples
///
/// ```rust,no_run
/// use restore_tree::utils::fs::normalize_path;
/// use std::path::{Path, PathBuf};
///
/// let path = Path::new("/src/App/../Core/./Core.csproj");
/// assert_eq!(normalize_path(path), PathBuf::from("/src/Core/Core.csproj"));
/// ```
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                // `..` above the root stays at the root
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Resolve `relative` against `base_dir` into an absolute, normalised path.
///
/// An already-absolute `relative` is only normalised.
#[must_use]
pub fn resolve_relative(base_dir: &Path, relative: &Path) -> PathBuf {
    if relative.is_absolute() {
        normalize_path(relative)
    } else {
        normalize_path(&base_dir.join(relative))
    }
}

/// Recursively delete `dir` if it exists.
///
/// Returns `true` when a directory was removed. A path that exists but is not
/// a directory is left alone and reported as a cleanup error.
pub async fn remove_dir_if_exists(dir: &Path) -> Result<bool> {
    let metadata = match tokio::fs::metadata(dir).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => {
            return Err(ReloadError::Cleanup {
                path: dir.display().to_string(),
                reason: e.to_string(),
            });
        }
    };

    if !metadata.is_dir() {
        return Err(ReloadError::Cleanup {
            path: dir.display().to_string(),
            reason: "path exists but is not a directory".to_string(),
        });
    }

    tokio::fs::remove_dir_all(dir).await.map_err(|e| ReloadError::Cleanup {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })?;
    tracing::debug!(target: "restore", "Removed {}", dir.display());
    Ok(true)
}

/// Delete the build output directory `dir` of the project living in
/// `project_dir`.
///
/// Output locations come from project properties, so a value such as `.\` or
/// `..\` can point at the project directory or above it. Such a directory is
/// refused with a cleanup error and left untouched.
pub async fn remove_output_dir(dir: &Path, project_dir: &Path) -> Result<bool> {
    let dir = normalize_path(dir);
    if normalize_path(project_dir).starts_with(&dir) {
        return Err(ReloadError::Cleanup {
            path: dir.display().to_string(),
            reason: "directory contains the project itself".to_string(),
        });
    }
    remove_dir_if_exists(&dir).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_path_resolves_parent_components() {
        assert_eq!(
            normalize_path(Path::new("/work/App/../Core/./Core.csproj")),
            PathBuf::from("/work/Core/Core.csproj")
        );
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_path(Path::new("../a/./b")), PathBuf::from("../a/b"));
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve_relative(Path::new("/work/App"), Path::new("../Lib/Lib.csproj")),
            PathBuf::from("/work/Lib/Lib.csproj")
        );
        assert_eq!(
            resolve_relative(Path::new("/work/App"), Path::new("/abs/./X.csproj")),
            PathBuf::from("/abs/X.csproj")
        );
    }

    #[tokio::test]
    async fn test_remove_dir_if_exists() {
        let temp = TempDir::new().unwrap();
        let obj = temp.path().join("obj");
        std::fs::create_dir_all(obj.join("Debug")).unwrap();
        std::fs::write(obj.join("Debug/project.assets.json"), "{}").unwrap();

        assert!(remove_dir_if_exists(&obj).await.unwrap());
        assert!(!obj.exists());
        assert!(!remove_dir_if_exists(&obj).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_dir_if_exists_rejects_files() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("bin");
        std::fs::write(&file, "not a dir").unwrap();

        let err = remove_dir_if_exists(&file).await.unwrap_err();
        assert!(matches!(err, ReloadError::Cleanup { .. }));
        assert!(file.exists());
    }

    #[tokio::test]
    async fn test_remove_output_dir_refuses_project_dir_and_ancestors() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("src/App");
        std::fs::create_dir_all(project_dir.join("obj")).unwrap();
        std::fs::write(project_dir.join("App.csproj"), "<Project />").unwrap();

        for dir in [project_dir.join("."), project_dir.join(".."), project_dir.join("obj/..")] {
            let err = remove_output_dir(&dir, &project_dir).await.unwrap_err();
            assert!(matches!(err, ReloadError::Cleanup { .. }), "{} was not refused", dir.display());
        }
        assert!(project_dir.join("App.csproj").exists());

        assert!(remove_output_dir(&project_dir.join("obj"), &project_dir).await.unwrap());
        assert!(!project_dir.join("obj").exists());
    }
}
