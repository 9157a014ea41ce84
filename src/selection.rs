//! Rules deciding whether the reload and restore commands apply to a selection.

use std::path::{Path, PathBuf};

/// One selected item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedItem {
    /// Path of the selected item
    pub path: PathBuf,
    /// Whether the item is a project root (as opposed to a file or folder
    /// inside a project)
    pub is_project_root: bool,
    /// Whether the project is loaded; meaningless for non-roots
    pub loaded: bool,
}

impl SelectedItem {
    /// A selected project root.
    pub fn project(path: impl Into<PathBuf>, loaded: bool) -> Self {
        Self {
            path: path.into(),
            is_project_root: true,
            loaded,
        }
    }

    /// A selected item that is not a project root.
    pub fn other(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_project_root: false,
            loaded: false,
        }
    }
}

/// Reload applies when every selected item is a loaded project root.
#[must_use]
pub fn can_reload_selection(items: &[SelectedItem]) -> bool {
    !items.is_empty() && items.iter().all(|item| item.is_project_root && item.loaded)
}

/// Restore applies when every item is a project root and at least one of them
/// has a restorable extension.
#[must_use]
pub fn can_restore_selection<S: AsRef<str>>(items: &[SelectedItem], extensions: &[S]) -> bool {
    !items.is_empty()
        && items.iter().all(|item| item.is_project_root)
        && items.iter().any(|item| can_restore_path(&item.path, extensions))
}

/// Whether `path` ends in one of `extensions` (compared case-insensitively,
/// with or without a leading dot).
#[must_use]
pub fn can_restore_path<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions.iter().any(|candidate| {
        let candidate = candidate.as_ref();
        ext.eq_ignore_ascii_case(candidate.strip_prefix('.').unwrap_or(candidate))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTS: &[&str] = &["csproj", ".vbproj"];

    #[test]
    fn test_can_restore_path_is_case_insensitive() {
        assert!(can_restore_path(Path::new("/w/App/App.csproj"), EXTS));
        assert!(can_restore_path(Path::new("/w/App/App.CSPROJ"), EXTS));
        assert!(can_restore_path(Path::new("/w/Vb/Vb.vbproj"), EXTS));
        assert!(!can_restore_path(Path::new("/w/Fs/Fs.fsproj"), EXTS));
        assert!(!can_restore_path(Path::new("/w/README"), EXTS));
    }

    #[test]
    fn test_reload_requires_loaded_roots() {
        assert!(!can_reload_selection(&[]));
        assert!(can_reload_selection(&[
            SelectedItem::project("/w/A/A.csproj", true),
            SelectedItem::project("/w/B/B.fsproj", true),
        ]));
        assert!(!can_reload_selection(&[
            SelectedItem::project("/w/A/A.csproj", true),
            SelectedItem::project("/w/B/B.csproj", false),
        ]));
        assert!(!can_reload_selection(&[
            SelectedItem::project("/w/A/A.csproj", true),
            SelectedItem::other("/w/A/Program.cs"),
        ]));
    }

    #[test]
    fn test_restore_needs_one_restorable_root() {
        assert!(!can_restore_selection::<&str>(&[], EXTS));
        assert!(can_restore_selection(
            &[
                SelectedItem::project("/w/Fs/Fs.fsproj", true),
                SelectedItem::project("/w/A/A.csproj", false),
            ],
            EXTS
        ));
        assert!(!can_restore_selection(&[SelectedItem::project("/w/Fs/Fs.fsproj", true)], EXTS));
        assert!(!can_restore_selection(
            &[SelectedItem::project("/w/A/A.csproj", true), SelectedItem::other("/w/A/x.cs")],
            EXTS
        ));
    }
}
