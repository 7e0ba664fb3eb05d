use std::path::{Path, PathBuf};

/// Environment variable naming the workspace root.
pub const WORKSPACE_ENV: &str = "CREATOR_STUDIO_WORKSPACE";

/// Fallback workspace root, relative to the current directory.
pub const DEFAULT_WORKSPACE: &str = "workspace";

/// File name of the project document inside a project directory.
pub const PROJECT_FILE: &str = "project.json";

/// Process-level settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding project directories.
    pub workspace: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from(DEFAULT_WORKSPACE),
        }
    }
}

impl Settings {
    /// Read [`WORKSPACE_ENV`], falling back to [`DEFAULT_WORKSPACE`].
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var_os(k))
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<std::ffi::OsString>) -> Self {
        match lookup(WORKSPACE_ENV).filter(|v| !v.is_empty()) {
            Some(v) => Self {
                workspace: PathBuf::from(v),
            },
            None => Self::default(),
        }
    }

    /// Settings rooted at an explicit workspace.
    pub fn with_workspace(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
        }
    }

    /// Directory of `project`. Absolute paths are used as given.
    pub fn project_dir(&self, project: impl AsRef<Path>) -> PathBuf {
        self.workspace.join(project)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/settings.rs"]
mod tests;
