//! Managed file action.

use std::fs;
use std::path::{Path, PathBuf};

use super::{Action, ActionContext, ActionError, Outcome};

/// Keeps a file's content (and optionally its permission bits) in place.
#[derive(Debug, Clone)]
pub struct FileAction {
    path: PathBuf,
    content: String,
    mode: Option<u32>,
}

impl FileAction {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>, mode: Option<u32>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            mode,
        }
    }

    fn io_error(op: &'static str, path: &Path, source: std::io::Error) -> ActionError {
        ActionError::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(unix)]
fn current_mode(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .ok()
        .map(|m| m.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn current_mode(_path: &Path) -> Option<u32> {
    None
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

impl Action for FileAction {
    fn describe(&self) -> String {
        format!("write {}", self.path.display())
    }

    fn apply(&self, ctx: &ActionContext<'_>) -> Result<Outcome, ActionError> {
        let path = ctx.resolve(&self.path);
        let content_matches = fs::read(&path)
            .map(|existing| existing == self.content.as_bytes())
            .unwrap_or(false);
        let mode_matches = match self.mode {
            Some(mode) if cfg!(unix) => current_mode(&path) == Some(mode),
            _ => true,
        };

        if content_matches && mode_matches {
            return Ok(Outcome::satisfied_with(format!(
                "{} up to date",
                self.path.display()
            )));
        }

        if ctx.dry_run {
            return Ok(Outcome::applied_with(format!(
                "would write {}",
                self.path.display()
            )));
        }

        if !content_matches {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| Self::io_error("create directory", parent, e))?;
            }
            fs::write(&path, &self.content).map_err(|e| Self::io_error("write", &path, e))?;
        }

        if let Some(mode) = self.mode {
            set_mode(&path, mode).map_err(|e| Self::io_error("set mode on", &path, e))?;
        }

        let detail = if content_matches {
            format!("updated mode of {}", self.path.display())
        } else {
            format!("wrote {}", self.path.display())
        };
        Ok(Outcome::applied_with(detail))
    }
}
