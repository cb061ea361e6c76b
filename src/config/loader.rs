//! Step definition loading.
//!
//! A definition file may `include:` other definition files. Included files
//! are resolved relative to the including file and each is read at most
//! once per load, so an include that was already seen is a no-op. The
//! steps of included files come first, in include order, followed by the
//! including file's own steps.

use crate::config::schema::{ActionConfig, CompletedCheck, StepConfig, StepDefinition};
use crate::error::{Result, StepwiseError};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// A definition with all includes resolved.
#[derive(Debug, Clone)]
pub struct LoadedDefinition {
    /// Merged definition (root metadata and settings, all steps).
    pub definition: StepDefinition,

    /// Directory of the root definition file; commands run here.
    pub base_dir: PathBuf,

    /// Every file that contributed, in load order.
    pub sources: Vec<PathBuf>,
}

/// Load a definition file and resolve its includes.
///
/// # Errors
///
/// Returns `DefinitionNotFound` if the file or any include doesn't exist.
/// Returns `DefinitionParseError` if any file is invalid YAML.
pub fn load_definition(path: &Path) -> Result<LoadedDefinition> {
    let root = canonical(path)?;
    let base_dir = root
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut seen = HashSet::new();
    let mut sources = Vec::new();
    let mut steps = Vec::new();

    let mut definition = load_definition_file(&root)?;
    seen.insert(root.clone());
    sources.push(root.clone());

    for include in &definition.include {
        let include_path = base_dir.join(include);
        collect_included(&include_path, &mut seen, &mut sources, &mut steps)?;
    }

    steps.append(&mut definition.steps);
    definition.steps = steps;

    tracing::debug!(
        "Loaded {} steps from {} file(s)",
        definition.steps.len(),
        sources.len()
    );

    Ok(LoadedDefinition {
        definition,
        base_dir,
        sources,
    })
}

fn collect_included(
    path: &Path,
    seen: &mut HashSet<PathBuf>,
    sources: &mut Vec<PathBuf>,
    steps: &mut Vec<StepConfig>,
) -> Result<()> {
    let path = canonical(path)?;
    if !seen.insert(path.clone()) {
        tracing::debug!("Skipping already included {}", path.display());
        return Ok(());
    }

    let definition = load_definition_file(&path)?;
    sources.push(path.clone());

    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    for include in &definition.include {
        collect_included(&dir.join(include), seen, sources, steps)?;
    }

    for mut step in definition.steps {
        rebase_paths(&mut step, &dir);
        steps.push(step);
    }

    Ok(())
}

/// Make relative file paths in an included step absolute against its own file.
fn rebase_paths(step: &mut StepConfig, dir: &Path) {
    match &mut step.action {
        ActionConfig::File { path, .. } if path.is_relative() => {
            *path = dir.join(&*path);
        }
        ActionConfig::Command {
            check: Some(check), ..
        } => rebase_check(check, dir),
        _ => {}
    }
}

fn rebase_check(check: &mut CompletedCheck, dir: &Path) {
    match check {
        CompletedCheck::FileExists { path } if Path::new(path.as_str()).is_relative() => {
            *path = dir.join(path.as_str()).to_string_lossy().into_owned();
        }
        CompletedCheck::All { checks } | CompletedCheck::Any { checks } => {
            for c in checks {
                rebase_check(c, dir);
            }
        }
        _ => {}
    }
}

fn canonical(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StepwiseError::DefinitionNotFound {
                path: path.to_path_buf(),
            }
        } else {
            StepwiseError::Io(e)
        }
    })
}

/// Load a single definition file without resolving includes.
///
/// # Errors
///
/// Returns `DefinitionNotFound` if the file doesn't exist.
/// Returns `DefinitionParseError` if the YAML is invalid.
pub fn load_definition_file(path: &Path) -> Result<StepDefinition> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StepwiseError::DefinitionNotFound {
                path: path.to_path_buf(),
            }
        } else {
            StepwiseError::Io(e)
        }
    })?;

    parse_definition(&content, path)
}

/// Parse YAML content into a StepDefinition.
///
/// # Arguments
///
/// * `content` - The YAML content to parse
/// * `source_path` - Path for error reporting
pub fn parse_definition(content: &str, source_path: &Path) -> Result<StepDefinition> {
    serde_yaml::from_str(content).map_err(|e| StepwiseError::DefinitionParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}
