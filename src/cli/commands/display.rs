//! Shared helpers for commands that read a definition.

use std::path::Path;

use crate::config::{load_definition, LoadedDefinition};
use crate::ui::UserInterface;

/// Load a definition, printing the error if it can't be read.
pub fn load_or_report(path: &Path, ui: &mut dyn UserInterface) -> Option<LoadedDefinition> {
    match load_definition(path) {
        Ok(loaded) => Some(loaded),
        Err(e) => {
            ui.error(&e.to_string());
            None
        }
    }
}

/// Display name of a definition: its `name`, else the file stem.
pub fn definition_title(loaded: &LoadedDefinition, path: &Path) -> String {
    loaded.definition.name.clone().unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stepwise".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_definition_is_reported() {
        let mut ui = MockUI::new();
        assert!(load_or_report(Path::new("/nonexistent/provision.yml"), &mut ui).is_none());
        assert!(ui.has_error("provision.yml"));
    }

    #[test]
    fn title_falls_back_to_file_stem() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("provision.yml");
        fs::write(&path, "steps: []\n").unwrap();

        let mut ui = MockUI::new();
        let loaded = load_or_report(&path, &mut ui).unwrap();
        assert_eq!(definition_title(&loaded, &path), "provision");
    }

    #[test]
    fn title_prefers_definition_name() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("provision.yml");
        fs::write(&path, "name: streambot-test-client\nsteps: []\n").unwrap();

        let mut ui = MockUI::new();
        let loaded = load_or_report(&path, &mut ui).unwrap();
        assert_eq!(definition_title(&loaded, &path), "streambot-test-client");
    }
}
