//! Step definition loading, parsing, and validation.
//!
//! - Schema definitions in [`schema`]
//! - File loading and include resolution in [`loader`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use stepwise::config::{load_definition, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let path = temp.path().join("provision.yml");
//! fs::write(
//!     &path,
//!     "name: test\nsteps:\n  - name: hello\n    action: { type: command, command: 'echo hello' }\n",
//! )
//! .unwrap();
//!
//! let loaded = load_definition(&path).unwrap();
//! assert!(validate(&loaded.definition).is_empty());
//! assert_eq!(loaded.definition.name, Some("test".to_string()));
//! ```

pub mod loader;
pub mod schema;
pub mod validator;

pub use schema::{
    ActionConfig, CompletedCheck, PackageManager, ServiceManager, ServiceOperation, Settings,
    StepConfig, StepDefinition,
};

pub use loader::{load_definition, load_definition_file, parse_definition, LoadedDefinition};

pub use validator::{validate, validate_strict, ValidationError};

#[cfg(test)]
mod tests {
    #[test]
    fn serde_yaml_parses_step_lists_in_order() {
        let yaml = r#"
          steps:
            - name: first
            - name: second
        "#;
        let parsed: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed["steps"][0]["name"], "first");
        assert_eq!(parsed["steps"][1]["name"], "second");
    }
}
