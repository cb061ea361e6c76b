//! Integration tests for definition loading and validation.

use std::fs;

use stepwise::config::{load_definition, validate, validate_strict, ActionConfig};
use stepwise::StepwiseError;
use tempfile::TempDir;

#[test]
fn includes_are_loaded_once_and_come_first() {
    let temp = TempDir::new().unwrap();
    let recipes = temp.path().join("recipes");
    fs::create_dir_all(&recipes).unwrap();

    fs::write(
        recipes.join("apt.yml"),
        "steps:\n  - name: pkgmgr-update\n    action: { type: package_update, manager: apt }\n",
    )
    .unwrap();
    fs::write(
        recipes.join("golang.yml"),
        r#"
include: [apt.yml]
steps:
  - name: install-runtime
    depends_on: [pkgmgr-update]
    action: { type: package, manager: apt, packages: [golang] }
"#,
    )
    .unwrap();
    fs::write(
        temp.path().join("stepwise.yml"),
        r#"
name: streambot-test-client
include: [recipes/apt.yml, recipes/golang.yml]
settings:
  continue_on_error: true
steps:
  - name: restart-service
    depends_on: [install-runtime]
    action: { type: service, service: statsd, operation: restart }
"#,
    )
    .unwrap();

    let loaded = load_definition(&temp.path().join("stepwise.yml")).unwrap();

    assert_eq!(
        loaded.definition.step_names(),
        vec!["pkgmgr-update", "install-runtime", "restart-service"]
    );
    assert_eq!(loaded.sources.len(), 3);
    assert!(loaded.definition.settings.continue_on_error);
    assert!(validate(&loaded.definition).is_empty());
}

#[test]
fn include_loop_terminates() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("a.yml"),
        "include: [b.yml]\nsteps:\n  - name: a\n    action: { type: command, command: 'true' }\n",
    )
    .unwrap();
    fs::write(
        temp.path().join("b.yml"),
        "include: [a.yml]\nsteps:\n  - name: b\n    action: { type: command, command: 'true' }\n",
    )
    .unwrap();

    let loaded = load_definition(&temp.path().join("a.yml")).unwrap();
    assert_eq!(loaded.definition.step_names(), vec!["b", "a"]);
}

#[test]
fn included_file_paths_resolve_against_their_own_file() {
    let temp = TempDir::new().unwrap();
    let sub = temp.path().join("files");
    fs::create_dir_all(&sub).unwrap();
    fs::write(
        sub.join("motd.yml"),
        "steps:\n  - name: motd\n    action: { type: file, path: motd.txt, content: hi }\n",
    )
    .unwrap();
    fs::write(temp.path().join("stepwise.yml"), "include: [files/motd.yml]\n").unwrap();

    let loaded = load_definition(&temp.path().join("stepwise.yml")).unwrap();
    match &loaded.definition.steps[0].action {
        ActionConfig::File { path, .. } => {
            assert!(path.is_absolute());
            assert!(path.ends_with("files/motd.txt"));
        }
        other => panic!("expected file action, got {:?}", other),
    }
}

#[test]
fn validation_collects_every_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("stepwise.yml");
    fs::write(
        &path,
        r#"
settings:
  max_parallel: 0
steps:
  - name: "bad name"
    action: { type: command, command: "" }
  - name: install
    depends_on: [install, missing]
    action: { type: package, packages: [] }
"#,
    )
    .unwrap();

    let loaded = load_definition(&path).unwrap();
    let rules: Vec<String> = validate(&loaded.definition)
        .into_iter()
        .map(|e| e.rule)
        .collect();

    for rule in ["invalid-name", "self-dependency", "unknown-dependency"] {
        assert!(rules.iter().any(|r| r == rule), "missing {}: {:?}", rule, rules);
    }
    assert!(rules.len() >= 5, "{:?}", rules);
}

#[test]
fn strict_validation_names_the_cycle() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("stepwise.yml");
    fs::write(
        &path,
        r#"
steps:
  - name: a
    depends_on: [b]
    action: { type: command, command: "true" }
  - name: b
    depends_on: [a]
    action: { type: command, command: "true" }
"#,
    )
    .unwrap();

    let loaded = load_definition(&path).unwrap();
    match validate_strict(&loaded.definition) {
        Err(StepwiseError::CircularDependency { cycle }) => {
            assert!(cycle.contains("a -> b") || cycle.contains("b -> a"), "{}", cycle);
        }
        other => panic!("expected cycle, got {:?}", other),
    }
}

#[test]
fn demo_definition_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("demos/streambot-test-client/stepwise.yml");
    let loaded = load_definition(&path).unwrap();

    assert!(validate(&loaded.definition).is_empty());
    assert_eq!(
        loaded.definition.step_names().first(),
        Some(&"pkgmgr-update")
    );
    assert_eq!(
        loaded.definition.step_names().last(),
        Some(&"restart-statsd")
    );
    assert_eq!(
        loaded
            .definition
            .step_names()
            .iter()
            .filter(|s| **s == "pkgmgr-update")
            .count(),
        1
    );
}
