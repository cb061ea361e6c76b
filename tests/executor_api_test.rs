//! Integration tests for the executor public API.

use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use stepwise::actions::{ActionError, FileAction, FnAction, Outcome};
use stepwise::runner::{CancellationToken, Executor, FailurePolicy, RunOptions};
use stepwise::shell::MockRunner;
use stepwise::steps::{Step, StepStatus};
use stepwise::StepwiseError;
use tempfile::TempDir;

type Log = Arc<Mutex<Vec<String>>>;

fn recording(name: &str, log: &Log) -> Step {
    let log = Arc::clone(log);
    let step_name = name.to_string();
    Step::new(
        name,
        FnAction::new(format!("record {}", name), move |_| {
            log.lock().unwrap().push(step_name.clone());
            Ok(Outcome::applied())
        }),
    )
}

fn failing(name: &str, log: &Log) -> Step {
    let log = Arc::clone(log);
    let step_name = name.to_string();
    Step::new(
        name,
        FnAction::new(format!("fail {}", name), move |_| {
            log.lock().unwrap().push(step_name.clone());
            Err(ActionError::Message("E: Unable to locate package golang".to_string()))
        }),
    )
}

fn executor(steps: Vec<Step>) -> Executor {
    Executor::new(steps, Arc::new(MockRunner::new())).unwrap()
}

#[test]
fn every_step_runs_exactly_once_after_its_dependencies() {
    let log: Log = Arc::default();
    let steps = vec![
        recording("report", &log).depends_on(["restart-service", "write-config"]),
        recording("restart-service", &log).depends_on(["install-runtime"]),
        recording("write-config", &log),
        recording("install-runtime", &log).depends_on(["pkgmgr-update"]),
        recording("pkgmgr-update", &log),
    ];

    let report = executor(steps).run(&RunOptions::default()).unwrap();
    let ran = log.lock().unwrap().clone();

    assert_eq!(ran.len(), 5);
    let pos = |name: &str| ran.iter().position(|s| s == name).unwrap();
    assert!(pos("pkgmgr-update") < pos("install-runtime"));
    assert!(pos("install-runtime") < pos("restart-service"));
    assert!(pos("restart-service") < pos("report"));
    assert!(pos("write-config") < pos("report"));
    assert_eq!(report.order(), ran.iter().map(String::as_str).collect::<Vec<_>>());
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn example_chain_skips_restart_when_install_fails() {
    let log: Log = Arc::default();
    let steps = vec![
        recording("pkgmgr-update", &log),
        failing("install-runtime", &log).depends_on(["pkgmgr-update"]),
        recording("restart-service", &log).depends_on(["install-runtime"]),
    ];

    let report = executor(steps).run(&RunOptions::default()).unwrap();

    assert_eq!(
        report.order(),
        vec!["pkgmgr-update", "install-runtime", "restart-service"]
    );
    assert_eq!(report.result("pkgmgr-update").unwrap().status, StepStatus::Succeeded);
    assert_eq!(report.result("install-runtime").unwrap().status, StepStatus::Failed);

    let restart = report.result("restart-service").unwrap();
    assert_eq!(restart.status, StepStatus::Skipped);
    assert_eq!(
        restart.error.as_deref(),
        Some("dependency 'install-runtime' failed")
    );
    assert_eq!(report.exit_code(), 1);
    assert!(!log.lock().unwrap().contains(&"restart-service".to_string()));
}

#[test]
fn failure_skips_transitive_dependents_but_not_independent_steps() {
    let log: Log = Arc::default();
    let steps = vec![
        failing("b", &log),
        recording("c", &log).depends_on(["b"]),
        recording("d", &log).depends_on(["c"]),
        recording("independent", &log),
    ];

    let report = executor(steps).run(&RunOptions::default()).unwrap();

    assert_eq!(report.result("c").unwrap().status, StepStatus::Skipped);
    assert_eq!(
        report.result("d").unwrap().error.as_deref(),
        Some("dependency 'c' was skipped")
    );
    assert_eq!(report.result("independent").unwrap().status, StepStatus::Succeeded);

    let counts = report.counts();
    assert_eq!((counts.succeeded, counts.failed, counts.skipped), (1, 1, 2));
}

#[test]
fn continue_on_error_attempts_dependents() {
    let log: Log = Arc::default();
    let steps = vec![
        failing("a", &log),
        failing("b", &log).depends_on(["a"]),
        recording("c", &log).depends_on(["b"]),
    ];

    let options = RunOptions {
        policy: FailurePolicy::ContinueOnError,
        ..RunOptions::default()
    };
    let report = executor(steps).run(&options).unwrap();

    assert_eq!(log.lock().unwrap().len(), 3);
    assert_eq!(report.counts().failed, 2);
    assert_eq!(report.exit_code(), 2);
}

#[test]
fn rerun_is_already_satisfied_without_mutation() {
    let temp = TempDir::new().unwrap();
    let build = || {
        Executor::new(
            vec![
                Step::new("motd", FileAction::new("etc/motd", "streambot test client\n", None)),
                Step::new(
                    "statsd-config",
                    FileAction::new("etc/statsd.json", "{\"port\": 8125}\n", None),
                )
                .depends_on(["motd"]),
            ],
            Arc::new(MockRunner::new()),
        )
        .unwrap()
        .with_base_dir(temp.path())
    };

    let first = build().run(&RunOptions::default()).unwrap();
    assert!(first.results.iter().all(|r| r.changed()));

    let motd = temp.path().join("etc/motd");
    let modified = fs::metadata(&motd).unwrap().modified().unwrap();
    thread::sleep(Duration::from_millis(20));

    let second = build().run(&RunOptions::default()).unwrap();
    assert!(second
        .results
        .iter()
        .all(|r| r.status == StepStatus::Succeeded && !r.changed()));
    assert_eq!(second.exit_code(), 0);
    assert_eq!(fs::metadata(&motd).unwrap().modified().unwrap(), modified);
}

#[test]
fn cycle_is_rejected_before_any_action_runs() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counting = |name: &str| {
        let calls = Arc::clone(&calls);
        Step::new(
            name,
            FnAction::new("count", move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Outcome::applied())
            }),
        )
    };

    let steps = vec![
        counting("a").depends_on(["b"]),
        counting("b").depends_on(["a"]),
    ];

    match Executor::new(steps, Arc::new(MockRunner::new())) {
        Err(StepwiseError::CircularDependency { cycle }) => {
            assert!(cycle.contains("a") && cycle.contains("b"));
        }
        other => panic!("expected circular dependency, got {:?}", other.map(|_| ())),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn unknown_dependency_is_rejected() {
    let log: Log = Arc::default();
    let result = Executor::new(
        vec![recording("install-runtime", &log).depends_on(["pkgmgr-update"])],
        Arc::new(MockRunner::new()),
    );

    assert!(matches!(
        result,
        Err(StepwiseError::UnknownDependency { ref step, ref dependency })
            if step == "install-runtime" && dependency == "pkgmgr-update"
    ));
}

#[test]
fn cancelled_run_skips_everything_and_exits_one() {
    let log: Log = Arc::default();
    let steps = vec![recording("a", &log), recording("b", &log).depends_on(["a"])];

    let cancel = CancellationToken::new();
    cancel.cancel();
    let options = RunOptions {
        cancel,
        ..RunOptions::default()
    };
    let report = executor(steps).run(&options).unwrap();

    assert!(log.lock().unwrap().is_empty());
    assert!(report
        .results
        .iter()
        .all(|r| r.status == StepStatus::Skipped && r.error.as_deref() == Some("cancelled")));
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn parallel_steps_sharing_a_lock_never_overlap() {
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let locked = |name: &str| {
        let active = Arc::clone(&active);
        let peak = Arc::clone(&peak);
        Step::new(
            name,
            FnAction::new("hold the package manager", move |_| {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(30));
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(Outcome::applied())
            }),
        )
        .with_lock("package-manager")
    };

    let steps = vec![locked("install-golang"), locked("install-git"), locked("install-curl")];
    let options = RunOptions {
        parallel: true,
        max_parallel: 3,
        ..RunOptions::default()
    };
    let report = executor(steps).run(&options).unwrap();

    assert_eq!(report.counts().succeeded, 3);
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[test]
fn parallel_run_keeps_dependency_order() {
    let log: Log = Arc::default();
    let steps = vec![
        recording("pkgmgr-update", &log),
        recording("install-runtime", &log).depends_on(["pkgmgr-update"]),
        recording("write-config", &log),
        recording("restart-service", &log).depends_on(["install-runtime", "write-config"]),
    ];
    let options = RunOptions {
        parallel: true,
        max_parallel: 4,
        env: HashMap::new(),
        ..RunOptions::default()
    };

    let report = executor(steps).run(&options).unwrap();
    let ran = log.lock().unwrap().clone();
    let pos = |name: &str| ran.iter().position(|s| s == name).unwrap();

    assert_eq!(ran.len(), 4);
    assert!(pos("pkgmgr-update") < pos("install-runtime"));
    assert!(pos("install-runtime") < pos("restart-service"));
    assert!(pos("write-config") < pos("restart-service"));
    assert_eq!(report.exit_code(), 0);
}
