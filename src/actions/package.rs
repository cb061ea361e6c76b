//! System package actions.

use crate::config::PackageManager;
use crate::shell::quote;

use super::{Action, ActionContext, ActionError, Outcome};

/// Lock shared by every package-manager action.
///
/// Package managers hold a global lock of their own; two installs at once
/// fail rather than queue.
pub const PACKAGE_LOCK: &str = "package-manager";

impl PackageManager {
    /// Name as written in definitions.
    pub fn name(&self) -> &'static str {
        match self {
            PackageManager::Apt => "apt",
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
            PackageManager::Brew => "brew",
            PackageManager::Apk => "apk",
        }
    }

    /// Command exiting 0 when `package` is installed.
    pub fn query_command(&self, package: &str) -> String {
        let package = quote(package);
        match self {
            PackageManager::Apt => format!(
                "dpkg-query -W -f='${{Status}}' {} 2>/dev/null | grep -q 'install ok installed'",
                package
            ),
            PackageManager::Dnf | PackageManager::Yum => format!("rpm -q {}", package),
            PackageManager::Brew => format!("brew list --versions {}", package),
            PackageManager::Apk => format!("apk info -e {}", package),
        }
    }

    /// Command installing `packages` without prompting.
    pub fn install_command(&self, packages: &[&str]) -> String {
        let list = packages
            .iter()
            .map(|p| quote(p))
            .collect::<Vec<_>>()
            .join(" ");
        match self {
            PackageManager::Apt => format!("apt-get install -y {}", list),
            PackageManager::Dnf => format!("dnf install -y {}", list),
            PackageManager::Yum => format!("yum install -y {}", list),
            PackageManager::Brew => format!("brew install {}", list),
            PackageManager::Apk => format!("apk add --no-cache {}", list),
        }
    }

    /// Command refreshing the package index.
    pub fn update_command(&self) -> &'static str {
        match self {
            PackageManager::Apt => "apt-get update",
            PackageManager::Dnf => "dnf makecache",
            PackageManager::Yum => "yum makecache",
            PackageManager::Brew => "brew update",
            PackageManager::Apk => "apk update",
        }
    }

    fn noninteractive_env(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            PackageManager::Apt => &[("DEBIAN_FRONTEND", "noninteractive")],
            PackageManager::Brew => &[("HOMEBREW_NO_AUTO_UPDATE", "1")],
            _ => &[],
        }
    }
}

/// Installs packages that are not installed yet.
#[derive(Debug, Clone)]
pub struct PackageAction {
    manager: PackageManager,
    packages: Vec<String>,
}

impl PackageAction {
    pub fn new(manager: PackageManager, packages: Vec<String>) -> Self {
        Self { manager, packages }
    }
}

impl Action for PackageAction {
    fn describe(&self) -> String {
        format!("install {} ({})", self.packages.join(", "), self.manager.name())
    }

    fn lock(&self) -> Option<&str> {
        Some(PACKAGE_LOCK)
    }

    fn apply(&self, ctx: &ActionContext<'_>) -> Result<Outcome, ActionError> {
        let missing: Vec<&str> = self
            .packages
            .iter()
            .map(String::as_str)
            .filter(|p| !ctx.probe(&self.manager.query_command(p)))
            .collect();

        if missing.is_empty() {
            return Ok(Outcome::satisfied_with(format!(
                "{} already installed",
                self.packages.join(", ")
            )));
        }

        if ctx.dry_run {
            return Ok(Outcome::applied_with(format!(
                "would install {}",
                missing.join(", ")
            )));
        }

        ctx.run_with_env(
            &self.manager.install_command(&missing),
            self.manager.noninteractive_env(),
        )?;
        Ok(Outcome::applied_with(format!("installed {}", missing.join(", "))))
    }
}

/// Refreshes the package index. Always reports applied.
#[derive(Debug, Clone)]
pub struct PackageUpdateAction {
    manager: PackageManager,
}

impl PackageUpdateAction {
    pub fn new(manager: PackageManager) -> Self {
        Self { manager }
    }
}

impl Action for PackageUpdateAction {
    fn describe(&self) -> String {
        format!("refresh package index ({})", self.manager.name())
    }

    fn lock(&self) -> Option<&str> {
        Some(PACKAGE_LOCK)
    }

    fn apply(&self, ctx: &ActionContext<'_>) -> Result<Outcome, ActionError> {
        let command = self.manager.update_command();
        if ctx.dry_run {
            return Ok(Outcome::applied_with(format!("would run `{}`", command)));
        }

        ctx.run_with_env(command, self.manager.noninteractive_env())?;
        Ok(Outcome::applied_with("package index refreshed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::MockRunner;
    use std::path::Path;

    fn golang_and_statsd() -> PackageAction {
        PackageAction::new(
            PackageManager::Apt,
            vec!["golang".to_string(), "statsd".to_string()],
        )
    }

    #[test]
    fn installed_packages_are_satisfied() {
        let runner = MockRunner::new();
        let ctx = ActionContext::new(Path::new("."), &runner);

        let outcome = golang_and_statsd().apply(&ctx).unwrap();

        assert_eq!(
            outcome,
            Outcome::satisfied_with("golang, statsd already installed")
        );
        assert!(!runner.ran("apt-get install"));
    }

    #[test]
    fn installs_only_missing_packages() {
        let runner = MockRunner::new();
        runner.fail_on("dpkg-query -W -f='${Status}' golang");
        let ctx = ActionContext::new(Path::new("."), &runner);

        let outcome = golang_and_statsd().apply(&ctx).unwrap();

        assert_eq!(outcome, Outcome::applied_with("installed golang"));
        assert!(runner.ran("apt-get install -y golang"));
        assert!(!runner.ran("apt-get install -y golang statsd"));
    }

    #[test]
    fn install_failure_is_reported() {
        let runner = MockRunner::failing();
        let ctx = ActionContext::new(Path::new("."), &runner);

        let err = golang_and_statsd().apply(&ctx).unwrap_err();
        match err {
            ActionError::CommandFailed { command, .. } => {
                assert_eq!(command, "apt-get install -y golang statsd");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn dry_run_probes_without_installing() {
        let runner = MockRunner::failing();
        let ctx = ActionContext::new(Path::new("."), &runner).with_dry_run(true);

        let outcome = golang_and_statsd().apply(&ctx).unwrap();

        assert_eq!(outcome.detail(), Some("would install golang, statsd"));
        assert!(runner.commands().iter().all(|c| c.starts_with("dpkg-query")));
    }

    #[test]
    fn update_always_applies() {
        let runner = MockRunner::new();
        let ctx = ActionContext::new(Path::new("."), &runner);

        let outcome = PackageUpdateAction::new(PackageManager::Apt)
            .apply(&ctx)
            .unwrap();

        assert!(outcome.is_applied());
        assert_eq!(runner.commands(), vec!["apt-get update"]);
    }

    #[test]
    fn update_failure_is_reported() {
        let runner = MockRunner::failing();
        let ctx = ActionContext::new(Path::new("."), &runner);
        assert!(PackageUpdateAction::new(PackageManager::Dnf)
            .apply(&ctx)
            .is_err());
        assert_eq!(runner.commands(), vec!["dnf makecache"]);
    }

    #[test]
    fn manager_commands() {
        assert_eq!(PackageManager::Dnf.query_command("golang"), "rpm -q golang");
        assert_eq!(
            PackageManager::Apk.install_command(&["go", "git"]),
            "apk add --no-cache go git"
        );
        assert_eq!(
            PackageManager::Brew.install_command(&["weird name"]),
            "brew install 'weird name'"
        );
        assert_eq!(PackageManager::Yum.update_command(), "yum makecache");
    }
}
