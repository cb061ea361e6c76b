//! System service action.

use crate::config::{ServiceManager, ServiceOperation};
use crate::shell::quote;

use super::{Action, ActionContext, ActionError, Outcome};

impl ServiceOperation {
    pub fn verb(&self) -> &'static str {
        match self {
            ServiceOperation::Start => "start",
            ServiceOperation::Stop => "stop",
            ServiceOperation::Restart => "restart",
            ServiceOperation::Reload => "reload",
        }
    }
}

impl ServiceManager {
    pub fn name(&self) -> &'static str {
        match self {
            ServiceManager::Systemd => "systemd",
            ServiceManager::Sysv => "sysv",
        }
    }

    /// Command exiting 0 when `service` is running.
    pub fn status_command(&self, service: &str) -> String {
        match self {
            ServiceManager::Systemd => format!("systemctl is-active --quiet {}", quote(service)),
            ServiceManager::Sysv => format!("service {} status", quote(service)),
        }
    }

    /// Command performing `verb` on `service`.
    pub fn control_command(&self, service: &str, verb: &str) -> String {
        match self {
            ServiceManager::Systemd => format!("systemctl {} {}", verb, quote(service)),
            ServiceManager::Sysv => format!("service {} {}", quote(service), verb),
        }
    }
}

/// Controls a system service.
///
/// Start and stop are no-ops when the service is already in that state.
/// Restart always acts: a running service is restarted, a stopped one is
/// started. Reload of a stopped service starts it.
#[derive(Debug, Clone)]
pub struct ServiceAction {
    service: String,
    operation: ServiceOperation,
    manager: ServiceManager,
}

impl ServiceAction {
    pub fn new(service: impl Into<String>, operation: ServiceOperation, manager: ServiceManager) -> Self {
        Self {
            service: service.into(),
            operation,
            manager,
        }
    }

    fn act(&self, ctx: &ActionContext<'_>, verb: &str, detail: &str) -> Result<Outcome, ActionError> {
        if ctx.dry_run {
            return Ok(Outcome::applied_with(format!(
                "would {} {}",
                verb, self.service
            )));
        }

        ctx.run(&self.manager.control_command(&self.service, verb))?;
        Ok(Outcome::applied_with(detail))
    }
}

impl Action for ServiceAction {
    fn describe(&self) -> String {
        format!(
            "{} service {} ({})",
            self.operation.verb(),
            self.service,
            self.manager.name()
        )
    }

    fn apply(&self, ctx: &ActionContext<'_>) -> Result<Outcome, ActionError> {
        let running = ctx.probe(&self.manager.status_command(&self.service));

        match (self.operation, running) {
            (ServiceOperation::Start, true) => Ok(Outcome::satisfied_with("already running")),
            (ServiceOperation::Stop, false) => Ok(Outcome::satisfied_with("already stopped")),
            (ServiceOperation::Start, false) => self.act(ctx, "start", "started"),
            (ServiceOperation::Stop, true) => self.act(ctx, "stop", "stopped"),
            (ServiceOperation::Restart, true) => {
                self.act(ctx, "restart", "restarted (was running)")
            }
            (ServiceOperation::Reload, true) => self.act(ctx, "reload", "reloaded"),
            (ServiceOperation::Restart | ServiceOperation::Reload, false) => {
                self.act(ctx, "start", "started (was not running)")
            }
        }
    }
}
