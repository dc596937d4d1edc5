//! Execution of planned invocations against the container runtime
//!
//! Services are started detached in declaration order, then the primary
//! container runs attached to the terminal. Service containers are removed
//! once the primary exits, whatever its outcome.
//!
//! The runtime is spawned directly, without a host shell, so arguments go
//! through [`direct_argv`] first.

use binci_core::cleanup::{list_args, removal_args, select_containers, CleanupScope};
use binci_core::errors::{Result, RuntimeError};
use binci_core::invocation::InvocationPlan;
use binci_core::task::direct_argv;
use std::process::{Command, ExitStatus, Stdio};
use tracing::{debug, info, instrument, warn};

/// Runs invocation plans with a runtime executable
#[derive(Debug, Clone)]
pub struct Runner {
    runtime_path: String,
}

impl Runner {
    pub fn new(runtime_path: impl Into<String>) -> Self {
        Self {
            runtime_path: runtime_path.into(),
        }
    }

    /// Start services, run the primary container, then clean up services
    #[instrument(skip_all, fields(runtime = %self.runtime_path))]
    pub fn run_plan(&self, plan: &InvocationPlan) -> Result<()> {
        let mut started = Vec::new();

        for service in &plan.services {
            info!("Starting service '{}'", service.name);
            if let Err(err) = self.run_detached(&service.invocation.args) {
                self.remove_containers(&started);
                return Err(err);
            }
            started.push(service.container_name.clone());
        }

        let result = self.run_attached(&plan.primary.args);
        self.remove_containers(&started);
        result
    }

    /// Force-remove leftover namespaced containers in `scope`
    ///
    /// Returns the names of the removed containers.
    #[instrument(skip(self), fields(runtime = %self.runtime_path))]
    pub fn cleanup(&self, scope: CleanupScope) -> Result<Vec<String>> {
        let listing = self.query(&list_args(scope))?;
        let names = select_containers(&listing);
        if names.is_empty() {
            debug!("No containers to remove");
            return Ok(names);
        }

        info!("Removing {} container(s)", names.len());
        let status = self.spawn(&removal_args(&names), Stdio::null())?;
        check_status(status)?;
        Ok(names)
    }

    fn run_detached(&self, args: &[String]) -> Result<()> {
        let status = self.spawn(args, Stdio::null())?;
        check_status(status)
    }

    fn run_attached(&self, args: &[String]) -> Result<()> {
        let status = self.spawn(args, Stdio::inherit())?;
        check_status(status)
    }

    /// Best-effort forced removal; failures are only logged
    fn remove_containers(&self, names: &[String]) {
        if names.is_empty() {
            return;
        }
        debug!("Removing service containers: {}", names.join(", "));

        match self.spawn(&removal_args(names), Stdio::null()) {
            Ok(status) if status.success() => {}
            Ok(status) => warn!("Failed to remove service containers ({})", status),
            Err(err) => warn!("Failed to remove service containers: {}", err),
        }
    }

    fn spawn(&self, args: &[String], stdout: Stdio) -> Result<ExitStatus> {
        let argv = direct_argv(args);
        debug!("Executing: {} {}", self.runtime_path, argv.join(" "));
        self.command(&argv)
            .stdout(stdout)
            .status()
            .map_err(|source| self.spawn_error(source))
    }

    /// Run a runtime command and return its stdout
    fn query(&self, args: &[String]) -> Result<String> {
        debug!("Querying: {} {}", self.runtime_path, args.join(" "));
        let output = self
            .command(args)
            .output()
            .map_err(|source| self.spawn_error(source))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(RuntimeError::CommandFailed { stderr }.into());
        }

        let stdout = String::from_utf8(output.stdout).map_err(RuntimeError::from)?;
        Ok(stdout)
    }

    fn command(&self, args: &[String]) -> Command {
        let mut command = Command::new(&self.runtime_path);
        command.args(args);
        command
    }

    fn spawn_error(&self, source: std::io::Error) -> binci_core::errors::BinciError {
        RuntimeError::Spawn {
            runtime: self.runtime_path.clone(),
            source,
        }
        .into()
    }
}

fn check_status(status: ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(RuntimeError::ExitStatus { code }.into()),
        None => Err(RuntimeError::Terminated.into()),
    }
}
