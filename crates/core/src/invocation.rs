//! Runtime invocation building
//!
//! Assembles the complete argument list for `docker run` from a configuration.
//! Two container roles exist:
//!
//! - **Primary**: the disposable container running the task. It is removed on
//!   exit, mounts the current directory onto itself and uses it as the working
//!   directory.
//! - **Service**: a detached background container the primary links to.
//!
//! ## Argument layout
//!
//! ```text
//! run <seed> <flags from expose/volumes/env> <links> --name dl_<name> <from> [<task exec>]
//! ```
//!
//! Building is a pure function of the configuration and an injected
//! [`HostContext`]. A missing base image or task aborts the build with a
//! [`BuildError`]; type problems in recognized properties only produce
//! warnings.

use crate::config::Config;
use crate::errors::{BuildError, ConfigError, ConfigWarning};
use crate::flags::map_flags;
use crate::links::{build_links, namespaced};
use crate::platform::{normalize_host_path, Platform};
use crate::task::{build_exec, NewlineMode};
use crate::variable::{EnvLookup, HostEnv};
use std::path::Path;
use tracing::{debug, instrument};

/// Raw name of the primary container when the caller does not pick one
pub const PRIMARY_NAME: &str = "primary";

/// Role of the container being built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRole {
    /// Ephemeral container running the task
    Primary,
    /// Detached service container
    Service,
}

/// Host facts the builder reads
pub struct HostContext<'a> {
    /// Current working directory, as the host reports it
    pub cwd: String,
    /// Host platform, used for path normalization
    pub platform: Platform,
    /// Host environment used for `${NAME}` interpolation
    pub env: &'a dyn EnvLookup,
}

impl std::fmt::Debug for HostContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostContext")
            .field("cwd", &self.cwd)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

impl<'a> HostContext<'a> {
    /// Context with explicit values
    pub fn new(cwd: impl Into<String>, platform: Platform, env: &'a dyn EnvLookup) -> Self {
        Self {
            cwd: cwd.into(),
            platform,
            env,
        }
    }
}

impl HostContext<'static> {
    /// Context for the running process
    ///
    /// The working directory becomes a mount source, so it must be valid
    /// UTF-8; a lossy conversion would mount a different path.
    pub fn from_process(cwd: &Path) -> std::result::Result<Self, ConfigError> {
        static HOST_ENV: HostEnv = HostEnv;
        let cwd = cwd.to_str().ok_or_else(|| ConfigError::NonUtf8Path {
            path: cwd.display().to_string(),
        })?;
        Ok(Self {
            cwd: cwd.to_string(),
            platform: Platform::detect(),
            env: &HOST_ENV,
        })
    }
}

/// A built runtime invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Arguments to pass to the runtime executable
    pub args: Vec<String>,
    /// Recoverable problems found while building
    pub warnings: Vec<ConfigWarning>,
}

/// Invocation for one service container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInvocation {
    /// Raw service name as declared
    pub name: String,
    /// Namespaced container name
    pub container_name: String,
    pub invocation: Invocation,
}

/// Every invocation needed for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationPlan {
    /// Services in declaration order
    pub services: Vec<ServiceInvocation>,
    /// The primary container
    pub primary: Invocation,
}

impl InvocationPlan {
    /// Namespaced names of the service containers, in start order
    pub fn service_container_names(&self) -> Vec<String> {
        self.services
            .iter()
            .map(|s| s.container_name.clone())
            .collect()
    }
}

/// Build the runtime arguments for one container
#[instrument(skip(config, host))]
pub fn build_invocation(
    config: &Config,
    name: &str,
    role: ContainerRole,
    host: &HostContext<'_>,
    mode: NewlineMode,
) -> Result<Invocation, BuildError> {
    let from = config.from_image().ok_or(BuildError::MissingBaseImage)?;

    let mut args = seed_args(role, host);

    let flags = map_flags(config, host.env);
    args.extend(flags.args);

    let links = build_links(config);
    args.extend(links.args);

    args.push("--name".to_string());
    args.push(namespaced(name));
    args.push(from);

    if role == ContainerRole::Primary {
        args.extend(build_exec(config, mode)?);
    }

    let mut warnings = flags.warnings;
    warnings.extend(links.warnings);

    debug!("Built {} runtime arguments for '{}'", args.len(), name);
    Ok(Invocation { args, warnings })
}

/// Build service invocations followed by the primary invocation
///
/// Services are built from their nested configuration. The first fatal error
/// aborts the whole plan.
#[instrument(skip_all, fields(primary = primary_name))]
pub fn plan_invocations(
    config: &Config,
    primary_name: &str,
    host: &HostContext<'_>,
    mode: NewlineMode,
) -> Result<InvocationPlan, BuildError> {
    let services = config
        .services()
        .services
        .into_iter()
        .map(|service| {
            let invocation = build_invocation(
                &service.config,
                &service.name,
                ContainerRole::Service,
                host,
                mode,
            )?;
            Ok(ServiceInvocation {
                container_name: namespaced(&service.name),
                name: service.name,
                invocation,
            })
        })
        .collect::<Result<Vec<_>, BuildError>>()?;

    let primary = build_invocation(config, primary_name, ContainerRole::Primary, host, mode)?;

    Ok(InvocationPlan { services, primary })
}

fn seed_args(role: ContainerRole, host: &HostContext<'_>) -> Vec<String> {
    match role {
        ContainerRole::Primary => {
            let cwd = normalize_host_path(&host.cwd, host.platform);
            vec![
                "run".to_string(),
                "--rm".to_string(),
                "-v".to_string(),
                format!("{}:{}", cwd, cwd),
                "-w".to_string(),
                cwd,
                "--privileged".to_string(),
            ]
        }
        ContainerRole::Service => vec![
            "run".to_string(),
            "-d".to_string(),
            "--privileged".to_string(),
        ],
    }
}
