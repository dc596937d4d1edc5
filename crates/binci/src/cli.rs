use crate::runner::Runner;
use anyhow::{Context, Result};
use binci_core::cleanup::CleanupScope;
use binci_core::config::{Config, ConfigLoader, Overrides, ServiceSelection, DEFAULT_CONFIG_FILE};
use binci_core::invocation::{plan_invocations, HostContext, InvocationPlan, PRIMARY_NAME};
use binci_core::task::{direct_argv, NewlineMode};
use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Log format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    Text,
    /// JSON structured format
    Json,
}

impl From<LogFormat> for binci_core::logging::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Text => binci_core::logging::LogFormat::Text,
            LogFormat::Json => binci_core::logging::LogFormat::Json,
        }
    }
}

/// Log level options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Error messages only
    Error,
    /// Warning and error messages
    Warn,
    /// Informational messages and above
    Info,
    /// Debug messages and above
    Debug,
    /// All messages including trace
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Run tasks in disposable containers
#[derive(Debug, Parser)]
#[command(name = "binci", version, about = "Run tasks in disposable containers")]
#[command(long_about = "Run tasks in disposable containers\n\n\
    Reads binci.yml from the current directory, starts the declared services \
    detached, then runs the task in a throwaway container that mounts the \
    current directory as its working directory.")]
pub struct Cli {
    /// Configuration file (defaults to binci.yml in the current directory)
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Treat the task words as a literal shell command
    #[arg(short = 'e', long)]
    pub exec: bool,

    /// Base image, overriding `from` in the configuration
    #[arg(long, value_name = "IMAGE")]
    pub from: Option<String>,

    /// Disable a service (can be repeated; `*` disables all)
    #[arg(short = 'd', long = "disable", value_name = "SERVICE")]
    pub disable: Vec<String>,

    /// Disable all services
    #[arg(long)]
    pub disable_all: bool,

    /// List the tasks declared in the configuration and exit
    #[arg(long)]
    pub tasks: bool,

    /// Remove stopped binci containers and exit
    #[arg(long, conflicts_with = "cleanup_all")]
    pub cleanup: bool,

    /// Remove all binci containers, running or stopped, and exit
    #[arg(long)]
    pub cleanup_all: bool,

    /// Print the runtime commands instead of running them
    #[arg(long)]
    pub dry_run: bool,

    /// Turn every line break in a task into a statement separator
    #[arg(long)]
    pub join_all_lines: bool,

    /// Container runtime executable
    #[arg(long, env = "BINCI_RUNTIME", default_value = "docker")]
    pub runtime_path: String,

    /// Log format (text or json, can be set via BINCI_LOG_FORMAT env var)
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Task name, or the command to run with --exec
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "TASK")]
    pub task: Vec<String>,
}

impl Cli {
    pub fn dispatch(self) -> Result<()> {
        if std::env::var_os("BINCI_LOG").is_none() && std::env::var_os("RUST_LOG").is_none() {
            let level = self.log_level.as_str();
            std::env::set_var("RUST_LOG", format!("binci={},binci_core={}", level, level));
        }
        binci_core::logging::init(self.log_format.map(Into::into))?;

        if let Some(scope) = self.cleanup_scope() {
            let removed = Runner::new(&self.runtime_path).cleanup(scope)?;
            info!("Removed {} container(s)", removed.len());
            return Ok(());
        }

        let cwd = std::env::current_dir().context("Failed to determine current directory")?;
        let config = self.load_config(&cwd)?;

        if self.tasks {
            return print_tasks(&config);
        }

        let config = self.effective_config(&config);
        let host = HostContext::from_process(&cwd)?;
        let mode = if self.join_all_lines {
            NewlineMode::All
        } else {
            NewlineMode::FirstOnly
        };
        let primary_name = format!("{}_{}", PRIMARY_NAME, std::process::id());

        let plan = plan_invocations(&config, &primary_name, &host, mode)?;
        debug!(
            "Planned {} service container(s) and primary container '{}'",
            plan.services.len(),
            primary_name
        );

        if self.dry_run {
            return print_plan(&self.runtime_path, &plan);
        }

        Runner::new(self.runtime_path).run_plan(&plan)?;
        Ok(())
    }

    fn cleanup_scope(&self) -> Option<CleanupScope> {
        if self.cleanup_all {
            Some(CleanupScope::All)
        } else if self.cleanup {
            Some(CleanupScope::Stopped)
        } else {
            None
        }
    }

    /// Load the configuration file
    ///
    /// A missing default file is not an error: everything can be supplied on
    /// the command line. An explicitly named file must exist.
    fn load_config(&self, cwd: &Path) -> Result<Config> {
        match &self.file {
            Some(path) => Ok(ConfigLoader::load_from_path(path)?),
            None => {
                let path = cwd.join(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Ok(ConfigLoader::load_from_path(&path)?)
                } else {
                    debug!("No {} found in {}", DEFAULT_CONFIG_FILE, cwd.display());
                    Ok(Config::default())
                }
            }
        }
    }

    /// Apply service filters and command-line overrides
    fn effective_config(&self, config: &Config) -> Config {
        let config = match ServiceSelection::from_flags(&self.disable, self.disable_all) {
            Some(selection) => config.without_services(&selection),
            None => config.clone(),
        };
        config.with_overrides(&Overrides {
            from: self.from.clone(),
            task: self.task.clone(),
            exec: self.exec,
        })
    }
}

fn print_tasks(config: &Config) -> Result<()> {
    let names = config.task_names();
    let mut stdout = std::io::stdout().lock();
    if names.is_empty() {
        writeln!(stdout, "No tasks declared")?;
    } else {
        writeln!(stdout, "Available tasks:")?;
        for name in names {
            writeln!(stdout, "  {}", name)?;
        }
    }
    Ok(())
}

fn print_plan(runtime: &str, plan: &InvocationPlan) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    for service in &plan.services {
        writeln!(stdout, "{}", render_command(runtime, &service.invocation.args))?;
    }
    writeln!(stdout, "{}", render_command(runtime, &plan.primary.args))?;
    Ok(())
}

/// Shell-quoted command line for display
///
/// Renders the arguments the runner actually passes, so the printed line can
/// be pasted into a shell.
pub fn render_command(runtime: &str, args: &[String]) -> String {
    let argv = direct_argv(args);
    shell_words::join(std::iter::once(runtime).chain(argv.iter().map(String::as_str)))
}
