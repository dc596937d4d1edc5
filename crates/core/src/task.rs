//! Task command formatting
//!
//! The task, its `before` hook and its `after` hook are joined into a single
//! shell command and run as `/bin/sh -c "<command>"`. The double quotes are
//! part of the argument itself.
//!
//! Task bodies written over several lines are turned into `;`-separated
//! statements. Historically only the first line break of each body is
//! converted ([`NewlineMode::FirstOnly`]) and later ones are passed through to
//! the shell as-is; [`NewlineMode::All`] converts every line break.

use crate::config::Config;
use crate::errors::BuildError;
use tracing::debug;

/// Shell used to run tasks inside the container
pub const TASK_SHELL: &str = "/bin/sh";

/// Statement separator that replaces line breaks
const STATEMENT_SEPARATOR: &str = "; ";

/// How line breaks inside a task body are converted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NewlineMode {
    /// Only the first line break becomes a separator
    #[default]
    FirstOnly,
    /// Every line break becomes a separator
    All,
}

/// Convert line breaks in a task body according to `mode`
pub fn format_task(body: &str, mode: NewlineMode) -> String {
    match mode {
        NewlineMode::FirstOnly => body.replacen('\n', STATEMENT_SEPARATOR, 1),
        NewlineMode::All => body.replace('\n', STATEMENT_SEPARATOR),
    }
}

/// Shell invocation that runs the configured task with its hooks
///
/// With `exec` set the task is a literal command and is used unformatted.
/// Otherwise it names an entry of `tasks`, and a missing or empty entry is a
/// [`BuildError::MissingTask`].
pub fn build_exec(config: &Config, mode: NewlineMode) -> Result<Vec<String>, BuildError> {
    let before = config
        .before()
        .map(|cmd| format!("{}{}", format_task(&cmd, mode), STATEMENT_SEPARATOR))
        .unwrap_or_default();
    let after = config
        .after()
        .map(|cmd| format!("{}{}", STATEMENT_SEPARATOR, format_task(&cmd, mode)))
        .unwrap_or_default();

    let task = config.task();
    let body = if config.exec() {
        task.ok_or_else(|| BuildError::MissingTask {
            name: String::new(),
        })?
    } else {
        let name = task.unwrap_or_default();
        let body = config
            .task_body(&name)
            .ok_or(BuildError::MissingTask { name })?;
        format_task(&body, mode)
    };

    let command = format!("\"{}{}{}\"", before, body, after);
    debug!("Task command: {}", command);

    Ok(vec![TASK_SHELL.to_string(), "-c".to_string(), command])
}

/// Arguments as a process receives them when no host shell joins the line
///
/// [`build_exec`] wraps the command in `"` for a shell that re-splits a joined
/// command line. A runtime spawned directly would pass those delimiters to
/// `/bin/sh -c` verbatim, so they are removed from the command following a
/// trailing `/bin/sh -c`.
pub fn direct_argv(args: &[String]) -> Vec<String> {
    let mut argv = args.to_vec();
    if let [.., shell, flag, command] = argv.as_mut_slice() {
        if shell.as_str() == TASK_SHELL && flag.as_str() == "-c" {
            *command = unquote_command(command).to_string();
        }
    }
    argv
}

fn unquote_command(command: &str) -> &str {
    command
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(command)
}
