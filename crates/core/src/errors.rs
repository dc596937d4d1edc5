//! Error types and handling
//!
//! Domain-specific error enums (configuration loading, invocation building,
//! runtime execution) are wrapped in the top-level [`BinciError`] so callers can
//! propagate everything through a single [`Result`] alias.
//!
//! Recoverable validation problems are not errors; they are reported as
//! [`ConfigWarning`] values alongside a successful result.

use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file parsing error
    #[error("Failed to parse configuration file: {message}")]
    Parsing { message: String },

    /// Configuration validation error
    #[error("Configuration validation error: {message}")]
    Validation { message: String },

    /// Configuration file I/O error
    #[error("Failed to read configuration file")]
    Io(#[from] std::io::Error),

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: String },

    /// Host path that cannot be passed to the runtime as text
    #[error("Path is not valid UTF-8: {path}")]
    NonUtf8Path { path: String },
}

/// Fatal errors raised while building a runtime invocation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// `from` is absent from the configuration being built
    #[error("Missing 'from' property in config or argument")]
    MissingBaseImage,

    /// The requested task is not declared and `exec` is not set
    #[error("Task '{name}' does not exist")]
    MissingTask { name: String },
}

/// Container runtime process errors
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Runtime binary could not be spawned
    #[error("Failed to execute container runtime '{runtime}': {source}")]
    Spawn {
        runtime: String,
        #[source]
        source: std::io::Error,
    },

    /// Runtime exited with a non-zero status
    #[error("Container runtime exited with code {code}")]
    ExitStatus { code: i32 },

    /// Runtime was terminated by a signal
    #[error("Container runtime was terminated by a signal")]
    Terminated,

    /// A runtime query failed; carries the runtime's stderr
    #[error("Container runtime command failed: {stderr}")]
    CommandFailed { stderr: String },

    /// Runtime output could not be decoded
    #[error("Invalid UTF-8 in container runtime output: {0}")]
    InvalidOutput(#[from] std::string::FromUtf8Error),
}

/// Main error enum wrapping all domain-specific errors
#[derive(Error, Debug)]
pub enum BinciError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invocation building errors
    #[error("{0}")]
    Build(#[from] BuildError),

    /// Container runtime errors
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

/// Convenience type alias for Results with BinciError
pub type Result<T> = std::result::Result<T, BinciError>;

/// Non-fatal validation problems found while mapping a configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A property that must be a sequence holds some other type
    InvalidArrayProperty { property: String },

    /// A service descriptor is not a single-entry mapping
    InvalidServiceDescriptor { index: usize },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::InvalidArrayProperty { property } => {
                write!(f, "Config error: '{}' should be an array", property)
            }
            ConfigWarning::InvalidServiceDescriptor { index } => {
                write!(
                    f,
                    "Config error: service #{} should be a mapping of name to config",
                    index
                )
            }
        }
    }
}
