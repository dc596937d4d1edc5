//! Core library for the binci CLI
//!
//! Turns a task/service configuration into the argument lists used to invoke
//! a container runtime: host variable interpolation, path normalization,
//! property-to-flag mapping, service links, task command formatting and the
//! invocation builder that composes them. Also holds configuration loading,
//! leftover container cleanup, error types and logging setup shared with the
//! binary.

pub mod cleanup;
pub mod config;
pub mod errors;
pub mod flags;
pub mod invocation;
pub mod links;
pub mod logging;
pub mod platform;
pub mod task;
pub mod variable;

// Re-export IndexMap for building ordered configurations in dependent crates
pub use indexmap::IndexMap;

/// Get the version of the core library
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
