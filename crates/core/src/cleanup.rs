//! Removal of leftover binci containers
//!
//! Every container binci creates carries the [`NAMESPACE_PREFIX`], so leftovers
//! from interrupted runs can be found by name. Two scopes exist:
//!
//! - [`CleanupScope::Stopped`]: only containers that have exited
//! - [`CleanupScope::All`]: every namespaced container, running or not
//!
//! The runtime's `ps` name filter matches substrings, so the listing is
//! filtered again here on the prefix.

use crate::links::NAMESPACE_PREFIX;

/// Which namespaced containers a cleanup removes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupScope {
    /// Exited containers only
    Stopped,
    /// Running and exited containers
    All,
}

/// Runtime arguments listing candidate container names, one per line
pub fn list_args(scope: CleanupScope) -> Vec<String> {
    let mut args = vec![
        "ps".to_string(),
        "-a".to_string(),
        "--filter".to_string(),
        format!("name={}", NAMESPACE_PREFIX),
    ];
    if scope == CleanupScope::Stopped {
        args.push("--filter".to_string());
        args.push("status=exited".to_string());
    }
    args.push("--format".to_string());
    args.push("{{.Names}}".to_string());
    args
}

/// Namespaced container names from `ps` output, in listed order
pub fn select_containers(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|name| name.starts_with(NAMESPACE_PREFIX))
        .map(str::to_string)
        .collect()
}

/// Runtime arguments force-removing the named containers
pub fn removal_args(names: &[String]) -> Vec<String> {
    let mut args = vec!["rm".to_string(), "-f".to_string()];
    args.extend(names.iter().cloned());
    args
}
