//! Host environment variable interpolation
//!
//! Configuration values may reference host environment variables with
//! `${NAME}` tokens. Every token is replaced with the value of `NAME` taken
//! from an injected [`EnvLookup`]. A variable that is not set resolves to the
//! literal text `null` ([`UNRESOLVED_VARIABLE_TEXT`]); shell commands built from
//! these values rely on that text being present.
//!
//! There is no escaping mechanism, and tokens do not nest: the pattern stops
//! at the first closing brace.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Regular expression pattern for host variable tokens
const VARIABLE_PATTERN: &str = r"\$\{([^}]+)\}";

/// Text substituted for a variable that is not set on the host
pub const UNRESOLVED_VARIABLE_TEXT: &str = "null";

static VARIABLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(VARIABLE_PATTERN).expect("variable pattern should be valid"));

/// Read-only view of an environment
pub trait EnvLookup {
    /// Value of `name`, or `None` when it is not set
    fn lookup(&self, name: &str) -> Option<String>;
}

/// The current process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct HostEnv;

impl EnvLookup for HostEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<T: EnvLookup + ?Sized> EnvLookup for &T {
    fn lookup(&self, name: &str) -> Option<String> {
        (**self).lookup(name)
    }
}

/// Resolve one variable name, falling back to [`UNRESOLVED_VARIABLE_TEXT`]
pub fn resolve(name: &str, env: &dyn EnvLookup) -> String {
    match env.lookup(name) {
        Some(value) => value,
        None => {
            debug!("Host variable '{}' is not set", name);
            UNRESOLVED_VARIABLE_TEXT.to_string()
        }
    }
}

/// Replace every `${NAME}` token in `input` with its host value
///
/// ```rust
/// use binci_core::variable::interpolate;
/// use std::collections::HashMap;
///
/// let env = HashMap::from([("USER".to_string(), "me".to_string())]);
/// assert_eq!(interpolate("hi ${USER}, ${NOPE}", &env), "hi me, null");
/// ```
pub fn interpolate(input: &str, env: &dyn EnvLookup) -> String {
    VARIABLE_REGEX
        .replace_all(input, |caps: &Captures| resolve(&caps[1], env))
        .into_owned()
}

/// Stringify a configuration value and interpolate it
pub fn interpolate_value(value: &Value, env: &dyn EnvLookup) -> String {
    interpolate(&value_to_string(value), env)
}

/// Textual form of a configuration scalar
///
/// Strings are taken verbatim; everything else uses its JSON rendering, so
/// `null` becomes `"null"` and `8080` becomes `"8080"`.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
