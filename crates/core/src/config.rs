//! Configuration model and loading
//!
//! A binci configuration is kept as an ordered list of `(name, value)` pairs.
//! The order in which properties were declared matters: the flags produced for
//! `expose`, `volumes` and `env` follow it, so the model never passes through an
//! unordered map. Values stay as [`serde_json::Value`] so that type problems in
//! recognized properties can be reported as warnings instead of hard parse
//! failures.
//!
//! ## Files
//!
//! [`ConfigLoader`] reads YAML (`binci.yml`, the default) and JSON-with-comments
//! (`.json`, `.jsonc`, `.json5`) files. The root must be a mapping.

use crate::errors::{ConfigError, ConfigWarning, Result};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, instrument};

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "binci.yml";

/// Property names understood by the invocation builder
const KNOWN_KEYS: &[&str] = &[
    "from", "expose", "volumes", "env", "task", "tasks", "exec", "before", "after", "services",
];

/// Ordered configuration for a primary or service container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    properties: IndexMap<String, Value>,
}

/// A declared service: its raw name and nested configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDescriptor {
    pub name: String,
    pub config: Config,
}

/// Parsed `services` list together with problems found while reading it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceList {
    pub services: Vec<ServiceDescriptor>,
    pub warnings: Vec<ConfigWarning>,
}

/// Which declared services to leave out of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceSelection {
    /// Drop every service
    All,
    /// Drop services with these names
    Named(BTreeSet<String>),
}

/// Values supplied on the command line that take precedence over the file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Replacement base image
    pub from: Option<String>,
    /// Task words; joined with spaces into `task`
    pub task: Vec<String>,
    /// Treat the task words as a literal command
    pub exec: bool,
}

impl Config {
    /// Build a configuration from already ordered properties
    pub fn from_properties(properties: IndexMap<String, Value>) -> Self {
        Self { properties }
    }

    /// Build a configuration from a JSON value; the root must be an object
    pub fn from_value(value: Value) -> std::result::Result<Self, ConfigError> {
        match value {
            Value::Object(map) => Ok(Self {
                properties: map.into_iter().collect(),
            }),
            other => Err(ConfigError::Validation {
                message: format!(
                    "configuration root must be a mapping, found {}",
                    value_kind(&other)
                ),
            }),
        }
    }

    /// Properties in declaration order
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Raw value of a property
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Set a property, keeping its position if it already exists
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.properties.insert(key.into(), value);
    }

    /// Base image reference; `null` and empty strings count as absent
    pub fn from_image(&self) -> Option<String> {
        self.present_string("from")
    }

    /// Task name, or the literal command when [`Config::exec`] is true
    pub fn task(&self) -> Option<String> {
        self.present_string("task")
    }

    /// Whether `task` is a literal command
    pub fn exec(&self) -> bool {
        matches!(self.get("exec"), Some(Value::Bool(true)))
    }

    /// Command run before the task
    pub fn before(&self) -> Option<String> {
        self.present_string("before")
    }

    /// Command run after the task
    pub fn after(&self) -> Option<String> {
        self.present_string("after")
    }

    /// Body of a named task, if declared and non-empty
    pub fn task_body(&self, name: &str) -> Option<String> {
        match self.get("tasks")? {
            Value::Object(tasks) => tasks.get(name).and_then(present_value),
            _ => None,
        }
    }

    /// Declared task names in declaration order
    pub fn task_names(&self) -> Vec<String> {
        match self.get("tasks") {
            Some(Value::Object(tasks)) => tasks.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Declared services in declaration order
    ///
    /// Only the first key of each descriptor is used. A `services` value that
    /// is not a sequence, and descriptors that are not non-empty mappings,
    /// produce warnings and are left out.
    pub fn services(&self) -> ServiceList {
        let mut list = ServiceList::default();
        let entries = match self.get("services") {
            None | Some(Value::Null) => return list,
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                list.warnings.push(ConfigWarning::InvalidArrayProperty {
                    property: "services".to_string(),
                });
                return list;
            }
        };

        for (index, entry) in entries.iter().enumerate() {
            let Some((name, nested)) = entry.as_object().and_then(|map| map.iter().next()) else {
                list.warnings
                    .push(ConfigWarning::InvalidServiceDescriptor { index });
                continue;
            };
            let config = match nested {
                Value::Object(map) => Config {
                    properties: map.clone().into_iter().collect(),
                },
                _ => Config::default(),
            };
            list.services.push(ServiceDescriptor {
                name: name.clone(),
                config,
            });
        }
        list
    }

    /// Copy of this configuration with the selected services removed
    pub fn without_services(&self, selection: &ServiceSelection) -> Config {
        let mut config = self.clone();
        match selection {
            ServiceSelection::All => {
                config.properties.shift_remove("services");
            }
            ServiceSelection::Named(names) => {
                if let Some(Value::Array(entries)) = config.properties.get_mut("services") {
                    entries.retain(|entry| {
                        let first_key = entry.as_object().and_then(|map| map.keys().next());
                        !matches!(first_key, Some(name) if names.contains(name))
                    });
                }
            }
        }
        config
    }

    /// Copy of this configuration with command-line overrides applied
    pub fn with_overrides(&self, overrides: &Overrides) -> Config {
        let mut config = self.clone();
        if let Some(from) = &overrides.from {
            config.set("from", Value::String(from.clone()));
        }
        if !overrides.task.is_empty() {
            config.set("task", Value::String(overrides.task.join(" ")));
            config.set("exec", Value::Bool(overrides.exec));
        }
        config
    }

    /// Top-level keys the builder does not understand
    pub fn unknown_keys(&self) -> Vec<&str> {
        self.properties
            .keys()
            .map(String::as_str)
            .filter(|key| !KNOWN_KEYS.contains(key))
            .collect()
    }

    fn present_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(present_value)
    }
}

impl ServiceSelection {
    /// Build a selection from `--disable` names and the `--disable-all` flag
    ///
    /// A `*` among the names disables every service. Returns `None` when
    /// nothing is disabled.
    pub fn from_flags(names: &[String], disable_all: bool) -> Option<Self> {
        if disable_all || names.iter().any(|n| n == "*") {
            return Some(ServiceSelection::All);
        }
        if names.is_empty() {
            return None;
        }
        Some(ServiceSelection::Named(names.iter().cloned().collect()))
    }
}

/// Scalar value as text, treating `null`, `false` and `""` as absent
fn present_value(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        other => Some(crate::variable::value_to_string(other)),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML document
    Yaml,
    /// JSON with comments and trailing commas
    Json5,
}

impl ConfigFormat {
    /// Pick a format from the file extension; anything unrecognized is YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json" | "jsonc" | "json5") => ConfigFormat::Json5,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// Reads configuration files from disk
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a configuration file, choosing the parser from its extension
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load_from_path(path: &Path) -> Result<Config> {
        debug!("Loading configuration from {}", path.display());

        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            debug!("Failed to read configuration file: {}", e);
            ConfigError::Io(e)
        })?;

        let config = Self::parse_str(&content, ConfigFormat::from_path(path))?;
        debug!(
            "Loaded configuration with {} top-level properties",
            config.properties.len()
        );
        Ok(config)
    }

    /// Parse configuration text in the given format
    pub fn parse_str(content: &str, format: ConfigFormat) -> Result<Config> {
        let raw_value: Value = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| ConfigError::Parsing {
                message: format!("YAML parsing error: {}", e),
            })?,
            ConfigFormat::Json5 => json5::from_str(content).map_err(|e| ConfigError::Parsing {
                message: format!("JSON parsing error: {}", e),
            })?,
        };

        let config = Config::from_value(raw_value)?;
        for key in config.unknown_keys() {
            debug!("Ignoring unknown configuration property '{}'", key);
        }
        if config.from_image().is_none() {
            debug!("Configuration does not declare 'from'");
        }
        Ok(config)
    }
}
