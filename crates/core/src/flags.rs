//! Mapping of configuration properties to runtime flags
//!
//! Three properties translate into repeated runtime flags:
//!
//! | property  | flag |
//! |-----------|------|
//! | `expose`  | `-p` |
//! | `volumes` | `-v` |
//! | `env`     | `-e` |
//!
//! Flags are emitted in the order the properties appear in the configuration,
//! not in a fixed priority order. Each item of a property becomes one
//! `[flag, value]` pair after host variable interpolation.

use crate::config::Config;
use crate::errors::ConfigWarning;
use crate::variable::{interpolate_value, EnvLookup};
use serde_json::Value;
use tracing::warn;

/// Runtime flag for a recognized property name
pub fn flag_for(property: &str) -> Option<&'static str> {
    match property {
        "expose" => Some("-p"),
        "volumes" => Some("-v"),
        "env" => Some("-e"),
        _ => None,
    }
}

/// Flag arguments produced from a configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagArgs {
    pub args: Vec<String>,
    pub warnings: Vec<ConfigWarning>,
}

/// Convert the recognized properties of `config` into flag/value pairs
///
/// A recognized property that is not a sequence contributes nothing and is
/// reported once, both through `tracing` and in the returned warnings.
pub fn map_flags(config: &Config, env: &dyn EnvLookup) -> FlagArgs {
    let mut out = FlagArgs::default();

    for (property, value) in config.properties() {
        let Some(flag) = flag_for(property) else {
            continue;
        };

        let Value::Array(items) = value else {
            let warning = ConfigWarning::InvalidArrayProperty {
                property: property.to_string(),
            };
            warn!("{}", warning);
            out.warnings.push(warning);
            continue;
        };

        for item in items {
            out.args.push(flag.to_string());
            out.args.push(interpolate_value(item, env));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn config(value: Value) -> Config {
        Config::from_value(value).unwrap()
    }

    #[test]
    fn test_flag_for() {
        assert_eq!(flag_for("expose"), Some("-p"));
        assert_eq!(flag_for("volumes"), Some("-v"));
        assert_eq!(flag_for("env"), Some("-e"));
        assert_eq!(flag_for("from"), None);
    }

    #[test]
    fn test_items_become_pairs_in_order() {
        let env: HashMap<String, String> = HashMap::new();
        let cfg = config(json!({ "env": ["A=1", "B=2"], "from": "alpine" }));
        let out = map_flags(&cfg, &env);
        assert_eq!(out.args, vec!["-e", "A=1", "-e", "B=2"]);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_emission_follows_property_order() {
        let env: HashMap<String, String> = HashMap::new();
        let forward = config(json!({ "env": ["A=1"], "volumes": ["/a:/a"] }));
        assert_eq!(map_flags(&forward, &env).args, vec!["-e", "A=1", "-v", "/a:/a"]);

        let reverse = config(json!({ "volumes": ["/a:/a"], "env": ["A=1"] }));
        assert_eq!(map_flags(&reverse, &env).args, vec!["-v", "/a:/a", "-e", "A=1"]);
    }

    #[test]
    fn test_values_are_interpolated() {
        let env = HashMap::from([("HOME".to_string(), "/home/me".to_string())]);
        let cfg = config(json!({ "volumes": ["${HOME}/.npm:/root/.npm"], "env": ["X=${UNSET}"] }));
        assert_eq!(
            map_flags(&cfg, &env).args,
            vec!["-v", "/home/me/.npm:/root/.npm", "-e", "X=null"]
        );
    }

    #[test]
    fn test_non_array_property_warns_once_and_is_skipped() {
        let env: HashMap<String, String> = HashMap::new();
        let cfg = config(json!({
            "expose": "8080:8080",
            "env": ["A=1"],
            "volumes": { "a": "b" }
        }));
        let out = map_flags(&cfg, &env);
        assert_eq!(out.args, vec!["-e", "A=1"]);
        assert_eq!(
            out.warnings,
            vec![
                ConfigWarning::InvalidArrayProperty {
                    property: "expose".to_string()
                },
                ConfigWarning::InvalidArrayProperty {
                    property: "volumes".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_non_string_items_are_stringified() {
        let env: HashMap<String, String> = HashMap::new();
        let cfg = config(json!({ "expose": [8080, "9000:9000"] }));
        assert_eq!(map_flags(&cfg, &env).args, vec!["-p", "8080", "-p", "9000:9000"]);
    }

    #[test]
    fn test_unrecognized_properties_ignored() {
        let env: HashMap<String, String> = HashMap::new();
        let cfg = config(json!({ "ports": ["80"], "tasks": { "a": "b" }, "env": [] }));
        let out = map_flags(&cfg, &env);
        assert!(out.args.is_empty());
        assert!(out.warnings.is_empty());
    }
}
