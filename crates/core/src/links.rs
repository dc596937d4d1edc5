//! Container naming and service links

use crate::config::Config;
use crate::errors::ConfigWarning;
use tracing::warn;

/// Prefix applied to every container binci creates
pub const NAMESPACE_PREFIX: &str = "dl_";

/// Namespaced container name for a raw config key
pub fn namespaced(name: &str) -> String {
    format!("{}{}", NAMESPACE_PREFIX, name)
}

/// Link arguments produced from a configuration's services
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkArgs {
    pub args: Vec<String>,
    pub warnings: Vec<ConfigWarning>,
}

/// `--link` arguments for every declared service, in declaration order
pub fn build_links(config: &Config) -> LinkArgs {
    let list = config.services();
    for warning in &list.warnings {
        warn!("{}", warning);
    }

    let args = list
        .services
        .iter()
        .flat_map(|service| {
            let name = namespaced(&service.name);
            ["--link".to_string(), format!("{}:{}", name, name)]
        })
        .collect();

    LinkArgs {
        args,
        warnings: list.warnings,
    }
}
