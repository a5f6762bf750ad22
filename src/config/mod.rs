//! Configuration module
//!
//! Handles application settings and test plan files.

mod env;
mod file;
mod plan;

pub use env::{print_env_help, EnvConfig, ENV_PREFIX};
pub use file::{expand_path, ConfigFile};
pub use plan::{CheckSpec, PlanError, TestPlan};

use serde::{Deserialize, Serialize};

use crate::checks::DEFAULT_TIMEOUT_SECS;
use crate::output::DisplayComparator;

/// Application configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Maximum checks running at once
    pub max_concurrent: usize,

    /// Connect timeout applied to checks, in seconds
    pub connect_timeout_secs: u64,

    /// Preferred module order for display; unlisted modules follow by name
    pub module_order: Vec<String>,

    /// Default output format
    pub format: String,

    /// Default log level
    pub log_level: String,

    /// Colored terminal output
    pub color: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            connect_timeout_secs: DEFAULT_TIMEOUT_SECS,
            module_order: Vec::new(),
            format: "table".to_string(),
            log_level: "info".to_string(),
            color: true,
        }
    }
}

impl AppConfig {
    /// Load from the default file location, then apply environment overrides
    pub fn resolve() -> anyhow::Result<Self> {
        let env = EnvConfig::load();
        let file = match &env.config_file {
            Some(path) => ConfigFile::load(expand_path(path))?,
            None => ConfigFile::load_default()?,
        };

        let mut config = file.app;
        env.apply(&mut config);
        Ok(config)
    }

    pub fn comparator(&self) -> DisplayComparator {
        DisplayComparator::from_order(self.module_order.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.max_concurrent, 4);
        assert_eq!(config.format, "table");
        assert!(config.module_order.is_empty());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("max_concurrent: 8\n").unwrap();
        assert_eq!(config.max_concurrent, 8);
        assert_eq!(config.connect_timeout_secs, 10);
    }

    #[test]
    fn test_comparator_follows_module_order() {
        let config = AppConfig {
            module_order: vec!["zookeeper".to_string(), "hdfs".to_string()],
            ..Default::default()
        };
        let cmp = config.comparator();
        assert_eq!(cmp.rank("zookeeper"), Some(0));
        assert_eq!(cmp.rank("hdfs"), Some(1));
    }
}
