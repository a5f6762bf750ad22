//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

use super::AppConfig;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "RUNTIME_TESTER";

/// Overrides read from `RUNTIME_TESTER_*` variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Config file from RUNTIME_TESTER_CONFIG
    pub config_file: Option<String>,
    /// Worker limit from RUNTIME_TESTER_MAX_CONCURRENT
    pub max_concurrent: Option<usize>,
    /// Connect timeout from RUNTIME_TESTER_TIMEOUT
    pub timeout: Option<u64>,
    /// Output format from RUNTIME_TESTER_FORMAT
    pub format: Option<String>,
    /// Log level from RUNTIME_TESTER_LOG
    pub log_level: Option<String>,
    /// Colored output from RUNTIME_TESTER_COLOR
    pub color: Option<bool>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            config_file: get_env("CONFIG"),
            max_concurrent: get_env_parse("MAX_CONCURRENT"),
            timeout: get_env_parse("TIMEOUT"),
            format: get_env("FORMAT"),
            log_level: get_env("LOG"),
            color: get_env_bool("COLOR"),
        }
    }

    pub fn has_any(&self) -> bool {
        self.config_file.is_some()
            || self.max_concurrent.is_some()
            || self.timeout.is_some()
            || self.format.is_some()
            || self.log_level.is_some()
            || self.color.is_some()
    }

    /// Overwrite every field of `config` that has an environment value
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(max) = self.max_concurrent {
            config.max_concurrent = max;
        }
        if let Some(timeout) = self.timeout {
            config.connect_timeout_secs = timeout;
        }
        if let Some(format) = &self.format {
            config.format = format.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(color) = self.color {
            config.color = color;
        }
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| parse_bool(&v))
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}

/// Print all RUNTIME_TESTER environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_CONFIG          Path to configuration file");
    println!("  {ENV_PREFIX}_MAX_CONCURRENT  Maximum checks running at once");
    println!("  {ENV_PREFIX}_TIMEOUT         Connect timeout in seconds");
    println!("  {ENV_PREFIX}_FORMAT          Output format (table, json, csv, summary)");
    println!("  {ENV_PREFIX}_LOG             Log level (error, warn, info, debug, trace)");
    println!("  {ENV_PREFIX}_COLOR           Colored output (true/false)");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::ClusterTarget;

    #[test]
    fn test_env_config_default() {
        let config = EnvConfig::default();
        assert!(config.max_concurrent.is_none());
        assert!(!config.has_any());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("Yes"));
        assert!(parse_bool("1"));
        assert!(parse_bool("enabled"));
        assert!(!parse_bool("off"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn test_apply_overrides_only_set_fields() {
        let env = EnvConfig {
            max_concurrent: Some(2),
            format: Some("json".to_string()),
            ..Default::default()
        };
        let mut config = AppConfig::default();
        env.apply(&mut config);

        assert_eq!(config.max_concurrent, 2);
        assert_eq!(config.format, "json");
        assert_eq!(config.connect_timeout_secs, AppConfig::default().connect_timeout_secs);
    }

    #[test]
    fn test_env_timeout_reaches_targets_without_one() {
        let env = EnvConfig {
            timeout: Some(25),
            ..Default::default()
        };
        let mut config = AppConfig::default();
        env.apply(&mut config);

        let mut target = ClusterTarget::new("dev");
        target.resolve_timeout(None, config.connect_timeout_secs);
        assert_eq!(target.timeout_secs(), 25);

        let mut target = ClusterTarget::new("dev").with_timeout(3);
        target.resolve_timeout(None, config.connect_timeout_secs);
        assert_eq!(target.timeout_secs(), 3);
    }
}
