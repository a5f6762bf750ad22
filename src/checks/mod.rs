//! Built-in cluster checks
//!
//! Checks run against a [`ClusterTarget`]: a named cluster plus the
//! variables its settings may reference as `${NAME}`.

mod config;
mod connectivity;
mod gateway;

pub use config::RequiredVariablesCheck;
pub use connectivity::ConnectivityCheck;
pub use gateway::GatewayCheck;

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{RuntimeTest, Severity, TestUnit};

/// Connection settings of the cluster under test
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterTarget {
    pub name: String,
    #[serde(default)]
    pub variables: HashMap<String, String>,
    /// Unset means the configured default applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,
    /// Accept invalid TLS certificates on gateway checks
    #[serde(default)]
    pub ignore_tls: bool,
    /// Checks to leave out for this cluster
    #[serde(default)]
    pub disabled: Vec<String>,
}

/// Connect timeout used when neither the command line, the plan nor the config sets one
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

impl ClusterTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: HashMap::new(),
            connect_timeout_secs: None,
            ignore_tls: false,
            disabled: Vec::new(),
        }
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = Some(secs);
        self
    }

    /// Effective connect timeout, never below one second
    pub fn timeout_secs(&self) -> u64 {
        self.connect_timeout_secs
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .max(1)
    }

    /// Settle the timeout: command line, then the plan, then `configured`
    pub fn resolve_timeout(&mut self, cli: Option<u64>, configured: u64) {
        self.connect_timeout_secs = cli.or(self.connect_timeout_secs).or(Some(configured));
    }

    /// Look a variable up on the target, then in the process environment
    pub fn variable(&self, name: &str) -> Option<String> {
        self.variables
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
    }

    /// Replace every resolvable `${NAME}` in `value`; unresolved references are kept
    pub fn substitute(&self, value: &str) -> String {
        let mut output = String::with_capacity(value.len());
        let mut rest = value;

        while let Some(start) = rest.find("${") {
            output.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    let name = &after[..end];
                    match self.variable(name) {
                        Some(resolved) => output.push_str(&resolved),
                        None => output.push_str(&rest[start..start + 3 + end]),
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    output.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }

        output.push_str(rest);
        output
    }

    pub fn is_disabled(&self, id: &str) -> bool {
        self.disabled.iter().any(|d| d == id)
    }
}

/// Accept ports written either as numbers or strings
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

fn default_failure_severity() -> Severity {
    Severity::Fatal
}

/// Kind-specific settings of a check
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CheckKind {
    /// Open a TCP connection to `host:port`
    Tcp {
        host: String,
        #[serde(default, deserialize_with = "string_or_number")]
        port: String,
        /// A blank port is acceptable when the service may run in HA mode
        #[serde(default)]
        ha_possible: bool,
        #[serde(default = "default_failure_severity")]
        failure_severity: Severity,
    },
    /// GET `url` + `path` and inspect the status code
    Http {
        url: String,
        #[serde(default)]
        path: String,
        #[serde(default)]
        user: Option<String>,
        #[serde(default)]
        password: Option<String>,
        #[serde(default = "default_failure_severity")]
        failure_severity: Severity,
    },
    /// Require variables to be set and non-blank
    Config {
        required: Vec<String>,
        #[serde(default = "default_failure_severity")]
        failure_severity: Severity,
    },
}

impl CheckKind {
    pub fn name(&self) -> &'static str {
        match self {
            CheckKind::Tcp { .. } => "tcp",
            CheckKind::Http { .. } => "http",
            CheckKind::Config { .. } => "config",
        }
    }

    /// Build the runnable check for `unit`
    pub fn build(&self, unit: TestUnit) -> Arc<dyn RuntimeTest<ClusterTarget>> {
        match self {
            CheckKind::Tcp {
                host,
                port,
                ha_possible,
                failure_severity,
            } => Arc::new(
                ConnectivityCheck::new(unit, host.clone(), port.clone())
                    .ha_possible(*ha_possible)
                    .failure_severity(*failure_severity),
            ),
            CheckKind::Http {
                url,
                path,
                user,
                password,
                failure_severity,
            } => {
                let mut check = GatewayCheck::new(unit, url.clone(), path.clone())
                    .failure_severity(*failure_severity);
                if let Some(user) = user {
                    check = check.credentials(user.clone(), password.clone());
                }
                Arc::new(check)
            }
            CheckKind::Config {
                required,
                failure_severity,
            } => Arc::new(
                RequiredVariablesCheck::new(unit, required.clone())
                    .failure_severity(*failure_severity),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_from_target_variables() {
        let target = ClusterTarget::new("dev")
            .with_variable("HOST", "zk.local")
            .with_variable("PORT", "2181");
        assert_eq!(target.substitute("${HOST}:${PORT}"), "zk.local:2181");
        assert_eq!(target.substitute("plain"), "plain");
        assert_eq!(target.substitute(""), "");
    }

    #[test]
    fn test_substitute_keeps_unresolved_references() {
        let target = ClusterTarget::new("dev");
        assert_eq!(
            target.substitute("${RUNTIME_TESTER_SURELY_UNSET_VAR}/x"),
            "${RUNTIME_TESTER_SURELY_UNSET_VAR}/x"
        );
        assert_eq!(target.substitute("open ${brace"), "open ${brace");
    }

    #[test]
    fn test_target_variables_shadow_environment() {
        let target = ClusterTarget::new("dev").with_variable("PATH", "/custom");
        assert_eq!(target.variable("PATH").as_deref(), Some("/custom"));
    }

    #[test]
    fn test_timeout_prefers_command_line_then_plan_then_config() {
        let mut target = ClusterTarget::new("dev");
        assert_eq!(target.timeout_secs(), DEFAULT_TIMEOUT_SECS);
        target.resolve_timeout(None, 30);
        assert_eq!(target.timeout_secs(), 30);

        let mut target = ClusterTarget::new("dev").with_timeout(5);
        target.resolve_timeout(None, 30);
        assert_eq!(target.timeout_secs(), 5);
        target.resolve_timeout(Some(2), 30);
        assert_eq!(target.timeout_secs(), 2);

        assert_eq!(ClusterTarget::new("dev").with_timeout(0).timeout_secs(), 1);
    }

    #[test]
    fn test_check_kind_from_yaml() {
        let yaml = r#"
kind: tcp
host: ${ZK_HOST}
port: "2181"
ha_possible: true
"#;
        let kind: CheckKind = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(kind.name(), "tcp");
        match kind {
            CheckKind::Tcp {
                ha_possible,
                failure_severity,
                ..
            } => {
                assert!(ha_possible);
                assert_eq!(failure_severity, Severity::Fatal);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_build_keeps_unit() {
        let kind = CheckKind::Config {
            required: vec!["A".to_string()],
            failure_severity: Severity::Error,
        };
        let check = kind.build(TestUnit::new("cluster", "vars", "Variables").config_init());
        assert_eq!(check.unit().id, "vars");
        assert!(check.unit().config_init);
    }
}
