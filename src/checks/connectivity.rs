//! TCP connectivity check

use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tracing::debug;

use super::ClusterTarget;
use crate::models::{ResultEntry, ResultSummary, RuntimeTest, Severity, TestUnit};

/// Checks that `host:port` accepts TCP connections
pub struct ConnectivityCheck {
    unit: TestUnit,
    host: String,
    port: String,
    ha_possible: bool,
    failure_severity: Severity,
}

impl ConnectivityCheck {
    pub fn new(unit: TestUnit, host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            unit,
            host: host.into(),
            port: port.into(),
            ha_possible: false,
            failure_severity: Severity::Fatal,
        }
    }

    pub fn ha_possible(mut self, ha_possible: bool) -> Self {
        self.ha_possible = ha_possible;
        self
    }

    pub fn failure_severity(mut self, severity: Severity) -> Self {
        self.failure_severity = severity;
        self
    }

    fn failure(&self, description: &str, message: String) -> ResultEntry {
        ResultEntry::new(self.failure_severity, description, message)
    }

    async fn connect(&self, host: &str, port: &str, limit: Duration) -> ResultEntry {
        let port_number: u16 = match port.parse() {
            Ok(p) => p,
            Err(e) => {
                return ResultEntry::fatal(
                    "Port number format",
                    format!("Unable to parse '{port}' as a port number"),
                )
                .with_error_message(e.to_string())
            }
        };

        let addrs: Vec<SocketAddr> = match timeout(limit, lookup_host((host, port_number))).await {
            Ok(Ok(addrs)) => addrs.collect(),
            Ok(Err(e)) => {
                return self
                    .failure("Unknown hostname", format!("Unable to resolve {host}"))
                    .with_error_message(e.to_string())
            }
            Err(_) => {
                return self.failure(
                    "Unknown hostname",
                    format!("Timed out resolving {host} after {}s", limit.as_secs()),
                )
            }
        };

        if addrs.is_empty() {
            return self.failure("Unknown hostname", format!("Unable to resolve {host}"));
        }

        let mut last_error = String::new();
        for addr in addrs {
            debug!("Connecting to {} for {}", addr, host);
            match timeout(limit, TcpStream::connect(addr)).await {
                Ok(Ok(_stream)) => {
                    return ResultEntry::info(
                        "Connected",
                        format!("Successfully connected to {host}:{port_number}"),
                    )
                }
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => last_error = format!("timed out after {}s", limit.as_secs()),
            }
        }

        self.failure(
            "Unable to connect",
            format!("Unable to connect to {host}:{port_number}"),
        )
        .with_error_message(last_error)
    }
}

#[async_trait]
impl RuntimeTest<ClusterTarget> for ConnectivityCheck {
    fn unit(&self) -> &TestUnit {
        &self.unit
    }

    fn accepts(&self, target: &ClusterTarget) -> bool {
        !target.is_disabled(&self.unit.id)
    }

    async fn run_test(&self, target: &ClusterTarget) -> anyhow::Result<ResultSummary> {
        let host = target.substitute(&self.host).trim().to_string();
        let port = target.substitute(&self.port).trim().to_string();

        let entry = if host.is_empty() {
            self.failure("Hostname blank", "No hostname was provided".to_string())
        } else if port.is_empty() {
            if self.ha_possible {
                ResultEntry::info(
                    "High availability",
                    format!("No port given for {host}, assuming an HA nameservice"),
                )
            } else {
                self.failure("Port blank", "No port was provided".to_string())
            }
        } else {
            let limit = Duration::from_secs(target.timeout_secs());
            self.connect(&host, &port, limit).await
        };

        Ok(entry.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestStatus;
    use tokio::net::TcpListener;

    fn check(host: &str, port: &str) -> ConnectivityCheck {
        ConnectivityCheck::new(TestUnit::new("zookeeper", "zk-connect", "Ping"), host, port)
    }

    fn overall(summary: &ResultSummary) -> &ResultEntry {
        summary.overall.as_ref().unwrap()
    }

    #[tokio::test]
    async fn test_blank_host_uses_failure_severity() {
        let summary = check("  ", "2181")
            .failure_severity(Severity::Error)
            .run_test(&ClusterTarget::new("dev"))
            .await
            .unwrap();
        assert_eq!(overall(&summary).severity, Severity::Error);
        assert_eq!(overall(&summary).description, "Hostname blank");
    }

    #[tokio::test]
    async fn test_blank_port_with_ha_is_info() {
        let target = ClusterTarget::new("dev");
        let ha = check("namenode", "").ha_possible(true).run_test(&target).await.unwrap();
        assert_eq!(ha.status(), TestStatus::Pass);

        let no_ha = check("namenode", "").run_test(&target).await.unwrap();
        assert_eq!(overall(&no_ha).severity, Severity::Fatal);
        assert_eq!(overall(&no_ha).description, "Port blank");
    }

    #[tokio::test]
    async fn test_unparsable_port_is_fatal() {
        let summary = check("localhost", "abc")
            .failure_severity(Severity::Warning)
            .run_test(&ClusterTarget::new("dev"))
            .await
            .unwrap();
        assert_eq!(overall(&summary).severity, Severity::Fatal);
        assert!(overall(&summary).error.is_some());
    }

    #[tokio::test]
    async fn test_connects_to_listener_via_variables() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let target = ClusterTarget::new("dev")
            .with_variable("ZK_HOST", "127.0.0.1")
            .with_variable("ZK_PORT", port.to_string());

        let summary = check("${ZK_HOST}", "${ZK_PORT}")
            .run_test(&target)
            .await
            .unwrap();
        assert_eq!(overall(&summary).severity, Severity::Info);
        assert!(overall(&summary).message.contains(&port.to_string()));
    }

    #[tokio::test]
    async fn test_closed_port_uses_failure_severity() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let summary = check("127.0.0.1", &port.to_string())
            .failure_severity(Severity::Error)
            .run_test(&ClusterTarget::new("dev").with_timeout(2))
            .await
            .unwrap();
        assert_eq!(overall(&summary).severity, Severity::Error);
        assert_eq!(overall(&summary).description, "Unable to connect");
    }

    #[test]
    fn test_disabled_check_is_not_accepted() {
        let mut target = ClusterTarget::new("dev");
        target.disabled.push("zk-connect".to_string());
        assert!(!check("h", "1").accepts(&target));
        assert!(check("h", "1").accepts(&ClusterTarget::new("dev")));
    }
}
