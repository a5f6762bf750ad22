//! HTTP gateway check
//!
//! Issues a GET against a gateway endpoint and maps the response code
//! onto a result entry.

use async_trait::async_trait;
use reqwest::Url;

use super::ClusterTarget;
use crate::http::{BasicAuth, HttpClient, HttpError};
use crate::models::{ResultEntry, ResultSummary, RuntimeTest, Severity, TestUnit};

/// Checks that a gateway endpoint answers with 200
pub struct GatewayCheck {
    unit: TestUnit,
    url: String,
    path: String,
    user: Option<String>,
    password: Option<String>,
    failure_severity: Severity,
}

impl GatewayCheck {
    pub fn new(unit: TestUnit, url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            unit,
            url: url.into(),
            path: path.into(),
            user: None,
            password: None,
            failure_severity: Severity::Fatal,
        }
    }

    pub fn credentials(mut self, user: impl Into<String>, password: Option<String>) -> Self {
        self.user = Some(user.into());
        self.password = password;
        self
    }

    pub fn failure_severity(mut self, severity: Severity) -> Self {
        self.failure_severity = severity;
        self
    }

    fn failure(&self, description: &str, message: String) -> ResultEntry {
        ResultEntry::new(self.failure_severity, description, message)
    }

    fn full_url(&self, target: &ClusterTarget) -> String {
        let base = target.substitute(&self.url);
        let path = target.substitute(&self.path);
        let base = base.trim().trim_end_matches('/');
        let path = path.trim();
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path.trim_start_matches('/'))
        }
    }

    fn auth(&self, target: &ClusterTarget) -> Option<BasicAuth> {
        let user = target.substitute(self.user.as_deref()?);
        // Unresolved `${NAME}` means no credentials were configured
        if user.trim().is_empty() || user.contains("${") {
            return None;
        }
        Some(BasicAuth {
            user,
            password: self.password.as_deref().map(|p| target.substitute(p)),
        })
    }

    fn from_status(&self, status: u16, url: &str, user: &str) -> ResultEntry {
        match status {
            200 => ResultEntry::info("Gateway reachable", format!("Successfully reached {url}")),
            404 => self.failure(
                "Service not found",
                format!("{url} returned 404, the service may not be exposed by the gateway"),
            ),
            403 => self.failure(
                "Forbidden",
                format!("User '{user}' is not permitted to access {url}"),
            ),
            401 => self.failure(
                "Unauthorized",
                format!("User '{user}' could not be authenticated at {url}"),
            ),
            other => ResultEntry::warning(
                "Unexpected return code",
                format!("Request to {url} as '{user}' returned {other}"),
            ),
        }
    }

    fn from_error(&self, error: HttpError, url: &str) -> ResultEntry {
        let entry = match &error {
            HttpError::InvalidUrl(_) => {
                ResultEntry::fatal("Invalid URL", format!("Unable to use {url} as a URL"))
            }
            HttpError::UnknownHost(host) => {
                self.failure("Unknown hostname", format!("Unable to resolve {host}"))
            }
            HttpError::TlsError(_) => {
                self.failure("TLS failure", format!("TLS handshake with {url} failed"))
            }
            HttpError::Timeout(_) | HttpError::ConnectionRefused(_) | HttpError::RequestFailed(_) => {
                self.failure("Request failed", format!("Unable to execute request to {url}"))
            }
        };
        entry.with_error_message(error.to_string())
    }
}

#[async_trait]
impl RuntimeTest<ClusterTarget> for GatewayCheck {
    fn unit(&self) -> &TestUnit {
        &self.unit
    }

    fn accepts(&self, target: &ClusterTarget) -> bool {
        !target.is_disabled(&self.unit.id)
    }

    async fn run_test(&self, target: &ClusterTarget) -> anyhow::Result<ResultSummary> {
        let url = self.full_url(target);
        if url.is_empty() {
            return Ok(self
                .failure("Hostname blank", "No gateway URL was provided".to_string())
                .into());
        }

        let parsed = match Url::parse(&url) {
            Ok(parsed) => parsed,
            Err(e) => {
                return Ok(ResultEntry::fatal("Invalid URL", format!("Unable to use {url} as a URL"))
                    .with_error_message(e.to_string())
                    .into())
            }
        };
        if parsed.host_str().map_or(true, |h| h.trim().is_empty()) {
            return Ok(self
                .failure("Hostname blank", format!("No hostname in {url}"))
                .into());
        }

        let client = HttpClient::with_timeout(target.timeout_secs(), target.ignore_tls)?;
        let auth = self.auth(target);
        let user = auth.as_ref().map(|a| a.user.clone()).unwrap_or_default();

        let entry = match client.get(&url, auth.as_ref()).await {
            Ok(response) => self.from_status(response.status_code, &url, &user),
            Err(e) => self.from_error(e, &url),
        };
        Ok(entry.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer one request with `status` and hand back the raw request text
    async fn serve_once(status: &'static str) -> (u16, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response =
                format!("HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });
        (port, handle)
    }

    fn check(url: &str, path: &str) -> GatewayCheck {
        GatewayCheck::new(TestUnit::new("gateway", "knox", "Gateway"), url, path)
    }

    fn overall(summary: &ResultSummary) -> &ResultEntry {
        summary.overall.as_ref().unwrap()
    }

    #[test]
    fn test_full_url_joins_path() {
        let target = ClusterTarget::new("dev").with_variable("GW", "https://gw:8443/gateway/");
        assert_eq!(
            check("${GW}", "/webhdfs/v1").full_url(&target),
            "https://gw:8443/gateway/webhdfs/v1"
        );
        assert_eq!(check("http://gw", "").full_url(&target), "http://gw");
    }

    #[tokio::test]
    async fn test_ok_response_is_info() {
        let (port, server) = serve_once("200 OK").await;
        let summary = check(&format!("http://127.0.0.1:{port}"), "/status")
            .run_test(&ClusterTarget::new("dev"))
            .await
            .unwrap();
        assert_eq!(overall(&summary).severity, Severity::Info);
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /status "));
    }

    #[tokio::test]
    async fn test_not_found_uses_failure_severity() {
        let (port, _server) = serve_once("404 Not Found").await;
        let summary = check(&format!("http://127.0.0.1:{port}"), "")
            .failure_severity(Severity::Error)
            .run_test(&ClusterTarget::new("dev"))
            .await
            .unwrap();
        assert_eq!(overall(&summary).severity, Severity::Error);
        assert_eq!(overall(&summary).description, "Service not found");
    }

    #[tokio::test]
    async fn test_unauthorized_sends_credentials() {
        let (port, server) = serve_once("401 Unauthorized").await;
        let target = ClusterTarget::new("dev").with_variable("GW_PASSWORD", "secret");
        let summary = check(&format!("http://127.0.0.1:{port}"), "")
            .credentials("admin", Some("${GW_PASSWORD}".to_string()))
            .run_test(&target)
            .await
            .unwrap();
        assert_eq!(overall(&summary).description, "Unauthorized");
        assert!(overall(&summary).message.contains("admin"));

        let request = server.await.unwrap().to_lowercase();
        // base64("admin:secret")
        assert!(request.contains("authorization: basic ywrtaw46c2vjcmv0"));
    }

    #[test]
    fn test_unresolved_user_sends_no_credentials() {
        let target = ClusterTarget::new("dev");
        let check = check("http://gw", "")
            .credentials("${RUNTIME_TESTER_SURELY_UNSET_USER}", None);
        assert!(check.auth(&target).is_none());

        let target = target.with_variable("RUNTIME_TESTER_SURELY_UNSET_USER", "svc");
        assert_eq!(check.auth(&target).unwrap().user, "svc");
    }

    #[tokio::test]
    async fn test_other_codes_are_warnings() {
        let (port, _server) = serve_once("503 Service Unavailable").await;
        let summary = check(&format!("http://127.0.0.1:{port}"), "")
            .run_test(&ClusterTarget::new("dev"))
            .await
            .unwrap();
        assert_eq!(overall(&summary).severity, Severity::Warning);
        assert!(overall(&summary).message.contains("503"));
    }

    #[tokio::test]
    async fn test_invalid_url_is_fatal() {
        let summary = check("::not a url::", "")
            .failure_severity(Severity::Warning)
            .run_test(&ClusterTarget::new("dev"))
            .await
            .unwrap();
        assert_eq!(overall(&summary).severity, Severity::Fatal);
    }

    #[tokio::test]
    async fn test_blank_url_uses_failure_severity() {
        let summary = check("  ", "")
            .failure_severity(Severity::Error)
            .run_test(&ClusterTarget::new("dev"))
            .await
            .unwrap();
        assert_eq!(overall(&summary).severity, Severity::Error);
        assert_eq!(overall(&summary).description, "Hostname blank");
    }
}
