//! HTTP client for gateway checks
//!
//! Thin wrapper over reqwest that classifies transport failures.

use anyhow::{Context, Result};
use reqwest::{Client, Url};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// HTTP client errors
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Connection refused to {0}")]
    ConnectionRefused(String),

    #[error("Unknown host {0}")]
    UnknownHost(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("TLS error: {0}")]
    TlsError(String),
}

/// Basic authentication credentials
#[derive(Clone, Debug)]
pub struct BasicAuth {
    pub user: String,
    pub password: Option<String>,
}

/// HTTP response
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status_code: u16,
    pub duration_ms: u64,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// HTTP client for checks
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout_secs: u64,
}

impl HttpClient {
    /// Create client with custom timeout
    pub fn with_timeout(timeout_secs: u64, accept_invalid_certs: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    /// Send a GET request, optionally with preemptive basic auth
    pub async fn get(
        &self,
        url: &str,
        auth: Option<&BasicAuth>,
    ) -> std::result::Result<HttpResponse, HttpError> {
        let parsed = Url::parse(url).map_err(|e| HttpError::InvalidUrl(format!("{url}: {e}")))?;
        let host = parsed.host_str().unwrap_or_default().to_string();
        debug!("Sending GET request to {}", url);

        let mut request = self.client.get(parsed);
        if let Some(auth) = auth {
            request = request.basic_auth(&auth.user, auth.password.as_ref());
        }

        let start = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| self.classify(e, url, &host))?;

        let status = response.status();
        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(
            "Response: {} {} in {}ms",
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            duration_ms
        );

        Ok(HttpResponse {
            status_code: status.as_u16(),
            duration_ms,
        })
    }

    fn classify(&self, error: reqwest::Error, url: &str, host: &str) -> HttpError {
        let chain = error_chain(&error);
        if error.is_timeout() {
            HttpError::Timeout(self.timeout_secs)
        } else if error.is_builder() {
            HttpError::InvalidUrl(url.to_string())
        } else if chain.contains("dns error") || chain.contains("failed to lookup address") {
            HttpError::UnknownHost(host.to_string())
        } else if chain.contains("certificate") || chain.contains("tls") || chain.contains("ssl") {
            HttpError::TlsError(chain)
        } else if error.is_connect() {
            HttpError::ConnectionRefused(url.to_string())
        } else {
            HttpError::RequestFailed(chain)
        }
    }
}

/// Render an error and all of its sources on one line, lowercased
fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ").to_lowercase()
}
