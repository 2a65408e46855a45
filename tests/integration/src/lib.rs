//! Integration tests for the BCA server.
//!
//! These tests spawn the built `bca-server` binary and drive the backchannel
//! lifecycle over HTTP.

#![allow(clippy::disallowed_methods)]

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub handler: String,
    pub pending_requests: usize,
    pub frontchannel_authenticator: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartRequest {
    pub auth_req_id: String,
    pub subject: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub auth_req_id: String,
    pub state: String,
    #[serde(default)]
    pub identity: Option<Identity>,
}

#[derive(Debug, Deserialize)]
pub struct Identity {
    pub subject: String,
    pub attributes: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub authenticator: String,
    pub identity: Identity,
}

// ============================================================================
// Test Server
// ============================================================================

const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

/// A test server instance that manages its own process.
pub struct TestServer {
    process: Child,
    pub base_url: String,
    pub port: u16,
}

impl TestServer {
    /// Start a new test server on the specified port with extra arguments.
    pub async fn start(port: u16, args: &[&str]) -> Result<Self> {
        let server_binary = find_server_binary()?;

        let process = Command::new(&server_binary)
            .arg("--bind")
            .arg(format!("127.0.0.1:{}", port))
            .args(args)
            .env_remove("BCA_CONFIG")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to spawn {}", server_binary.display()))?;

        let server = Self {
            process,
            base_url: format!("http://127.0.0.1:{}", port),
            port,
        };

        server.wait_for_ready().await?;

        Ok(server)
    }

    /// Polls the health endpoint until the listener answers.
    async fn wait_for_ready(&self) -> Result<()> {
        let http = Client::new();
        let health_url = format!("{}/v1/sys/health", self.base_url);
        let deadline = Instant::now() + STARTUP_TIMEOUT;

        while Instant::now() < deadline {
            if let Ok(resp) = http.get(&health_url).send().await {
                if resp.status().is_success() {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        bail!("bca-server on port {} not ready after {:?}", self.port, STARTUP_TIMEOUT)
    }

    /// Get an HTTP client for this server.
    pub fn client(&self) -> BcaClient {
        BcaClient::new(&self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

/// Locates the `bca-server` binary built into the workspace target directory.
fn find_server_binary() -> Result<PathBuf> {
    let workspace = std::env::var("CARGO_MANIFEST_DIR")
        .map(|dir| PathBuf::from(dir).join("../.."))
        .unwrap_or_else(|_| PathBuf::from("."));

    let candidates: Vec<PathBuf> = ["debug", "release"]
        .iter()
        .flat_map(|profile| {
            let dir = workspace.join("target").join(profile);
            [dir.join("bca-server"), dir.join("bca-server.exe")]
        })
        .collect();

    match candidates.iter().find(|path| path.exists()) {
        Some(path) => Ok(path.canonicalize()?),
        None => bail!(
            "bca-server binary not found, build it with 'cargo build -p bca-server' (looked in {:?})",
            candidates
        ),
    }
}

// ============================================================================
// Test Client
// ============================================================================

/// HTTP client for testing the BCA API.
pub struct BcaClient {
    client: Client,
    base_url: String,
}

impl BcaClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let resp = self.client.get(self.url("/v1/sys/health")).send().await?;
        Ok(resp.json().await?)
    }

    /// Starts a request.
    pub async fn start(&self, id: &str, subject: &str) -> Result<()> {
        if let Err(error) = self.try_start(id, subject).await? {
            bail!("Start failed: {} ({})", error.error, error.code);
        }
        Ok(())
    }

    /// Starts a request, returning the API error body when it is refused.
    pub async fn try_start(
        &self,
        id: &str,
        subject: &str,
    ) -> Result<std::result::Result<(), ErrorResponse>> {
        let req = StartRequest {
            auth_req_id: id.to_string(),
            subject: subject.to_string(),
        };
        self.post_start(serde_json::to_value(&req)?).await
    }

    /// Posts an arbitrary body to the start endpoint.
    pub async fn post_start(
        &self,
        body: serde_json::Value,
    ) -> Result<std::result::Result<(), ErrorResponse>> {
        let resp = self
            .client
            .post(self.url("/v1/backchannel/authentications"))
            .json(&body)
            .send()
            .await?;
        if resp.status() == StatusCode::ACCEPTED {
            return Ok(Ok(()));
        }

        let status = resp.status();
        let text = resp.text().await?;
        let error: ErrorResponse = serde_json::from_str(&text)
            .with_context(|| format!("Start answered {} with a non-API body: {}", status, text))?;
        Ok(Err(error))
    }

    pub async fn status(&self, id: &str) -> Result<StatusResponse> {
        let resp = self
            .client
            .get(self.url(&format!("/v1/backchannel/authentications/{}", id)))
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!("Status failed: {}", resp.text().await?);
        }
        Ok(resp.json().await?)
    }

    pub async fn cancel(&self, id: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.url(&format!("/v1/backchannel/authentications/{}", id)))
            .send()
            .await?;
        if resp.status() != StatusCode::NO_CONTENT {
            bail!("Cancel failed: {}", resp.text().await?);
        }
        Ok(())
    }

    pub async fn login(&self) -> Result<LoginResponse> {
        let resp = self
            .client
            .get(self.url("/v1/frontchannel/login"))
            .send()
            .await?;
        if !resp.status().is_success() {
            bail!("Login failed: {}", resp.text().await?);
        }
        Ok(resp.json().await?)
    }

    pub async fn auth_done(&self, token: Option<&str>) -> Result<serde_json::Value> {
        let mut req = self.client.post(self.url("/auth-done"));
        if let Some(token) = token {
            req = req.form(&[("token", token)]);
        }
        let resp = req.send().await?;
        Ok(resp.json().await?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use std::io::Write;
    use std::sync::atomic::{AtomicU16, Ordering};

    // Each test gets its own listener
    static PORT_COUNTER: AtomicU16 = AtomicU16::new(18100);

    fn next_port() -> u16 {
        PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_server_health() {
        let server = TestServer::start(
            next_port(),
            &["--frontchannel-authenticator", "test"],
        )
        .await
        .unwrap();

        let health = server.client().health().await.unwrap();

        assert_eq!(health.status, "ok");
        assert_eq!(health.handler, "bca_test");
        assert_eq!(health.pending_requests, 0);
        assert_eq!(health.frontchannel_authenticator.as_deref(), Some("test"));
        assert!(!health.version.is_empty());
    }

    #[tokio::test]
    async fn test_started_then_succeeded() {
        let server = TestServer::start(next_port(), &[]).await.unwrap();
        let client = server.client();

        client.start("req-1", "alice").await.unwrap();

        let first = client.status("req-1").await.unwrap();
        assert_eq!(first.auth_req_id, "req-1");
        assert_eq!(first.state, "STARTED");
        assert!(first.identity.is_none());

        let second = client.status("req-1").await.unwrap();
        assert_eq!(second.state, "SUCCEEDED");
        let identity = second.identity.unwrap();
        assert_eq!(identity.subject, "alice");
        assert_eq!(identity.attributes, serde_json::json!({}));

        // Resolved requests keep answering the same outcome
        let third = client.status("req-1").await.unwrap();
        assert_eq!(third.state, "SUCCEEDED");
    }

    #[tokio::test]
    async fn test_rejecting_subject() {
        let server = TestServer::start(next_port(), &["--rejecting-subject", "mallory"])
            .await
            .unwrap();
        let client = server.client();

        client.start("bad", "mallory").await.unwrap();
        client.start("good", "alice").await.unwrap();
        client.status("bad").await.unwrap();
        client.status("good").await.unwrap();

        let bad = client.status("bad").await.unwrap();
        assert_eq!(bad.state, "FAILED");
        assert!(bad.identity.is_none());
        assert_eq!(client.status("good").await.unwrap().state, "SUCCEEDED");
    }

    #[tokio::test]
    async fn test_delay() {
        let server = TestServer::start(next_port(), &["--delay", "2"])
            .await
            .unwrap();
        let client = server.client();

        client.start("req-1", "alice").await.unwrap();
        assert_eq!(client.status("req-1").await.unwrap().state, "STARTED");
        assert_eq!(client.status("req-1").await.unwrap().state, "STARTED");

        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(client.status("req-1").await.unwrap().state, "SUCCEEDED");
    }

    #[tokio::test]
    async fn test_unknown_and_cancelled_are_expired() {
        let server = TestServer::start(next_port(), &[]).await.unwrap();
        let client = server.client();

        assert_eq!(client.status("never").await.unwrap().state, "EXPIRED");

        client.start("req-1", "alice").await.unwrap();
        client.status("req-1").await.unwrap();
        client.cancel("req-1").await.unwrap();

        let after = client.status("req-1").await.unwrap();
        assert_eq!(after.state, "EXPIRED");
        assert!(after.identity.is_none());

        // Cancelling again or cancelling an unknown id is fine
        client.cancel("req-1").await.unwrap();
        client.cancel("never").await.unwrap();
        assert_eq!(client.health().await.unwrap().pending_requests, 0);
    }

    #[tokio::test]
    async fn test_duplicate_start_rejected() {
        let server = TestServer::start(next_port(), &[]).await.unwrap();
        let client = server.client();

        client.start("req-1", "alice").await.unwrap();
        let error = client
            .try_start("req-1", "mallory")
            .await
            .unwrap()
            .unwrap_err();

        assert_eq!(error.code, "DUPLICATE_REQUEST");
        assert!(error.error.contains("req-1"));
    }

    #[tokio::test]
    async fn test_malformed_start_rejected() {
        let server = TestServer::start(next_port(), &[]).await.unwrap();
        let client = server.client();

        let error = client
            .post_start(serde_json::json!({ "auth_req_id": "req-1" }))
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(error.code, "INVALID_REQUEST");

        let error = client.try_start("req-2", "").await.unwrap().unwrap_err();
        assert_eq!(error.code, "INVALID_REQUEST");

        assert!(client.start("req-3", "").await.is_err());
        assert_eq!(client.health().await.unwrap().pending_requests, 0);
    }

    #[tokio::test]
    async fn test_request_ttl() {
        let server = TestServer::start(next_port(), &["--request-ttl", "1"])
            .await
            .unwrap();
        let client = server.client();

        client.start("req-1", "alice").await.unwrap();
        assert_eq!(client.status("req-1").await.unwrap().state, "STARTED");

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(client.status("req-1").await.unwrap().state, "EXPIRED");
    }

    #[tokio::test]
    async fn test_concurrent_clients() {
        let server = TestServer::start(next_port(), &["--rejecting-subject", "user-7"])
            .await
            .unwrap();
        let base_url = server.base_url.clone();

        let mut handles = Vec::new();
        for i in 0..20 {
            let base_url = base_url.clone();
            handles.push(tokio::spawn(async move {
                let client = BcaClient::new(&base_url);
                let id = format!("req-{i}");
                let subject = format!("user-{i}");
                client.start(&id, &subject).await.unwrap();
                let first = client.status(&id).await.unwrap();
                let second = client.status(&id).await.unwrap();
                (subject, first, second)
            }));
        }

        for handle in handles {
            let (subject, first, second) = handle.await.unwrap();
            assert_eq!(first.state, "STARTED");
            if subject == "user-7" {
                assert_eq!(second.state, "FAILED");
            } else {
                assert_eq!(second.state, "SUCCEEDED");
                assert_eq!(second.identity.unwrap().subject, subject);
            }
        }
    }

    #[tokio::test]
    async fn test_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[backchannel]\nrejecting_subject = \"mallory\"\n\n[frontchannel]\nusername = \"alice\""
        )
        .unwrap();

        let server = TestServer::start(
            next_port(),
            &["--config", file.path().to_str().unwrap()],
        )
        .await
        .unwrap();
        let client = server.client();

        let login = client.login().await.unwrap();
        assert_eq!(login.authenticator, "test");
        assert_eq!(login.identity.subject, "alice");

        client.start("req-1", "mallory").await.unwrap();
        client.status("req-1").await.unwrap();
        assert_eq!(client.status("req-1").await.unwrap().state, "FAILED");
    }

    #[tokio::test]
    async fn test_auth_done() {
        let server = TestServer::start(next_port(), &[]).await.unwrap();
        let client = server.client();

        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"alice","acr":"urn:test"}"#);
        let token = format!("eyJhbGciOiJub25lIn0.{payload}.sig");
        let claims = client.auth_done(Some(&token)).await.unwrap();
        assert_eq!(claims["sub"], "alice");
        assert_eq!(claims["acr"], "urn:test");

        let missing = client.auth_done(None).await.unwrap();
        assert_eq!(missing["sub"], "fail");
        assert_eq!(missing["reason"], "no auth token in post");

        let not_jwt = client.auth_done(Some("abc")).await.unwrap();
        assert_eq!(not_jwt["reason"], "auth token not a jwt");
    }
}
