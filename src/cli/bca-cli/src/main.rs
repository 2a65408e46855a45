//! BCA CLI - Command line interface.

use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::{rngs::OsRng, RngCore};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

// ============================================================================
// CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "bca")]
#[command(about = "BCA CLI - Start, poll and cancel backchannel authentications")]
#[command(version)]
struct Cli {
    /// BCA server address
    #[arg(long, default_value = "http://localhost:8100", env = "BCA_ADDR")]
    addr: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server status
    Health,
    /// Start a backchannel authentication
    Start {
        /// Subject to authenticate
        subject: String,
        /// Request id (random when omitted)
        #[arg(long)]
        id: Option<String>,
    },
    /// Check the state of a request once
    Status {
        /// Request id
        id: String,
    },
    /// Poll a request until it resolves
    Poll {
        /// Request id
        id: String,
        /// Seconds between polls
        #[arg(long, default_value = "1")]
        interval: u64,
        /// Give up after this many seconds
        #[arg(long, default_value = "60")]
        timeout: u64,
    },
    /// Cancel a request
    Cancel {
        /// Request id
        id: String,
    },
    /// Sign in through the auto-login frontchannel
    Login,
    /// Post a token to the auth-done endpoint and print its claims
    AuthDone {
        /// Compact JWT
        token: String,
    },
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    version: String,
    handler: String,
    pending_requests: usize,
    frontchannel_authenticator: Option<String>,
}

#[derive(Serialize)]
struct StartRequest<'a> {
    auth_req_id: &'a str,
    subject: &'a str,
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    auth_req_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    state: String,
    #[serde(default)]
    identity: Option<Identity>,
}

#[derive(Debug, Deserialize, Serialize)]
struct Identity {
    subject: String,
    #[serde(default)]
    attributes: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    authenticator: String,
    identity: Identity,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// HTTP Client
// ============================================================================

struct BcaClient {
    client: Client,
    base_url: String,
}

impl BcaClient {
    fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn fail(resp: reqwest::Response, what: &str) -> anyhow::Error {
        let error: ErrorResponse = resp.json().await.unwrap_or(ErrorResponse {
            error: "Unknown error".into(),
        });
        anyhow::anyhow!("{} failed: {}", what, error.error)
    }

    async fn get_health(&self) -> Result<HealthResponse> {
        let resp = self
            .client
            .get(self.url("/v1/sys/health"))
            .send()
            .await
            .context("Failed to connect to server")?;

        if !resp.status().is_success() {
            return Err(Self::fail(resp, "Health check").await);
        }

        resp.json().await.context("Failed to parse response")
    }

    async fn start(&self, id: &str, subject: &str) -> Result<StartResponse> {
        let req = StartRequest {
            auth_req_id: id,
            subject,
        };

        let resp = self
            .client
            .post(self.url("/v1/backchannel/authentications"))
            .json(&req)
            .send()
            .await
            .context("Failed to connect to server")?;

        if !resp.status().is_success() {
            return Err(Self::fail(resp, "Start").await);
        }

        resp.json().await.context("Failed to parse response")
    }

    async fn status(&self, id: &str) -> Result<StatusResponse> {
        let resp = self
            .client
            .get(self.url(&format!("/v1/backchannel/authentications/{}", id)))
            .send()
            .await
            .context("Failed to connect to server")?;

        if !resp.status().is_success() {
            return Err(Self::fail(resp, "Status").await);
        }

        resp.json().await.context("Failed to parse response")
    }

    async fn cancel(&self, id: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.url(&format!("/v1/backchannel/authentications/{}", id)))
            .send()
            .await
            .context("Failed to connect to server")?;

        if resp.status() != StatusCode::NO_CONTENT {
            return Err(Self::fail(resp, "Cancel").await);
        }

        Ok(())
    }

    async fn login(&self) -> Result<LoginResponse> {
        let resp = self
            .client
            .get(self.url("/v1/frontchannel/login"))
            .send()
            .await
            .context("Failed to connect to server")?;

        if !resp.status().is_success() {
            return Err(Self::fail(resp, "Login").await);
        }

        resp.json().await.context("Failed to parse response")
    }

    async fn auth_done(&self, token: &str) -> Result<serde_json::Value> {
        let resp = self
            .client
            .post(self.url("/auth-done"))
            .form(&[("token", token)])
            .send()
            .await
            .context("Failed to connect to server")?;

        if !resp.status().is_success() {
            return Err(Self::fail(resp, "Auth-done").await);
        }

        resp.json().await.context("Failed to parse response")
    }
}

/// Generates a random 128-bit request id as hex.
fn generate_request_id() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// ============================================================================
// Command Handlers
// ============================================================================

async fn cmd_health(client: &BcaClient) -> Result<()> {
    let health = client.get_health().await?;

    println!("BCA server status:");
    println!("  Status:       {}", health.status);
    println!("  Version:      {}", health.version);
    println!("  Handler:      {}", health.handler);
    println!("  Pending:      {}", health.pending_requests);
    if let Some(frontchannel) = health.frontchannel_authenticator {
        println!("  Frontchannel: {}", frontchannel);
    }

    Ok(())
}

async fn cmd_start(client: &BcaClient, subject: &str, id: Option<String>) -> Result<()> {
    let id = id.unwrap_or_else(generate_request_id);
    let result = client.start(&id, subject).await?;

    println!("Authentication started for '{}'", subject);
    println!("Request id: {}", result.auth_req_id);

    Ok(())
}

fn print_status(status: &StatusResponse) -> Result<()> {
    println!("State: {}", status.state);
    if let Some(identity) = &status.identity {
        println!("{}", serde_json::to_string_pretty(identity)?);
    }
    Ok(())
}

async fn cmd_status(client: &BcaClient, id: &str) -> Result<()> {
    let status = client.status(id).await?;
    print_status(&status)
}

/// Instant after which `poll` gives up.
fn poll_deadline(timeout: u64) -> Result<Instant> {
    Instant::now()
        .checked_add(Duration::from_secs(timeout))
        .with_context(|| format!("Timeout of {}s is too large", timeout))
}

async fn cmd_poll(client: &BcaClient, id: &str, interval: u64, timeout: u64) -> Result<()> {
    let deadline = poll_deadline(timeout)?;
    let mut polls = 0u32;

    loop {
        let status = client.status(id).await?;
        polls += 1;

        match status.state.as_str() {
            "STARTED" => {
                if Instant::now() >= deadline {
                    bail!("Request {} still pending after {}s", id, timeout);
                }
                tokio::time::sleep(Duration::from_secs(interval)).await;
            },
            "SUCCEEDED" => {
                println!("Resolved after {} polls", polls);
                return print_status(&status);
            },
            "FAILED" => bail!("Authentication for {} was rejected", id),
            "EXPIRED" => bail!("Request {} is unknown or expired", id),
            other => bail!("Unexpected state: {}", other),
        }
    }
}

async fn cmd_cancel(client: &BcaClient, id: &str) -> Result<()> {
    client.cancel(id).await?;
    println!("Request '{}' cancelled", id);
    Ok(())
}

async fn cmd_login(client: &BcaClient) -> Result<()> {
    let result = client.login().await?;

    println!("Signed in via '{}'", result.authenticator);
    println!("{}", serde_json::to_string_pretty(&result.identity)?);

    Ok(())
}

async fn cmd_auth_done(client: &BcaClient, token: &str) -> Result<()> {
    let claims = client.auth_done(token).await?;
    println!("{}", serde_json::to_string_pretty(&claims)?);
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = BcaClient::new(&cli.addr)?;

    match cli.command {
        Commands::Health => cmd_health(&client).await,
        Commands::Start { subject, id } => cmd_start(&client, &subject, id).await,
        Commands::Status { id } => cmd_status(&client, &id).await,
        Commands::Poll {
            id,
            interval,
            timeout,
        } => cmd_poll(&client, &id, interval, timeout).await,
        Commands::Cancel { id } => cmd_cancel(&client, &id).await,
        Commands::Login => cmd_login(&client).await,
        Commands::AuthDone { token } => cmd_auth_done(&client, &token).await,
    }
}
