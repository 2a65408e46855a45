//! BCA Server - Main entry point.

mod config;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bca_api::AppState;
use bca_auth::AutoLoginAuthenticator;
use bca_core::BackchannelAuthenticator;

use crate::config::{ServerConfig, DEFAULT_CONFIG_PATH};

#[derive(Parser)]
#[command(name = "bca-server")]
#[command(about = "BCA - Test backchannel authenticator server")]
#[command(version)]
struct Cli {
    /// Configuration file path [default: config/bca.toml, optional]
    #[arg(short, long, env = "BCA_CONFIG")]
    config: Option<PathBuf>,

    /// Server bind address
    #[arg(long, env = "BCA_BIND_ADDRESS")]
    bind: Option<String>,

    /// Seconds before a backchannel request may resolve
    #[arg(long, env = "BCA_DELAY_SECS")]
    delay: Option<u64>,

    /// Subject whose backchannel authentication always fails
    #[arg(long, env = "BCA_REJECTING_SUBJECT")]
    rejecting_subject: Option<String>,

    /// User signed in by the auto-login frontchannel (random when unset)
    #[arg(long, env = "BCA_USERNAME")]
    username: Option<String>,

    /// Seconds after which unresolved requests are forgotten
    #[arg(long, env = "BCA_REQUEST_TTL_SECS")]
    request_ttl: Option<u64>,

    /// Name of the linked frontchannel authenticator
    #[arg(long, env = "BCA_FRONTCHANNEL_AUTHENTICATOR")]
    frontchannel_authenticator: Option<String>,
}

impl Cli {
    /// Loads the configuration file and applies command-line overrides.
    fn resolve_config(&self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path, true)?,
            None => ServerConfig::load(Path::new(DEFAULT_CONFIG_PATH), false)?,
        };

        if let Some(bind) = &self.bind {
            config.bind = bind.clone();
        }
        if let Some(delay) = self.delay {
            config.backchannel.delay_secs = Some(delay);
        }
        if let Some(subject) = &self.rejecting_subject {
            config.backchannel.rejecting_subject = Some(subject.clone());
        }
        if let Some(ttl) = self.request_ttl {
            config.backchannel.request_ttl_secs = Some(ttl);
        }
        if let Some(name) = &self.frontchannel_authenticator {
            config.backchannel.frontchannel_authenticator = Some(name.clone());
        }
        if let Some(username) = &self.username {
            config.frontchannel.username = Some(username.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

/// Periodically drops requests that outlived the configured TTL.
fn spawn_reaper(authenticator: Arc<BackchannelAuthenticator>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = authenticator.sweep_expired().await;
            if removed > 0 {
                tracing::debug!(removed, "Expired backchannel requests reaped");
            }
        }
    });
}

/// Resolves once `signal` fires.
///
/// If the signal handler cannot be installed the server keeps running.
async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    tracing::info!("Starting BCA server...");
    tracing::info!("Bind address: {}", config.bind);

    let authenticator = Arc::new(BackchannelAuthenticator::new(config.backchannel.clone())?);
    let frontchannel = Arc::new(AutoLoginAuthenticator::new(config.frontchannel.clone())?);

    if config.backchannel.request_ttl_secs.is_some() {
        spawn_reaper(
            Arc::clone(&authenticator),
            Duration::from_secs(config.sweep_interval_secs),
        );
    } else {
        tracing::warn!("No request TTL configured - requests are kept until cancelled");
    }

    let app = bca_api::router(AppState {
        backchannel: authenticator,
        frontchannel,
        frontchannel_authenticator: config.backchannel.frontchannel_authenticator.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    tracing::info!("BCA server started successfully");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_on(tokio::signal::ctrl_c()))
        .await?;

    tracing::info!("Shutting down...");

    Ok(())
}
