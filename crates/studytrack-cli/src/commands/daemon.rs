//! Daemon command - Periodic background sync in the foreground
//!
//! Runs [`PeriodicSync`] until SIGINT or SIGTERM, then stops after the
//! current sync step and exits cleanly.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use studytrack_core::config::Config;
use studytrack_sync::PeriodicSync;

use crate::context::AppContext;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct DaemonCommand {
    /// Override the sync interval in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,
}

impl DaemonCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let problems = config.validate();
        if !problems.is_empty() {
            for problem in &problems {
                formatter.error(&problem.to_string());
            }
            anyhow::bail!("Refusing to start the daemon with an invalid configuration");
        }

        let ctx = AppContext::open(config).await?;
        if !ctx.has_access_token() {
            formatter.warn("No access token configured; every sync will fail until one is set");
        }

        let interval = self
            .interval
            .map_or_else(|| config.sync.interval(), Duration::from_secs);
        let periodic = PeriodicSync::new(Arc::clone(&ctx.orchestrator), interval);

        let shutdown = CancellationToken::new();
        tokio::spawn(shutdown_signal(shutdown.clone()));

        formatter.info(&format!(
            "Syncing every {}s; press Ctrl+C to stop",
            interval.as_secs()
        ));
        periodic.run(shutdown).await;

        info!(online = periodic.is_online(), "Daemon shut down gracefully");
        formatter.success("Daemon stopped");
        Ok(())
    }
}

/// Cancels `token` on SIGINT or SIGTERM
///
/// If a handler cannot be installed, that signal is ignored and the error
/// is logged.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}
