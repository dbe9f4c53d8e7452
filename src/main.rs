//! Courier - Main entry point
//!
//! Three independent entry points over the shared durable state:
//! `enumerate` (discovery loop), `transfer` (copy loop), and
//! `reconcile` (one-shot manifest pruning).

use anyhow::Result;
use clap::{Parser, Subcommand};
use courier::device::ShellGateway;
use courier::manifest::Manifest;
use courier::phase::enumerate::Enumerator;
use courier::phase::transfer::TransferEngine;
use courier::session::SessionLoop;
use courier::state::StateFile;
use courier::{config::Config, reconcile, utils};
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk the device and record every file into the manifest
    Enumerate,
    /// Copy outstanding manifest entries to the destination
    Transfer,
    /// Prune already-copied entries from the manifest (no device needed)
    Reconcile,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = if let Some(config_path) = args.config {
        Config::from_file(&config_path)?
    } else {
        Config::default()
    };

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    tracing::info!(
        "Starting courier v{} (destination: {})",
        env!("CARGO_PKG_VERSION"),
        config.courier.destination_root.display()
    );

    let manifest = Manifest::new(&config.courier.manifest_file);

    match args.command {
        Command::Reconcile => {
            let remaining = reconcile::reconcile(&manifest, &config.courier.destination_root)?;
            tracing::info!("Remaining files to copy: {}", remaining);
        }
        Command::Enumerate => {
            let enumerator = Enumerator::new(
                manifest,
                StateFile::new(&config.courier.walk_state_file),
            );
            session_loop(&config)
                .run(|mount_point| enumerator.enumerate(mount_point))
                .await?;
        }
        Command::Transfer => {
            let engine = TransferEngine::new(
                manifest,
                config.courier.destination_root.clone(),
                StateFile::new(&config.courier.transfer_state_file),
            );
            session_loop(&config)
                .run(|mount_point| engine.transfer(mount_point))
                .await?;
        }
    }

    Ok(())
}

fn session_loop(config: &Config) -> SessionLoop<ShellGateway> {
    SessionLoop::new(
        ShellGateway::new(config.device.clone()),
        config.courier.session_root.clone(),
        Duration::from_secs(config.courier.poll_interval_secs),
        interrupt_token(),
    )
}

/// Wire SIGINT/SIGTERM to a cancellation token. The loop observes it at
/// the next boundary; in-flight work finishes its current step first.
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let signalled = token.clone();

    tokio::spawn(async move {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received SIGINT (Ctrl+C), stopping at the next session boundary...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, stopping at the next session boundary...");
            }
        }

        signalled.cancel();
    });

    token
}
