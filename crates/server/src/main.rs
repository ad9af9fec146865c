//! GSEmu - Battlefield 2 status query emulator
//!
//! Main server binary: answers status queries on `<ip> <port>` and reads admin
//! commands from stdin.

use anyhow::Context;
use clap::Parser;
use gsemu_admin::AdminConsole;
use gsemu_config::ServerConfig;
use gsemu_game::SharedState;
use gsemu_network::{NetworkConfig, QueryServer};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// How long shutdown waits for blocked tasks (the stdin reader)
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// IP address to bind the query socket to
    ip: IpAddr,
    /// UDP port to answer queries on
    port: u16,
    /// Settings file (key = value lines)
    #[clap(short, long)]
    config: Option<PathBuf>,
    /// Number of query workers, overrides the settings file
    #[clap(short, long)]
    workers: Option<usize>,
    /// Log filter, e.g. "info" or "gsemu_network=trace"; defaults to RUST_LOG
    #[clap(short, long)]
    log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref())?;

    info!("GSEmu starting up...");

    let mut config = match &args.config {
        Some(path) => ServerConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    config.validate().context("Invalid configuration")?;
    config.display();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()
        .context("Failed to build runtime")?;

    let bind = SocketAddr::new(args.ip, args.port);
    let result = runtime.block_on(run(bind, config));

    // stdin reads block a thread that never finishes on its own
    runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
    result
}

fn init_tracing(log_level: Option<&str>) -> anyhow::Result<()> {
    let filter = match log_level {
        Some(level) => EnvFilter::try_new(level).context("Invalid log filter")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

async fn run(bind: SocketAddr, config: ServerConfig) -> anyhow::Result<()> {
    let state = SharedState::new(config.build_state()?);

    let server = QueryServer::bind(NetworkConfig::from_config(bind, &config), state.clone())
        .await
        .context("Failed to start query server")?;

    let cancel = CancellationToken::new();

    let console = AdminConsole::new(state);
    let console_cancel = cancel.child_token();
    tokio::spawn(async move {
        if let Err(e) = console.run(tokio::io::stdin(), console_cancel).await {
            error!("Admin console failed: {}", e);
        }
    });

    let mut server_task = {
        let cancel = cancel.clone();
        tokio::spawn(async move { server.run(cancel).await })
    };

    info!("GSEmu ready at {}", bind);

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            info!("Shutdown requested");
            cancel.cancel();
            server_task.await??;
        }
        result = &mut server_task => {
            cancel.cancel();
            result??;
            error!("Query server exited unexpectedly");
        }
    }

    info!("Server shutting down gracefully");
    Ok(())
}
