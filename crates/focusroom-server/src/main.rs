use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use focusroom_core::{BroadcastSimulator, Config};
use focusroom_server::{create_router, spawn_ticker, AppState};

#[derive(Parser)]
#[command(name = "focusroom-server", version, about = "Focusroom focus broadcast server")]
struct Args {
    /// Address to bind (overrides server.host)
    #[arg(long)]
    host: Option<String>,
    /// Port to listen on (overrides server.port)
    #[arg(long)]
    port: Option<u16>,
    /// Seconds between roster ticks (overrides server.tick_interval_secs)
    #[arg(long)]
    tick_secs: Option<u64>,
    /// Fixed RNG seed for reproducible readings (overrides roster.seed)
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "focusroom_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();

    let mut config = Config::load()?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(tick_secs) = args.tick_secs {
        config.server.tick_interval_secs = tick_secs;
    }
    if args.seed.is_some() {
        config.roster.seed = args.seed;
    }
    anyhow::ensure!(
        config.server.tick_interval_secs > 0,
        "server.tick_interval_secs must be positive"
    );
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        users = config.roster.users.len(),
        "Configuration loaded"
    );

    let simulator = BroadcastSimulator::from_config(&config.roster, Utc::now());
    let period = Duration::from_secs(config.server.tick_interval_secs);
    let addr = config.server.bind_addr();
    let state = AppState::new(simulator, config.server);

    let ticker = spawn_ticker(state.clone(), period);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    ticker.abort();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
