use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use care_clients::{
    build_router, config,
    db::{self, ClientStore, Database, MemoryClientStore, PgClientStore},
    service::ClientService,
    AppState,
};

/// Senior-care client management API
#[derive(Parser, Debug)]
#[command(name = "care-clients", version, about)]
struct Cli {
    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Serve from a process-local store instead of PostgreSQL
    #[arg(long)]
    in_memory: bool,

    /// Apply the embedded migrations before serving
    #[arg(long, conflicts_with = "in_memory")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = config::init()?;
    init_tracing();
    info!("Initializing client management API...");

    if let Some(port) = cli.port {
        config.port = port;
    }

    let (store, database): (Arc<dyn ClientStore>, Option<Database>) = if cli.in_memory {
        warn!("serving from the in-memory store; data is lost on exit");
        (Arc::new(MemoryClientStore::new()), None)
    } else {
        let database = db::init(&config).await?;
        if cli.migrate {
            database.migrate().await?;
            info!("database migrations applied");
        }
        let store = PgClientStore::new(database.get_pool().clone());
        (Arc::new(store), Some(database))
    };

    let state = AppState::new(Arc::new(ClientService::new(store)));
    let app = build_router(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "server is running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(database) = database {
        database.close().await;
        info!("database pool closed");
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("care_clients=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install ctrl+c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install sigterm handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
