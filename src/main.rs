use clap::Parser;
use dotenvy::dotenv;
use mxscan::services::scan_manager::MediaScanManager;
use mxscan::services::scan_store::MediaScanStore;
use mxscan::services::worker::BackgroundWorker;
use mxscan::utils::url_locks::UrlLocks;
use mxscan::{AppState, create_app, infrastructure};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port for the API server
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mxscan=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting media scan cache...");

    let db = infrastructure::database::setup_database().await?;

    let config = mxscan::config::ScanConfig::from_env();
    info!(
        "🛡️  Scan Config: Enabled={}, Scanner={}, Re-check delay={}s",
        config.enable_media_scan, config.scanner_type, config.rescan_delay_secs
    );

    let scanner = infrastructure::scanner::setup_scanner(&config).await?;

    let store = MediaScanStore::new(db.clone());

    // Scans interrupted by a previous shutdown would stay IN_PROGRESS
    // forever; make them scannable again.
    let recovered = store.reset_all_in_progress().await?;
    if recovered > 0 {
        info!("♻️  Reset {} interrupted scans back to UNKNOWN", recovered);
    }

    let locks = UrlLocks::new();
    let scan_manager = Arc::new(MediaScanManager::new(
        store,
        scanner.clone(),
        locks.clone(),
        config.rescan_delay_secs,
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let worker = BackgroundWorker::new(locks, config.lock_cleanup_interval_secs, shutdown_rx);
    tokio::spawn(worker.run());

    let state = AppState {
        db,
        scanner,
        scan_manager,
        config,
    };

    let app = create_app(state).layer(TraceLayer::new_for_http());
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("✅ API Server listening on: http://0.0.0.0:{}", args.port);
    info!(
        "📖 Swagger UI documentation: http://localhost:{}/swagger-ui",
        args.port
    );

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Server runtime error: {}", e);
    }

    let _ = shutdown_tx.send(true);
    info!("👋 Media scan cache exited cleanly.");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, initiating graceful shutdown...");
        },
    }
}
