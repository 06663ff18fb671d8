use clap::Parser;
use hostwatch::alerting::scheduler::Scheduler;
use hostwatch::db::store::{HostStore, SeaOrmStore};
use hostwatch::notifications::service::AlertNotifier;
use hostwatch::probes::{ProbeDispatcher, Prober};
use hostwatch::server::config::MonitorConfig;
use sea_orm::{ConnectOptions, Database};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_logging(log_dir: &str) -> WorkerGuard {
    // Log to a file: JSON format, daily rotation
    let (file_writer, guard) = tracing_appender::non_blocking(rolling::daily(log_dir, "hostwatch.log"));
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .json();

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    // Default to `info,sea_orm=warn` level if RUST_LOG is not set.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    // Logging needs the log directory, so configuration errors before this
    // point can only go to stderr.
    let config = MonitorConfig::load(args.config.as_deref()).map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;
    let _log_guard = init_logging(&config.log_dir);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting hostwatch.");

    // --- Database Setup ---
    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.max_connections(u32::try_from(config.max_concurrent_probes).unwrap_or(u32::MAX).saturating_add(4))
        .sqlx_logging(false);
    let db = match Database::connect(opt).await {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, "Failed to connect to the host store.");
            return Err(e.into());
        }
    };
    let store: Arc<dyn HostStore> = Arc::new(SeaOrmStore::new(db));

    // --- Probes & Notifications ---
    let prober: Arc<dyn Prober> = Arc::new(ProbeDispatcher::new(&config.probe_settings())?);
    let notifier = Arc::new(AlertNotifier::new(store.clone(), config.notify_timeout())?);

    // --- Scheduler ---
    let scheduler = Arc::new(Scheduler::new(
        store,
        prober,
        notifier,
        config.scheduler_settings(),
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx));

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal.");
    }
    info!("Received Ctrl+C, shutting down.");
    let _ = shutdown_tx.send(());

    if let Err(e) = scheduler_handle.await {
        error!(error = %e, "Scheduler task failed.");
    }
    info!("hostwatch stopped.");
    Ok(())
}
