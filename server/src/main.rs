//! Crewbook HTTP server.
//!
//! Booking marketplace API over `PostgreSQL`.

use crewbook_auth::JwtService;
use crewbook_core::{ApplicationResolver, BookingLifecycle, environment::SystemClock};
use crewbook_postgres::{
    PostgresApplicationStore, PostgresBookingStore, PostgresIdentityResolver,
};
use crewbook_server::{AppState, Config, DatabaseProbe, build_router};
use metrics_exporter_prometheus::PrometheusBuilder;
use sqlx::postgres::PgPoolOptions;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file (if present)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,crewbook=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Crewbook HTTP Server");

    // Load configuration
    let config = Config::from_env();
    info!(
        api_address = %config.server.bind_address(),
        metrics_address = %config.server.metrics_address(),
        run_migrations = config.database.run_migrations,
        "Configuration loaded"
    );

    // Prometheus exporter on its own listener
    let metrics_addr: SocketAddr = config.server.metrics_address().parse()?;
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()?;
    crewbook_server::metrics::register_business_metrics();
    info!(address = %metrics_addr, "Prometheus metrics available at /metrics");

    // Database
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout))
        .idle_timeout(Some(Duration::from_secs(config.database.idle_timeout)))
        .connect(&config.database.url)
        .await?;
    info!("Database connected");

    if config.database.run_migrations {
        crewbook_postgres::migrate(&pool).await?;
    }

    // Engines
    let lifecycle = BookingLifecycle::new(
        Arc::new(PostgresBookingStore::new(pool.clone())),
        Arc::new(PostgresIdentityResolver::new(pool.clone())),
        Arc::new(SystemClock),
    );
    let resolver = ApplicationResolver::new(
        Arc::new(PostgresApplicationStore::new(pool.clone())),
        lifecycle.clone(),
    );

    let state = AppState::new(
        lifecycle,
        resolver,
        Arc::new(JwtService::new(&config.auth.jwt_secret)),
        Arc::new(DatabaseProbe::new(pool.clone())),
    );

    let app = build_router(state, &config.server);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    // Graceful shutdown, bounded by SHUTDOWN_TIMEOUT once the signal arrives
    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = signalled_tx.send(());
    });
    let grace = config.server.shutdown_timeout();

    tokio::select! {
        result = server.into_future() => result?,
        () = shutdown_deadline(signalled_rx, grace) => {
            warn!(timeout_secs = grace.as_secs(), "Graceful shutdown timed out, dropping open connections");
        }
    }

    pool.close().await;
    info!("Server stopped");
    Ok(())
}

/// Resolves `grace` after the shutdown signal; never if it does not come.
async fn shutdown_deadline(signalled: oneshot::Receiver<()>, grace: Duration) {
    if signalled.await.is_ok() {
        tokio::time::sleep(grace).await;
    } else {
        std::future::pending::<()>().await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
