use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use eventhub_api::config::ServerConfig;
use eventhub_api::router::build_app_router;
use eventhub_api::state::AppState;
use eventhub_core::photo::{EVENT_PHOTOS, USER_PHOTOS};
use eventhub_db::DbPool;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(e) = run().await {
        tracing::error!(error = ?e, "EventHub stopped");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("eventhub_api=debug,eventhub_db=info,tower_http=debug"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        environment = ?config.environment,
        uploads = %config.uploads_dir.display(),
        "Configuration loaded"
    );

    let pool = open_database().await?;
    prepare_upload_dirs(&config.uploads_dir).await?;

    let addr = SocketAddr::new(
        config.host.parse().context("HOST is not an IP address")?,
        config.port,
    );
    let app = build_app_router(
        AppState {
            pool,
            config: Arc::new(config.clone()),
        },
        &config,
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    tracing::info!(%addr, "EventHub listening");

    // Connect info feeds the per-IP rate limiter.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server failed")?;

    tracing::info!("Drained in-flight requests, exiting");
    Ok(())
}

/// Connect, ping and migrate before any request is accepted.
async fn open_database() -> anyhow::Result<DbPool> {
    let url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

    let pool = eventhub_db::create_pool(&url)
        .await
        .context("cannot connect to Postgres")?;
    eventhub_db::health_check(&pool)
        .await
        .context("Postgres did not answer the health check")?;
    eventhub_db::run_migrations(&pool)
        .await
        .context("schema migration failed")?;

    tracing::info!("Postgres ready, schema up to date");
    Ok(pool)
}

async fn prepare_upload_dirs(root: &Path) -> anyhow::Result<()> {
    for policy in [USER_PHOTOS, EVENT_PHOTOS] {
        let dir = root.join(policy.folder);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("cannot create {}", dir.display()))?;
    }
    Ok(())
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let which = tokio::select! {
        () = interrupt => "SIGINT",
        () = terminate => "SIGTERM",
    };
    tracing::info!(signal = which, "Shutting down");
}
