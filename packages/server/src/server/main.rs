// Main entry point for the enrichment service

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use server_core::common::db;
use server_core::kernel::{ClaudeClient, Processor, ProcessorConfig, ScraperApiClient, TwentyAdapter};
use server_core::server::build_app;
use server_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twenty::TwentyClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting company enrichment service");

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = db::connect(&config.database_url).await?;
    tracing::info!("Database ready");

    let scraper = Arc::new(ScraperApiClient::new(config.scraper_api_url.as_str())?);
    let ai = Arc::new(ClaudeClient::new(
        config.anthropic_api_key.clone(),
        config.claude_model.clone(),
    ));
    let crm = Arc::new(TwentyAdapter::new(Arc::new(TwentyClient::new(
        config.twenty_api_url.as_str(),
        config.twenty_api_key.as_str(),
    ))));

    let processor = Processor::new(
        pool.clone(),
        scraper,
        ai,
        crm,
        ProcessorConfig {
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            crawl_max_depth: config.crawl_max_depth,
            crawl_max_pages: config.crawl_max_pages,
        },
    );
    let processor_handle = processor.start();

    let app = build_app(pool, config.auth_token.clone());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://localhost:{}/api/health", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Let an in-flight processing pass finish before exiting; partial state
    // is recoverable either way thanks to per-stage resume data.
    tracing::info!("Shutting down, stopping background processor");
    processor.stop();
    let _ = processor_handle.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
