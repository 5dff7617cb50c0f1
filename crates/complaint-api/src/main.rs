mod config;
mod error;
mod rate_limit;
mod server;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use complaint_common::advisory::AdvisoryClient;
use complaint_common::cache::AdviceCache;
use complaint_common::redis::RedisCache;
use complaint_common::routing::ComplaintRouter;

use config::Config;
use rate_limit::ClientRateLimiter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting complaint-api");

    // 1. Load config from environment
    let config = Config::from_env()?;
    info!(
        port = config.port,
        catalog = ?config.institutions_path,
        result_limit = config.result_limit,
        rate_limit_rps = ?config.rate_limit_rps,
        advisory = config.advisory.is_some(),
        "configuration loaded"
    );

    // 2. Load the institution catalog
    let mut router = ComplaintRouter::load(config.router_settings())?;
    info!(institutions = router.catalog().len(), "catalog ready");

    // 3. Optional advisory endpoint, cached in Redis when available
    if let Some(advisory) = config.advisory.clone() {
        let redis = RedisCache::new(config.redis_url.as_deref());
        if redis.is_available().await {
            info!("redis connected");
        } else {
            info!("redis unavailable, running without advisory cache");
        }
        info!(base_url = %advisory.base_url, model = %advisory.model, "advisory enabled");
        router = router.with_advisory(AdvisoryClient::new(advisory)?, AdviceCache::new(redis));
    }

    // 4. Serve HTTP
    let app = server::build_app(
        Arc::new(router),
        ClientRateLimiter::new(config.rate_limit_rps),
        config.max_body_kb,
    );
    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "complaint-api listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .inspect_err(|e| tracing::error!(error = %e, "http server error"))?;

    info!("complaint-api shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
