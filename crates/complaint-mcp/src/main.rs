mod config;
mod error;
mod server;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tracing::info;
use tracing_subscriber::EnvFilter;

use complaint_common::advisory::AdvisoryClient;
use complaint_common::cache::AdviceCache;
use complaint_common::redis::RedisCache;
use complaint_common::routing::ComplaintRouter;

use config::Config;
use server::ComplaintMcpServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout is reserved for MCP JSON-RPC
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting complaint-mcp server");

    let config = Config::from_env()?;
    info!(
        catalog = ?config.institutions_path,
        result_limit = config.result_limit,
        advisory = config.advisory.is_some(),
        redis = config.redis_url.is_some(),
        "configuration loaded"
    );

    let mut router = ComplaintRouter::load(config.router_settings())?;
    info!(institutions = router.catalog().len(), "catalog ready");

    if let Some(advisory) = config.advisory.clone() {
        let redis = RedisCache::new(config.redis_url.as_deref());
        if redis.is_available().await {
            info!("redis connected");
        } else {
            info!("redis unavailable, running without advisory cache");
        }
        router = router.with_advisory(AdvisoryClient::new(advisory)?, AdviceCache::new(redis));
    }

    let server = ComplaintMcpServer::new(Arc::new(router));

    info!("MCP server ready, serving on stdio");
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!(error = %e, "MCP server error");
    })?;

    service.waiting().await?;
    info!("MCP server shut down");
    Ok(())
}
