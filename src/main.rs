use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use doma_autobidder::api::health::HealthState;
use doma_autobidder::api::latency::LatencyStats;
use doma_autobidder::api::routes::{router, ApiState};
use doma_autobidder::config::Config;
use doma_autobidder::error::Result;
use doma_autobidder::normalizer::Normalizer;
use doma_autobidder::upstream::{v1, DomaGraphql};
use doma_autobidder::valuation::RandomValuation;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    if cfg.doma_api_key.is_none() {
        warn!("DOMA_API_KEY not set; upstream requests are sent unauthenticated");
    }
    info!(
        "Upstream: graphql={} rest={} chain=eip155:{} schema={}",
        cfg.doma_graphql_url,
        cfg.doma_api_url,
        cfg.chain_id,
        v1::SCHEMA_VERSION,
    );
    info!(
        "Fallback mode: {} (timeout={}s, page_size={})",
        cfg.fallback_mode, cfg.upstream_timeout_secs, cfg.listings_page_size,
    );

    let upstream = DomaGraphql::new(&cfg)?;
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);

    let state = ApiState {
        normalizer: Arc::new(Normalizer::new(cfg, upstream, Arc::new(RandomValuation))),
        health: Arc::new(HealthState::new()),
        latency: Arc::new(LatencyStats::new()?),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("doma-auctions listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
