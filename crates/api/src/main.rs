use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use wander_agents::GuideConfig;
use wander_api::{build_router, build_state, ApiSettings};
use wander_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("wander_api");

    let bind = env::var("WANDER_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let config = GuideConfig::from_env().context("invalid guide configuration")?;
    let settings = ApiSettings::from_env();
    let prune_every = settings.rate_limit_window.max(Duration::from_secs(1));

    let state = build_state(&config, settings)?;
    let limiter = state.limiter.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(prune_every);
        loop {
            ticker.tick().await;
            limiter.prune();
        }
    });

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(
        bind = %bind,
        geodata = state.guide.capabilities().geodata,
        reasoning = state.guide.capabilities().reasoning,
        "wander guide api started"
    );

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
