use std::time::Duration;

use anyhow::Result;
use tripit_api::config::Settings;
use tripit_api::{build_router, build_state};
use tripit_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("tripit_api");

    let settings = Settings::from_env();
    let state = build_state(&settings).await?;

    if let Some(limiter) = state.limiter.clone() {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(limiter.window().max(Duration::from_secs(1)));
            loop {
                ticker.tick().await;
                let pruned = limiter.prune();
                if pruned > 0 {
                    tracing::debug!(pruned, "pruned idle rate limit entries");
                }
            }
        });
    }

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&settings.bind).await?;
    tracing::info!(
        bind = %settings.bind,
        catalog = %settings.catalog_path.display(),
        model_provider = settings.provider.is_some(),
        "tripit api started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
