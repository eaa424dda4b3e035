use std::sync::Arc;

use court_recommender::{
    api::{create_router, AppState},
    config::Config,
    db,
    services::RecommendationEngine,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let source = db::connect(&config).await?;
    let engine = Arc::new(RecommendationEngine::from_config(&config, source));

    // A failed startup fit is not fatal: cold start keeps serving
    match engine.train().await {
        Ok(outcome) => tracing::info!(is_trained = outcome.is_trained(), "{}", outcome.message()),
        Err(e) => tracing::warn!(error = %e, "Failed to train model on startup"),
    }

    let state = AppState::new(engine).with_default_limit(config.default_limit);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Recommendation service listening");
    axum::serve(listener, app).await?;

    Ok(())
}
