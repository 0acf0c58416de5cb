use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use moodify_api::{
    db::{create_pool, create_redis_client, Cache, PgRepository},
    player::RedisSessionCache,
    services::providers::{scoring::HttpScoringProvider, youtube::YouTubeProvider},
    AppState, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("moodify_api=debug,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let settings = config.pipeline_settings();

    let pool = create_pool(&config.database_url).await?;
    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = Cache::new(redis_client).await;

    let catalog = YouTubeProvider::new(
        cache.clone(),
        config.youtube_api_key.clone(),
        config.youtube_api_url.clone(),
        config.youtube_region_code.clone(),
        config.youtube_duration_bucket,
        settings.collaborator_timeout,
    )?;
    let scoring = HttpScoringProvider::new(
        config.scoring_api_url.clone(),
        settings.collaborator_timeout,
    )?;

    let state = AppState::new(
        Arc::new(PgRepository::new(pool)),
        Arc::new(catalog),
        Arc::new(scoring),
        Arc::new(RedisSessionCache::new(cache)),
        settings,
    );

    let app = moodify_api::create_router(state).layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_writer.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
