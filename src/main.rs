use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use taqs::routes::AppState;
use taqs::{CityDirectory, ForecastClient, TaqsConfig, WeatherCache, WeatherService, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config = TaqsConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .init();

    // City data is loaded before the listener binds so lookups never race
    // the first request; a missing dataset degrades to an empty directory.
    let cities = Arc::new(CityDirectory::load(&config.cities.dataset));
    tracing::info!("City directory ready with {} entries", cities.len());

    let cache = WeatherCache::connect(config.cache.redis_url.as_deref()).await;
    let client = ForecastClient::new(&config)?;
    let weather = Arc::new(WeatherService::new(
        client,
        cache,
        Arc::clone(&cities),
        &config,
    ));

    let state = AppState {
        weather,
        cities,
        environment: config.server.env.clone(),
        started_at: Instant::now(),
    };

    web::run(state, config.server.port).await
}
