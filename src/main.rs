use sea_orm::Database;
use std::{sync::Arc, time::Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

use store_catalog::{
    build_app,
    cache::RedisPopularCache,
    config::Config,
    entities::{seed_admin, setup_schema},
    state::AppState,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load().expect("Invalid configuration");

    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    setup_schema(&db).await.expect("Failed to create schema");

    if let Some(password) = &config.admin_password {
        seed_admin(&db, &config.admin_username, password)
            .await
            .expect("Failed to seed admin account");
    }

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .expect("Failed to create upload directory");

    let cache = RedisPopularCache::new(
        &config.redis_url,
        config.popular_limit,
        Duration::from_millis(config.redis_timeout_ms),
    )
    .expect("Invalid REDIS_URL");

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind address");
    info!("Running at {}", config.bind_addr);

    let state = AppState::new(db, Arc::new(cache), config);
    axum::serve(listener, build_app(state))
        .await
        .expect("Server stopped unexpectedly");
}
