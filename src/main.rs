use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gogocar_booking::{app, booking, cache, config::Settings, notify::Notifier, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gogocar_booking=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;

    let db = PgPoolOptions::new()
        .max_connections(settings.database_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&settings.database_url)
        .await
        .context("failed to connect to database")?;

    let app_cache = cache::AppCache::new();
    let notifier = Notifier::default();
    let state = AppState {
        db: db.clone(),
        cache: app_cache.clone(),
        notifier: notifier.clone(),
    };

    tokio::spawn(cache::start_cache_warmer(app_cache, db.clone()));
    tokio::spawn(booking::services::start_hold_reaper(
        db,
        notifier,
        chrono::Duration::minutes(settings.hold_ttl_minutes),
        Duration::from_secs(settings.sweep_interval_secs),
    ));

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    info!("listening on {}", settings.bind_addr);

    axum::serve(listener, app(state))
        .await
        .context("server exited")?;

    Ok(())
}
