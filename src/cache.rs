//! In-memory caching using moka
//!
//! Caches car records for the quote path. Pricing fields change rarely, so
//! a short TTL is plenty; the reservation guard always re-reads the car
//! under lock, so a stale entry can never corrupt a booking.

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};
use uuid::Uuid;

use crate::fleet::queries;
use crate::models::Car;

/// Application cache holding car records
#[derive(Clone)]
pub struct AppCache {
    /// Cars by id
    pub cars: Cache<Uuid, Arc<Car>>,
}

impl AppCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self {
            // Fleet is small; 5 min TTL bounds how long a price edit can
            // lag in quotes.
            cars: Cache::builder()
                .max_capacity(1_000)
                .time_to_live(Duration::from_secs(5 * 60))
                .time_to_idle(Duration::from_secs(2 * 60))
                .build(),
        }
    }

    pub async fn get_car(&self, id: Uuid) -> Option<Car> {
        self.cars.get(&id).await.map(|c| (*c).clone())
    }

    pub async fn put_car(&self, car: Car) {
        self.cars.insert(car.id, Arc::new(car)).await;
    }

    pub async fn invalidate_car(&self, id: Uuid) {
        self.cars.invalidate(&id).await;
        info!("Cache invalidated for car: {}", id);
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            cars_size: self.cars.entry_count(),
        }
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub cars_size: u64,
}

/// Start background cache warmer
///
/// Warms the cache on startup and refreshes every 10 minutes.
pub async fn start_cache_warmer(cache: AppCache, db: PgPool) {
    warm_cache(&cache, &db).await;

    let mut interval = interval(Duration::from_secs(10 * 60));
    loop {
        interval.tick().await;
        warm_cache(&cache, &db).await;
    }
}

/// Warm the cache with the active fleet
async fn warm_cache(cache: &AppCache, db: &PgPool) {
    match queries::list_active_cars(db).await {
        Ok(cars) => {
            for car in cars {
                cache.put_car(car).await;
            }
            info!("Cache warm-up complete. Stats: {:?}", cache.stats());
        }
        Err(e) => warn!("Failed to warm car cache: {}", e),
    }
}
