//! Environment-driven settings
//!
//! Loaded once at startup from the process environment (a `.env` file is
//! honored in development via dotenvy).

use std::env;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    pub database_max_connections: u32,
    /// Minutes a PENDING booking may wait for a successful advance payment
    /// before the reaper cancels it and frees the car.
    pub hold_ttl_minutes: i64,
    /// Interval between reaper passes.
    pub sweep_interval_secs: u64,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        Ok(Self {
            database_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10),
            hold_ttl_minutes: parse_or("HOLD_TTL_MINUTES", 30),
            sweep_interval_secs: parse_or("SWEEP_INTERVAL_SECS", 300),
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_on_missing_or_garbage() {
        std::env::remove_var("GOGOCAR_TEST_MISSING");
        assert_eq!(parse_or::<i64>("GOGOCAR_TEST_MISSING", 30), 30);

        std::env::set_var("GOGOCAR_TEST_GARBAGE", "not-a-number");
        assert_eq!(parse_or::<u32>("GOGOCAR_TEST_GARBAGE", 5), 5);
        std::env::remove_var("GOGOCAR_TEST_GARBAGE");
    }
}
