//! Request DTOs for fleet API endpoints.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Request to block a car's availability for a window
#[derive(Debug, Deserialize)]
pub struct CreateBlockRequest {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub reason: String,
}
