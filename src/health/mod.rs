//! Health probe.
//!
//! `GET /health` answers `{"status":"ok","timestamp":"<ISO-8601 UTC>"}`.
//! It sits outside the rate-limited prefix so probes are never throttled.

use axum::Json;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
}

impl HealthStatus {
    pub fn ok_at(now: DateTime<Utc>) -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: iso_timestamp(now),
        }
    }
}

/// Millisecond-precision UTC timestamp with a `Z` suffix.
pub fn iso_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus::ok_at(Utc::now()))
}
