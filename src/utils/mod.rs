use std::time::{SystemTime, UNIX_EPOCH};

use tracing::error;

use crate::http::status_error::StatusError;

pub mod env_reader;
pub mod file_storage;

pub fn internal_error<E: std::fmt::Display>(err: E) -> axum::response::ErrorResponse {
    error!("Internal error: {err}");
    StatusError::create("Internal server error")
}

/// Unix timestamp in milliseconds, as carried by every published event.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
