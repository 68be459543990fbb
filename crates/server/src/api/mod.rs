//! HTTP handlers.
//!
//! Shared response types live here; each sub-module owns one endpoint group.

mod config;
mod health;
mod process;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

// ── Shared types ─────────────────────────────────────────────────

/// Body of every failed request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureResponse {
    pub success: bool,
    pub message: &'static str,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_inserted: Option<u64>,
}

pub(crate) type ApiResult<T> = Result<T, (StatusCode, Json<FailureResponse>)>;

pub(crate) fn internal_error(message: &'static str, e: impl std::fmt::Display) -> (StatusCode, Json<FailureResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(FailureResponse {
            success: false,
            message,
            error: e.to_string(),
            records_inserted: None,
        }),
    )
}

// ── Re-exports ───────────────────────────────────────────────────

pub use config::config_summary;
pub use health::health;
pub use process::{age_distribution, process_csv};
