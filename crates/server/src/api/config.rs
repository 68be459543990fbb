use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// GET /api/config: the active configuration without credentials.
pub async fn config_summary(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(state.config.redacted_summary())
}
