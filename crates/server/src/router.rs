//! HTTP router construction.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::api;
use crate::state::AppState;

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);
    Router::new()
        .route("/health", get(api::health))
        .route("/api/config", get(api::config_summary))
        .route("/api/process-csv", post(api::process_csv))
        .route("/api/age-distribution", get(api::age_distribution))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(e) => {
            warn!("Invalid CORS_ORIGIN {:?}: {}, falling back to permissive", origin, e);
            CorsLayer::permissive()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use roster_core::config::{IngestConfig, PostgresConfig, ServerConfig};
    use roster_core::Config;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    fn test_state(csv_path: &str) -> Arc<AppState> {
        // Lazy pool: nothing connects unless a handler actually acquires.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres:@localhost:5432/roster")
            .unwrap();
        let config = Config {
            profile: String::new(),
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
                cors_origin: "*".into(),
            },
            postgres: PostgresConfig {
                url: None,
                host: "localhost".into(),
                port: 5432,
                database: "roster".into(),
                username: None,
                password: None,
                max_connections: 1,
                acquire_timeout_secs: 1,
            },
            ingest: IngestConfig {
                csv_file_path: csv_path.into(),
                ..IngestConfig::default()
            },
        };
        Arc::new(AppState { pool, config })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = build_router(test_state("unused.csv"));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn config_endpoint_hides_credentials() {
        let state = test_state("data/users.csv");
        let mut config = state.config.clone();
        config.postgres.password = Some("hunter2".into());
        let app = build_router(Arc::new(AppState {
            pool: state.pool.clone(),
            config,
        }));

        let response = app
            .oneshot(Request::builder().uri("/api/config").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["ingest"]["csv_file_path"], "data/users.csv");
        assert_eq!(body["ingest"]["batch_size"], 1000);
        assert!(!body.to_string().contains("hunter2"));
    }

    #[tokio::test]
    async fn missing_file_returns_structured_failure() {
        let app = build_router(test_state("/no/such/file.csv"));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/process-csv")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Error processing CSV file");
        assert!(body["error"].as_str().unwrap().contains("/no/such/file.csv"));
        assert!(body.get("recordsInserted").is_none());
    }

    #[tokio::test]
    async fn process_csv_rejects_get() {
        let app = build_router(test_state("unused.csv"));
        let response = app
            .oneshot(Request::builder().uri("/api/process-csv").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn explicit_cors_origin_is_accepted() {
        // Construction must not panic for a concrete origin.
        let _ = cors_layer("https://example.org");
    }
}
