//! CSV processing and age distribution endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use roster_storage::{calculate_distribution, DistributionReport, PgUserStore};
use serde::Serialize;
use uuid::Uuid;

use crate::pipeline::{self, PipelineError, ProcessOutcome};
use crate::state::AppState;

use super::{internal_error, ApiResult, FailureResponse};

const SUCCESS_MESSAGE: &str =
    "CSV processed successfully, uploaded to DB and age distribution calculated.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    pub message: &'static str,
    pub age_distribution: DistributionReport,
    pub records_inserted: u64,
    pub rows_skipped: usize,
    pub run_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionResponse {
    pub age_distribution: DistributionReport,
    pub total_users: i64,
}

impl From<ProcessOutcome> for ProcessResponse {
    fn from(outcome: ProcessOutcome) -> Self {
        Self {
            success: true,
            message: SUCCESS_MESSAGE,
            age_distribution: outcome.distribution,
            records_inserted: outcome.records_inserted,
            rows_skipped: outcome.rows_skipped,
            run_id: outcome.run_id,
        }
    }
}

fn pipeline_failure(e: PipelineError) -> (StatusCode, Json<FailureResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(FailureResponse {
            success: false,
            message: e.message(),
            error: e.to_string(),
            records_inserted: e.records_inserted(),
        }),
    )
}

/// POST /api/process-csv: parse the configured file, load it, report ages.
pub async fn process_csv(State(state): State<Arc<AppState>>) -> ApiResult<Json<ProcessResponse>> {
    let outcome = pipeline::process_with_pool(&state.pool, &state.config.ingest)
        .await
        .map_err(pipeline_failure)?;

    Ok(Json(ProcessResponse::from(outcome)))
}

/// GET /api/age-distribution: report on the table as it stands.
pub async fn age_distribution(State(state): State<Arc<AppState>>) -> ApiResult<Json<DistributionResponse>> {
    const MESSAGE: &str = "Error calculating age distribution";

    let mut store = PgUserStore::acquire(&state.pool)
        .await
        .map_err(|e| internal_error(MESSAGE, e))?;
    let report = calculate_distribution(&mut store)
        .await
        .map_err(|e| internal_error(MESSAGE, e))?;

    Ok(Json(DistributionResponse {
        total_users: report.total(),
        age_distribution: report,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::config::IngestConfig;
    use roster_storage::MemoryUserStore;
    use serde_json::json;
    use std::io::Write;

    async fn outcome_for(content: &str) -> ProcessOutcome {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let ingest = IngestConfig {
            csv_file_path: file.path().to_path_buf(),
            ..IngestConfig::default()
        };
        let mut store = MemoryUserStore::new();
        pipeline::process_with_store(&mut store, &ingest).await.unwrap()
    }

    #[tokio::test]
    async fn success_body_shape() {
        let outcome = outcome_for("name.firstName,age\nA,10\nB,25\nC,40\nD,40\nE,65\nF\n").await;
        let run_id = outcome.run_id;

        let body = serde_json::to_value(ProcessResponse::from(outcome)).unwrap();

        assert_eq!(
            body,
            json!({
                "success": true,
                "message": SUCCESS_MESSAGE,
                "ageDistribution": { "< 20": 20, "20 to 40": 60, "40 to 60": 40, "> 60": 20 },
                "recordsInserted": 5,
                "rowsSkipped": 1,
                "runId": run_id.to_string(),
            })
        );
        let keys: Vec<&String> = body["ageDistribution"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["< 20", "20 to 40", "40 to 60", "> 60"]);
    }

    #[tokio::test]
    async fn header_only_file_reports_no_data() {
        let outcome = outcome_for("name.firstName,age\n").await;

        let body = serde_json::to_value(ProcessResponse::from(outcome)).unwrap();

        assert_eq!(body["success"], true);
        assert_eq!(body["recordsInserted"], 0);
        assert_eq!(
            body["ageDistribution"],
            json!({ "message": "No users found in the database" })
        );
    }
}
