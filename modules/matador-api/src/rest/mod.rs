use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use matador_common::MatadorError;
use matador_report::{ReportForm, ReportOutput};

use crate::AppState;

const DEFAULT_USER: &str = "anonymous";

#[derive(Deserialize)]
pub struct CreateReportRequest {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(flatten)]
    form: ReportForm,
}

#[derive(Serialize)]
pub struct CreatedReport {
    /// `None` when the report could not be stored.
    id: Option<Uuid>,
    report: ReportOutput,
}

fn error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// Generate a report and persist it. A failed insert is logged and the report
/// is still returned, with a null `id`.
pub async fn api_create_report(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateReportRequest>,
) -> impl IntoResponse {
    let user_id = body
        .user_id
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_USER.to_string());

    let output = match state.generator.generate(body.form).await {
        Ok(output) => output,
        Err(MatadorError::Validation(e)) => return error(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => {
            warn!(error = %e, "Report generation failed");
            return error(StatusCode::INTERNAL_SERVER_ERROR, "Report generation failed");
        }
    };

    let report = output.to_report(&user_id);
    let id = match state.store.insert(&report).await {
        Ok(()) => {
            info!(id = %report.id, user_id = user_id.as_str(), "Report stored");
            Some(report.id)
        }
        Err(e) => {
            warn!(error = %e, "Failed to store report");
            None
        }
    };

    Json(CreatedReport { id, report: output }).into_response()
}

pub async fn api_report_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.store.get(id).await {
        Ok(Some(report)) => Json(report).into_response(),
        Ok(None) => error(StatusCode::NOT_FOUND, "Report not found"),
        Err(e) => {
            warn!(error = %e, %id, "Failed to load report");
            error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load report")
        }
    }
}

pub async fn api_user_reports(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state.store.list_for_user(&user_id).await {
        Ok(reports) => Json(reports).into_response(),
        Err(e) => {
            warn!(error = %e, user_id = user_id.as_str(), "Failed to list reports");
            error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list reports")
        }
    }
}
