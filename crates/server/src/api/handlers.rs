use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use drillbook_core::{GroupingField, SanitizedConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Shorthand for an error reply with a JSON body.
pub fn error_response(
    status: StatusCode,
    error: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

/// Query parameters shared by the statistics endpoints.
#[derive(Debug, Deserialize)]
pub struct StatsQueryParams {
    #[serde(default)]
    pub group_by: Option<String>,
    #[serde(default)]
    pub top_n: Option<i64>,
}

impl StatsQueryParams {
    /// Grouping field and ranking length, falling back to configured defaults.
    pub fn resolve(
        &self,
        state: &AppState,
    ) -> Result<(GroupingField, i64), (StatusCode, Json<ErrorResponse>)> {
        let field = match &self.group_by {
            Some(raw) => raw
                .parse::<GroupingField>()
                .map_err(|e| error_response(StatusCode::BAD_REQUEST, e))?,
            None => GroupingField::default(),
        };
        let top_n = self.top_n.unwrap_or(state.config().stats.top_n);
        Ok((field, top_n))
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// GET /metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
