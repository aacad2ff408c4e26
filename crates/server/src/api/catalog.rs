//! Catalog API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use drillbook_core::{summarize, CatalogEntry, StatisticsSummary};

use super::handlers::{error_response, ErrorResponse, StatsQueryParams};
use crate::metrics::{GaugeGuard, SYNC_IN_PROGRESS, SYNC_REJECTED_TOTAL};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CatalogQueryParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    100
}

const MAX_LIMIT: u32 = 1000;

#[derive(Debug, Serialize)]
pub struct CatalogListResponse {
    pub entries: Vec<CatalogEntry>,
    pub total: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/catalog/sync
///
/// Run a full catalog sync and return its report. Only one sync runs at a
/// time; a concurrent request gets 409.
pub async fn sync_catalog(State(state): State<Arc<AppState>>) -> Response {
    let _guard = match state.try_begin_sync() {
        Ok(guard) => guard,
        Err(_) => {
            warn!("Catalog sync requested while the catalog is in use");
            SYNC_REJECTED_TOTAL.inc();
            return error_response(StatusCode::CONFLICT, "A catalog sync or enrichment is already running")
                .into_response();
        }
    };

    let report = {
        let _in_progress = GaugeGuard::enter(&SYNC_IN_PROGRESS);
        state.syncer().run().await
    };

    let status = if report.is_complete() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    (status, Json(report)).into_response()
}

/// GET /api/v1/catalog
///
/// List catalog entries in fetch order.
pub async fn list_catalog(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CatalogQueryParams>,
) -> Result<Json<CatalogListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let catalog = state.catalog();
    let limit = params.limit.min(MAX_LIMIT);

    let entries = catalog
        .list(limit, params.offset)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let total = catalog
        .count()
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(CatalogListResponse { entries, total }))
}

/// GET /api/v1/catalog/stats
///
/// Summarize the whole catalog.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsQueryParams>,
) -> Result<Json<StatisticsSummary>, (StatusCode, Json<ErrorResponse>)> {
    let (field, top_n) = params.resolve(&state)?;

    match state.catalog().list(u32::MAX, 0) {
        Ok(entries) => Ok(Json(summarize(&entries, field, top_n))),
        Err(e) => Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

/// GET /api/v1/catalog/{slug}
///
/// Get one catalog entry.
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<CatalogEntry>, impl IntoResponse> {
    match state.catalog().find_by_slug(&slug) {
        Ok(Some(entry)) => Ok(Json(entry)),
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Problem not found: {}", slug),
        )),
        Err(e) => Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
