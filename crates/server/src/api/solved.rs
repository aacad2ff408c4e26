//! Solved-set API handlers.
//!
//! All routes are keyed by an explicit owner id in the path.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use drillbook_core::{
    normalize_owner_id, summarize, EnrichMode, EnrichmentReport, ImportError, ImportReport,
    LookupStrategy, SolvedRecord, StatisticsSummary,
};

use super::handlers::{error_response, ErrorResponse, StatsQueryParams};
use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Owner id from the path, in the same form the importer stores it.
fn owner_id(raw: &str) -> Result<&str, ApiError> {
    normalize_owner_id(raw)
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "Owner id must not be blank"))
}

#[derive(Debug, Default, Deserialize)]
pub struct EnrichQueryParams {
    /// Revisit records that already have tags.
    #[serde(default)]
    pub force: bool,
    /// Load the catalog topic map once instead of per-record lookups.
    #[serde(default)]
    pub preload: bool,
}

#[derive(Debug, Serialize)]
pub struct SolvedListResponse {
    pub owner_id: String,
    pub records: Vec<SolvedRecord>,
    pub total: usize,
}

/// POST /api/v1/owners/{owner}/solved/import
///
/// Body is the raw snapshot. Replaces every record of the owner.
pub async fn import_snapshot(
    State(state): State<Arc<AppState>>,
    Path(owner): Path<String>,
    body: String,
) -> Result<Json<ImportReport>, ApiError> {
    let owner = owner_id(&owner)?;
    match state.importer().import_snapshot(owner, &body).await {
        Ok(report) => Ok(Json(report)),
        Err(ImportError::Parse(msg)) => Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid snapshot: {}", msg),
        )),
        Err(e) => Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

/// POST /api/v1/owners/{owner}/solved/enrich
///
/// Join topic tags from the catalog onto the owner's records. Refused with
/// 409 while a catalog sync is replacing the catalog.
pub async fn enrich(
    State(state): State<Arc<AppState>>,
    Path(owner): Path<String>,
    Query(params): Query<EnrichQueryParams>,
) -> Result<Json<EnrichmentReport>, ApiError> {
    let owner = owner_id(&owner)?;
    let _catalog = state.try_begin_enrich().map_err(|_| {
        warn!(owner_id = owner, "Enrichment requested during a catalog sync");
        error_response(
            StatusCode::CONFLICT,
            "A catalog sync is running, retry once it has finished",
        )
    })?;

    let mode = if params.force {
        EnrichMode::Force
    } else {
        EnrichMode::MissingOnly
    };
    let strategy = if params.preload {
        LookupStrategy::Preloaded
    } else {
        LookupStrategy::PointLookup
    };

    state
        .enricher(strategy)
        .enrich_all(owner, mode)
        .await
        .map(Json)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// GET /api/v1/owners/{owner}/solved
pub async fn list_solved(
    State(state): State<Arc<AppState>>,
    Path(owner): Path<String>,
) -> Result<Json<SolvedListResponse>, ApiError> {
    let owner = owner_id(&owner)?;
    let records = state
        .solved_store()
        .list_for_owner(owner)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(SolvedListResponse {
        owner_id: owner.to_string(),
        total: records.len(),
        records,
    }))
}

/// GET /api/v1/owners/{owner}/solved/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Path(owner): Path<String>,
    Query(params): Query<StatsQueryParams>,
) -> Result<Json<StatisticsSummary>, ApiError> {
    let owner = owner_id(&owner)?;
    let (field, top_n) = params.resolve(&state)?;

    let records = state
        .solved_store()
        .list_for_owner(owner)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(summarize(&records, field, top_n)))
}
