use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, FranchiseSummaryDto, GuideQuery, SystemStatusDto};
use crate::services::catalog;
use crate::services::resolver::Resolution;

/// Resolve a query (numeric id, title, or franchise name) to a guide.
/// Exhausting every strategy is a 404 with "no guide available", never a
/// server fault.
pub async fn resolve_guide(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GuideQuery>,
) -> Result<Json<ApiResponse<Resolution>>, ApiError> {
    if params.q.trim().is_empty() {
        return Err(ApiError::validation("query must not be empty"));
    }

    let resolution = state.shared.resolver.resolve(&params.q).await;

    if resolution.is_absent() {
        return Err(ApiError::no_guide());
    }

    Ok(Json(ApiResponse::success(resolution)))
}

pub async fn list_franchises(
    State(_state): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<FranchiseSummaryDto>>> {
    let franchises = catalog::all()
        .iter()
        .map(|f| FranchiseSummaryDto {
            name: f.name.to_string(),
            series: f.members.len(),
            special_instructions: f.special_instructions.map(String::from),
        })
        .collect();

    Json(ApiResponse::success(franchises))
}

pub async fn get_franchise(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<Resolution>>, ApiError> {
    let Some(franchise) = catalog::find(&name) else {
        return Err(ApiError::NotFound(format!("franchise '{name}' not found")));
    };

    let resolution = state.shared.resolver.resolve(franchise.name).await;

    if resolution.is_absent() {
        return Err(ApiError::no_guide());
    }

    Ok(Json(ApiResponse::success(resolution)))
}

pub async fn system_status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<SystemStatusDto>> {
    let (cached_guides, cached_searches, cached_franchises) = state.shared.guides.sizes();

    Json(ApiResponse::success(SystemStatusDto {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        cached_guides,
        cached_searches,
        cached_franchises,
        cached_responses: state.shared.episode_cache.len(),
    }))
}
