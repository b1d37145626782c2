use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::{ApiError, AppState, JsonError};
use crate::search::{Focus, SearchOptions, SearchProvider, SearchResult};

const MISSING_QUERY_MESSAGE: &str = "Отсутствует поисковый запрос";

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    pub focus: Option<Focus>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/perplexity", post(post_search))
}

pub async fn post_search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, JsonError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(%rejection, "malformed search request");
        JsonError(ApiError::BadRequest(MISSING_QUERY_MESSAGE))
    })?;
    if request.query.trim().is_empty() {
        return Err(JsonError(ApiError::BadRequest(MISSING_QUERY_MESSAGE)));
    }

    let options = SearchOptions {
        focus: Some(request.focus.unwrap_or_default()),
        ..SearchOptions::default()
    };
    let results = state
        .search
        .search(&request.query, &options)
        .await
        .map_err(|e| {
            error!(error = %e, "search request failed");
            JsonError(ApiError::Internal)
        })?;

    Ok(Json(SearchResponse { results }))
}
