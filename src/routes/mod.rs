//! HTTP surface:
//! - `POST /api/chat` - streamed chat answer (SSE)
//! - `POST /api/perplexity` - raw search results
//! - `GET /api/health` - liveness

pub mod chat;
pub mod health;
pub mod search;

use std::any::Any;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::search::SearchProvider;
use crate::stream::ResponseStreamer;

pub const INTERNAL_ERROR_MESSAGE: &str = "Внутренняя ошибка сервера";

#[derive(Clone)]
pub struct AppState {
    pub streamer: ResponseStreamer,
    pub search: Arc<dyn SearchProvider>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(chat::router())
        .merge(search::router())
        .merge(health::router())
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

/// Rejections that happen before any stream is opened. Bodies are fixed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    BadRequest(&'static str),
    Internal,
}

impl ApiError {
    fn parts(self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.parts().into_response()
    }
}

/// [`ApiError`] rendered as `{"error": "..."}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonError(pub ApiError);

impl IntoResponse for JsonError {
    fn into_response(self) -> Response {
        let (status, message) = self.0.parts();
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

fn panic_response(_payload: Box<dyn Any + Send + 'static>) -> Response {
    error!("request handler panicked");
    ApiError::Internal.into_response()
}
