use std::convert::Infallible;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderName};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures::Stream;
use tracing::{info, warn};

use super::{ApiError, AppState};
use crate::stream::{ChatRequest, ChatTurn, ResponseStream, StreamChunk};

const MISSING_MESSAGE: &str = "Сообщение пользователя отсутствует";

/// Name of the SSE event carrying `{query, results}` when a search ran.
pub const SEARCH_RESULTS_EVENT: &str = "search_results";

pub fn router() -> Router<AppState> {
    Router::new().route("/api/chat", post(post_chat))
}

pub async fn post_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(%rejection, "malformed chat request");
        ApiError::BadRequest(MISSING_MESSAGE)
    })?;
    let turn = ChatTurn::from_request(request).map_err(|e| {
        warn!(error = %e, "rejecting chat request");
        ApiError::BadRequest(MISSING_MESSAGE)
    })?;

    info!(mode = ?turn.mode(), history = turn.history.len(), "chat request accepted");
    let stream = state.streamer.stream_response(turn);

    let headers = [
        (header::CACHE_CONTROL, "no-cache, no-transform"),
        (HeaderName::from_static("x-accel-buffering"), "no"),
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    ];
    Ok((headers, Sse::new(into_events(stream))).into_response())
}

/// One `data:` frame per chunk. Search metadata goes out as its own named
/// event right before the first content chunk, or at the end of the stream if
/// no content chunk was sent.
fn into_events(mut stream: ResponseStream) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        let mut metadata_pending = true;

        while let Some(chunk) = stream.next_chunk().await {
            if metadata_pending && matches!(chunk, StreamChunk::Content(_)) {
                metadata_pending = false;
                if let Some(event) = metadata_event(&stream) {
                    yield Ok(event);
                }
            }

            yield Ok(Event::default().data(chunk.text()));
        }

        if metadata_pending {
            if let Some(event) = metadata_event(&stream) {
                yield Ok(event);
            }
        }
    }
}

fn metadata_event(stream: &ResponseStream) -> Option<Event> {
    let metadata = stream.metadata()?;
    match Event::default().event(SEARCH_RESULTS_EVENT).json_data(metadata) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(error = %e, "failed to encode search metadata");
            None
        }
    }
}
