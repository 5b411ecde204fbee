use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::Path,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::{get, put},
    Extension, Json, Router,
};
use futures::{Stream, StreamExt};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{chatdtos::*, ApiResponse},
    error::HttpError,
    middleware::AuthParty,
    AppState,
};

pub fn chat_handler() -> Router {
    Router::new()
        .route("/threads", get(list_threads))
        .route("/unread-count", get(get_unread_count))
        .route("/:other_id/messages", get(load_history).post(send_message))
        .route("/:other_id/read", put(mark_thread_read))
        .route("/:other_id/messages/:message_id/read", put(mark_message_read))
        .route("/:other_id/stream", get(stream_thread))
}

pub async fn list_threads(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
) -> Result<impl IntoResponse, HttpError> {
    let threads = app_state.chat_service.list_threads(&auth.party_id).await?;

    Ok(Json(ApiResponse::success("Threads retrieved", threads)))
}

pub async fn get_unread_count(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
) -> Result<impl IntoResponse, HttpError> {
    let unread_count = app_state.chat_service.unread_count(&auth.party_id).await?;

    Ok(Json(ApiResponse::success(
        "Unread count retrieved",
        UnreadCountResponse { unread_count },
    )))
}

pub async fn load_history(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
    Path(other_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let history = app_state
        .chat_service
        .load_history(&auth.party_id, &other_id)
        .await?;

    Ok(Json(ApiResponse::success(
        &format!("{} messages", history.messages.len()),
        history,
    )))
}

pub async fn send_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
    Path(other_id): Path<String>,
    Json(body): Json<SendMessageDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let message = app_state
        .chat_service
        .send_message(&auth.party_id, &other_id, &body.content, body.message_type)
        .await?;

    Ok(Json(ApiResponse::success("Message sent", message)))
}

pub async fn mark_thread_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
    Path(other_id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let thread = app_state.chat_service.thread_between(&auth.party_id, &other_id)?;
    let flipped = app_state
        .chat_service
        .mark_all_read(&thread, Some(&auth.party_id))
        .await?;

    Ok(Json(ApiResponse::success(
        "Thread marked as read",
        MarkReadResponse { flipped },
    )))
}

pub async fn mark_message_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
    Path((other_id, message_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, HttpError> {
    let thread = app_state.chat_service.thread_between(&auth.party_id, &other_id)?;
    let flipped = app_state.chat_service.mark_read(&thread, message_id).await?;

    Ok(Json(ApiResponse::success(
        "Message marked as read",
        MarkReadResponse {
            flipped: flipped as u64,
        },
    )))
}

/// Server-sent events carrying every message appended to the thread after
/// the client connects.
pub async fn stream_thread(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
    Path(other_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, HttpError> {
    let thread = app_state.chat_service.thread_between(&auth.party_id, &other_id)?;
    tracing::debug!("{} subscribed to {}", auth.party_id, thread);

    let stream = app_state
        .chat_service
        .subscribe(&thread)
        .into_stream()
        .map(|message| {
            let event = Event::default().event("message").id(message.seq.to_string());
            Ok(event.json_data(&message).unwrap_or_else(|e| {
                tracing::warn!("Failed to encode message {}: {}", message.id, e);
                Event::default().event("error").data("unencodable message")
            }))
        });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
