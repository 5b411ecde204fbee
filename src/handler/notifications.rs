use std::sync::Arc;

use axum::{response::IntoResponse, routing::get, Extension, Json, Router};

use crate::{dtos::ApiResponse, error::HttpError, middleware::AuthParty, AppState};

pub fn notification_handler() -> Router {
    Router::new().route("/", get(list_notifications))
}

pub async fn list_notifications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
) -> Result<impl IntoResponse, HttpError> {
    let notifications = app_state
        .notification_service
        .list_notifications(&auth.party_id)
        .await?;

    Ok(Json(ApiResponse::success("Notifications retrieved", notifications)))
}
