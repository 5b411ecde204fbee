// routes.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        bookings::booking_handler, chat::chat_handler, notifications::notification_handler,
        parties::party_handler, payments::payment_handler, workers::worker_handler,
    },
    middleware::auth,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/parties", party_handler())
        .nest("/workers", worker_handler())
        .nest("/bookings", booking_handler())
        .nest("/payments", payment_handler())
        .nest("/chat", chat_handler())
        .nest("/notifications", notification_handler())
        .layer(middleware::from_fn(auth));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state))
}
