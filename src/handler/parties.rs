use std::sync::Arc;

use axum::{
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::{partydtos::*, ApiResponse},
    error::HttpError,
    middleware::AuthParty,
    service::party_service::{NewParty, ProfileUpdate},
    AppState,
};

pub fn party_handler() -> Router {
    Router::new()
        .route("/me", get(get_me).post(register).put(update_me))
        .route("/me/availability", put(set_availability))
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
    Json(body): Json<RegisterPartyDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let party = app_state
        .party_service
        .register_party(NewParty {
            id: auth.party_id,
            name: body.name,
            email: body.email,
            phone: body.phone,
            address: body.address,
            party_type: body.party_type,
            services: body.services,
        })
        .await?;

    Ok(Json(ApiResponse::success("Profile created", party)))
}

pub async fn get_me(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
) -> Result<impl IntoResponse, HttpError> {
    let party = app_state.party_service.get_party(&auth.party_id).await?;

    Ok(Json(ApiResponse::success("Profile retrieved", party)))
}

pub async fn update_me(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
    Json(body): Json<UpdateProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let party = app_state
        .party_service
        .update_profile(
            &auth.party_id,
            ProfileUpdate {
                name: body.name,
                email: body.email,
                phone: body.phone,
                address: body.address,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success("Profile updated", party)))
}

pub async fn set_availability(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
    Json(body): Json<UpdateAvailabilityDto>,
) -> Result<impl IntoResponse, HttpError> {
    let worker = app_state
        .directory_service
        .set_availability(&auth.party_id, body.is_active)
        .await?;

    let message = if worker.is_active {
        "You are now accepting bookings"
    } else {
        "You are no longer accepting bookings"
    };
    Ok(Json(ApiResponse::success(message, worker)))
}
