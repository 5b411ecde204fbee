use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{bookingdtos::*, ApiResponse},
    error::{ErrorMessage, HttpError},
    middleware::AuthParty,
    models::partymodel::PartyType,
    service::booking_service::NewBooking,
    AppState,
};

pub fn booking_handler() -> Router {
    Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .route("/stats", get(get_customer_stats))
        .route("/:booking_id", get(get_booking))
        .route("/:booking_id/status", put(update_booking_status))
        .route("/:booking_id/review", post(review_booking))
}

pub async fn create_booking(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
    Json(body): Json<CreateBookingDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let booking = app_state
        .booking_service
        .create_booking(
            &auth.party_id,
            NewBooking {
                worker_id: body.worker_id,
                service_type: body.service_type,
                scheduled_date: body.scheduled_date,
                scheduled_time: body.scheduled_time,
                description: body.description,
                address: body.address,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success("Booking created", booking)))
}

pub async fn list_bookings(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
    Query(params): Query<BookingListQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let role = params.role.unwrap_or(PartyType::Customer);
    let bookings = app_state
        .booking_service
        .list_bookings(&auth.party_id, role)
        .await?;

    Ok(Json(ApiResponse::success(
        &format!("{} bookings as {}", bookings.len(), role.to_str()),
        bookings,
    )))
}

pub async fn get_customer_stats(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
) -> Result<impl IntoResponse, HttpError> {
    let stats = app_state.booking_service.customer_stats(&auth.party_id).await?;

    Ok(Json(ApiResponse::success("Booking stats retrieved", stats)))
}

pub async fn get_booking(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let booking = app_state.booking_service.get_booking(booking_id).await?;

    if !booking.involves(&auth.party_id) {
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    Ok(Json(ApiResponse::success("Booking retrieved", booking)))
}

pub async fn update_booking_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
    Path(booking_id): Path<Uuid>,
    Json(body): Json<UpdateBookingStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let booking = app_state
        .booking_service
        .update_status(&auth.party_id, booking_id, body.status, body.actual_cost)
        .await?;

    Ok(Json(ApiResponse::success(
        &format!("Booking is now {}", booking.status.to_str()),
        booking,
    )))
}

pub async fn review_booking(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
    Path(booking_id): Path<Uuid>,
    Json(body): Json<ReviewBookingDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let booking = app_state
        .booking_service
        .attach_review(&auth.party_id, booking_id, body.rating, body.review)
        .await?;

    Ok(Json(ApiResponse::success("Review submitted", booking)))
}
