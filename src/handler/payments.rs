use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{paymentdtos::*, ApiResponse},
    error::HttpError,
    middleware::AuthParty,
    service::payment_service::NewPayment,
    AppState,
};

pub fn payment_handler() -> Router {
    Router::new()
        .route("/", get(payment_history).post(initiate_payment))
        .route("/analytics", get(payment_analytics))
        .route("/:payment_id/process", post(process_payment))
        .route("/:payment_id/cancel", post(cancel_payment))
        .route("/:payment_id/refunds", post(initiate_refund))
        .route("/refunds/:refund_id/process", post(process_refund))
}

pub async fn initiate_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
    Json(body): Json<InitiatePaymentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let payment = app_state
        .payment_service
        .initiate_payment(
            &auth.party_id,
            NewPayment {
                booking_id: body.booking_id,
                amount: body.amount,
                method: body.method,
                upi_id: body.upi_id,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success("Payment initiated", payment)))
}

pub async fn payment_history(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
) -> Result<impl IntoResponse, HttpError> {
    let payments = app_state.payment_service.payment_history(&auth.party_id).await?;

    Ok(Json(ApiResponse::success("Payment history retrieved", payments)))
}

pub async fn payment_analytics(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
) -> Result<impl IntoResponse, HttpError> {
    let analytics = app_state.payment_service.get_analytics(&auth.party_id).await?;

    Ok(Json(ApiResponse::success("Payment analytics retrieved", analytics)))
}

pub async fn process_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let payment = app_state
        .payment_service
        .process_payment(&auth.party_id, payment_id)
        .await?;

    Ok(Json(ApiResponse::success("Payment completed", payment)))
}

pub async fn cancel_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let payment = app_state
        .payment_service
        .cancel_payment(&auth.party_id, payment_id)
        .await?;

    Ok(Json(ApiResponse::success("Payment cancelled", payment)))
}

pub async fn initiate_refund(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
    Path(payment_id): Path<Uuid>,
    Json(body): Json<InitiateRefundDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let refund = app_state
        .payment_service
        .initiate_refund(&auth.party_id, payment_id, &body.reason)
        .await?;

    Ok(Json(ApiResponse::success("Refund requested", refund)))
}

pub async fn process_refund(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthParty>,
    Path(refund_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let refund = app_state
        .payment_service
        .process_refund(&auth.party_id, refund_id)
        .await?;

    Ok(Json(ApiResponse::success("Refund completed", refund)))
}
