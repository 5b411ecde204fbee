use thiserror::Error;
use uuid::Uuid;
use axum::http::StatusCode;

use crate::error::HttpError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cannot move {entity} {id} from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        id: String,
        from: String,
        to: String,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Refund is not allowed for payment {0}: {1}")]
    RefundNotAllowed(Uuid, String),

    #[error("Payment {0} was declined: {1}")]
    PaymentFailed(Uuid, String),

    #[error("Refund {0} was declined: {1}")]
    RefundFailed(Uuid, String),

    #[error("Invalid message data: {0}")]
    InvalidMessageData(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Concurrent update on {entity} {id}, reload and retry")]
    Conflict { entity: &'static str, id: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn conflict(entity: &'static str, id: impl ToString) -> Self {
        ServiceError::Conflict {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid_transition(
        entity: &'static str,
        id: impl ToString,
        from: &str,
        to: &str,
    ) -> Self {
        ServiceError::InvalidTransition {
            entity,
            id: id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,

            ServiceError::Validation(_)
            | ServiceError::InvalidMessageData(_) => StatusCode::BAD_REQUEST,

            ServiceError::InvalidTransition { .. }
            | ServiceError::InvalidState(_)
            | ServiceError::RefundNotAllowed(_, _)
            | ServiceError::Conflict { .. } => StatusCode::CONFLICT,

            ServiceError::PaymentFailed(_, _)
            | ServiceError::RefundFailed(_, _) => StatusCode::PAYMENT_REQUIRED,

            ServiceError::PermissionDenied(_) => StatusCode::FORBIDDEN,

            ServiceError::Network(_) => StatusCode::BAD_GATEWAY,

            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        if status.is_server_error() {
            tracing::error!("Service failure: {}", error);
        }
        HttpError::new(error.to_string(), status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_machine_errors_map_to_conflict() {
        let err = ServiceError::invalid_transition("booking", "b1", "confirmed", "completed");
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Cannot move booking b1 from confirmed to completed");
    }

    #[test]
    fn http_error_keeps_message_and_status() {
        let http: HttpError = ServiceError::not_found("payment", "p9").into();
        assert_eq!(http.status, StatusCode::NOT_FOUND);
        assert_eq!(http.message, "payment p9 not found");

        let http: HttpError = ServiceError::Validation("UPI id is required".into()).into();
        assert_eq!(http.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn declines_are_payment_required() {
        let err = ServiceError::PaymentFailed(Uuid::nil(), "insufficient funds".into());
        assert_eq!(err.status_code(), StatusCode::PAYMENT_REQUIRED);
    }
}
