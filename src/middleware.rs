// middleware.rs
use std::sync::Arc;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::IntoResponse,
    Extension,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ErrorMessage, HttpError},
    utils::token,
    AppState,
};

/// The caller as resolved from its bearer token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthParty {
    pub party_id: String,
}

pub async fn auth(
    cookie_jar: CookieJar,
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let token = cookie_jar
        .get("token")
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
                .map(|token| token.trim().to_owned())
        })
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::TokenNotProvided.to_string()))?;

    let party_id = token::decode_token(token, app_state.env.jwt_secret.as_bytes())?;

    req.extensions_mut().insert(AuthParty { party_id });

    Ok(next.run(req).await)
}
