// utils/token.rs
#[cfg(test)]
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
#[cfg(test)]
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorMessage, HttpError};

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    // party id issued by the identity provider
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

/// Tokens are minted by the identity provider; this issues them for tests.
#[cfg(test)]
pub fn create_token(
    party_id: &str,
    secret: &[u8],
    expires_in_minutes: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    if party_id.is_empty() {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidSubject.into());
    }

    let now = Utc::now();
    let claims = TokenClaims {
        sub: party_id.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::minutes(expires_in_minutes)).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
}

/// Returns the party id carried in `sub`.
pub fn decode_token<T: Into<String>>(token: T, secret: &[u8]) -> Result<String, HttpError> {
    let decoded = decode::<TokenClaims>(
        &token.into(),
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    );

    match decoded {
        Ok(token) if !token.claims.sub.is_empty() => Ok(token.claims.sub),
        _ => Err(HttpError::unauthorized(ErrorMessage::InvalidToken.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_the_party_id() {
        let token = create_token("party-42", b"secret", 60).unwrap();
        assert_eq!(decode_token(token, b"secret").unwrap(), "party-42");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token("party-42", b"secret", 60).unwrap();
        assert!(decode_token(token, b"other").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = create_token("party-42", b"secret", -10).unwrap();
        assert!(decode_token(token, b"secret").is_err());
    }

    #[test]
    fn empty_subject_cannot_be_issued() {
        assert!(create_token("", b"secret", 60).is_err());
    }
}
