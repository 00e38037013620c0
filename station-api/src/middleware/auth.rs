use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use station_core::UserId;

use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlayerClaims {
    /// Numeric user id, as a string
    pub sub: String,
    pub exp: usize,
}

// ============================================================================
// Identity Extractor
// ============================================================================

/// The calling user, if the request carries a valid bearer token.
///
/// Never rejects: a missing or invalid token yields `Identity(None)` and the
/// service decides what an anonymous caller may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity(pub Option<UserId>);

impl FromRequestParts<AppState> for Identity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "));

        Ok(Identity(token.and_then(|t| user_id_from_token(t, &state.auth.secret))))
    }
}

pub fn user_id_from_token(token: &str, secret: &str) -> Option<UserId> {
    let token_data = decode::<PlayerClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| debug!("Rejected bearer token: {}", e))
    .ok()?;

    token_data.claims.sub.parse().ok()
}
