use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{claims::{ClaimIssuer, RoomClaims}, AppError};

/// Extracts and verifies the bearer claim from the Authorization header.
/// Possession of a valid claim is the whole authorization story; handlers
/// still compare `room_id` against the resource they serve.
pub struct Claim(pub RoomClaims);

impl<S> FromRequestParts<S> for Claim
where
    ClaimIssuer: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let issuer = ClaimIssuer::from_ref(state);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Auth("missing bearer claim".to_owned()))?;

        Ok(Claim(issuer.verify(token)?))
    }
}
