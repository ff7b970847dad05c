use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::{
    jwt::{JwtKeys, TokenError},
    policy::{authenticate, Identity},
};
use crate::errors::ApiError;

/// Extracts and validates the bearer token, yielding the caller's identity.
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let header = match parts.headers.get(AUTHORIZATION) {
            None => None,
            Some(v) => Some(v.to_str().map_err(|_| {
                warn!("non-ascii Authorization header");
                ApiError::Unauthenticated
            })?),
        };

        match authenticate(&keys, header) {
            Ok(identity) => Ok(AuthUser(identity)),
            Err(TokenError::MissingCredential) => Err(ApiError::Unauthenticated),
            Err(e) => {
                warn!(reason = %e, "bearer token rejected");
                Err(e.into())
            }
        }
    }
}
