//! Who is calling, and may they touch this resource.

use tracing::warn;
use uuid::Uuid;

use super::jwt::{JwtKeys, TokenError};
use crate::errors::ApiError;

/// The authenticated caller, recovered from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

pub fn authenticate(keys: &JwtKeys, raw_header: Option<&str>) -> Result<Identity, TokenError> {
    let claims = keys.verify(raw_header)?;
    Ok(Identity {
        user_id: claims.user_id,
        email: claims.user_email,
    })
}

/// Mutations are allowed only on resources the caller authored.
pub fn authorize_mutation(identity: &Identity, owner_id: Uuid) -> Result<(), ApiError> {
    if identity.user_id == owner_id {
        return Ok(());
    }
    warn!(user_id = %identity.user_id, owner_id = %owner_id, "ownership check failed");
    Err(ApiError::Forbidden)
}

impl From<TokenError> for ApiError {
    fn from(_: TokenError) -> Self {
        ApiError::Unauthenticated
    }
}
