use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload used for authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub user_email: String,
    pub iat: i64,    // issued at (unix timestamp)
    pub exp: i64,    // expires at (unix timestamp)
    pub iss: String,
    pub aud: String,
}
