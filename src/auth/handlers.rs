use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, PublicUser, RegisterRequest, RegisterResponse},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
    },
    errors::ApiError,
    state::AppState,
};

pub const MAX_EMAIL_LEN: usize = 225;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    email.len() <= MAX_EMAIL_LEN && EMAIL_RE.is_match(email)
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me).delete(delete_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let Json(mut payload) = payload?;
    payload.email = payload.email.trim().to_lowercase();

    if payload.email.is_empty() {
        return Err(ApiError::Validation("email is required".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.is_empty() {
        return Err(ApiError::Validation("password is required".into()));
    }

    if state.store.find_user_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Validation("Email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    // A concurrent registration can still win the race; the store reports it.
    let user = state.store.create_user(&payload.email, &hash).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "account created",
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(mut payload) = payload?;
    payload.email = payload.email.trim().to_lowercase();

    let Some(user) = state.store.find_user_by_email(&payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(ApiError::Unauthenticated);
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthenticated);
    }

    let token = JwtKeys::from_ref(&state).issue(&user)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state
        .store
        .find_user(identity.user_id)
        .await?
        .ok_or(ApiError::Unauthenticated)?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn delete_me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_user(identity.user_id).await? {
        return Err(ApiError::Unauthenticated);
    }
    info!("user deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("johndoe@gmail.com"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("a@nodot"));
        let long = format!("{}@x.com", "a".repeat(MAX_EMAIL_LEN));
        assert!(!is_valid_email(&long));
    }

    #[test]
    fn public_user_hides_password_hash() {
        let response = PublicUser {
            id: uuid::Uuid::new_v4(),
            email: "test@example.com".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(!json.contains("password"));
    }
}
