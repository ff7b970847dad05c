use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{CreateQuestionRequest, CreatedResponse, QuestionDetails};
use crate::{
    auth::{extractors::AuthUser, policy::authorize_mutation},
    errors::ApiError,
    state::AppState,
    store::{NewQuestion, Question},
    validation::{require_text, MAX_QUESTION_LEN},
};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/questions", get(list_questions))
        .route("/questions/:question_id", get(get_question))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/questions", post(create_question))
        .route("/questions/:question_id", delete(delete_question))
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_questions(State(state): State<AppState>) -> Result<Json<Vec<Question>>, ApiError> {
    Ok(Json(state.store.list_questions().await?))
}

#[instrument(skip(state, identity, payload), fields(user_id = %identity.user_id))]
pub async fn create_question(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    payload: Result<Json<CreateQuestionRequest>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<CreatedResponse>), ApiError> {
    let Json(payload) = payload?;
    let question_text = require_text("question_text", &payload.question_text, MAX_QUESTION_LEN)?;

    // The token may outlive its user.
    let author = state
        .store
        .find_user(identity.user_id)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    let question = state
        .store
        .create_question(NewQuestion {
            question_text,
            author: author.id,
            author_email: author.email,
        })
        .await?;

    info!(question_id = %question.id, "question posted");
    Ok((
        StatusCode::CREATED,
        location(&format!("/questions/{}", question.id)),
        Json(CreatedResponse {
            message: "Question Posted",
            id: question.id,
        }),
    ))
}

#[instrument(skip(state, path))]
pub async fn get_question(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<QuestionDetails>, ApiError> {
    let Path(question_id) = path?;
    let question = state
        .store
        .find_question(question_id)
        .await?
        .ok_or(ApiError::NotFound("question"))?;
    let answers = state.store.list_answers(question.id).await?;
    Ok(Json(QuestionDetails { question, answers }))
}

#[instrument(skip(state, identity, path), fields(user_id = %identity.user_id))]
pub async fn delete_question(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(question_id) = path?;
    let question = state
        .store
        .find_question(question_id)
        .await?
        .ok_or(ApiError::NotFound("question"))?;

    authorize_mutation(&identity, question.author)?;

    if !state.store.delete_question(question.id).await? {
        // Deleted concurrently by the same owner.
        return Err(ApiError::NotFound("question"));
    }
    info!(%question_id, "question deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn location(path: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(v) = HeaderValue::from_str(path) {
        headers.insert(header::LOCATION, v);
    }
    headers
}
