use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{HeaderMap, StatusCode},
    routing::{post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{CreateAnswerRequest, UpdateAnswerRequest};
use crate::{
    auth::{
        extractors::AuthUser,
        policy::{authorize_mutation, Identity},
    },
    errors::ApiError,
    questions::{dto::CreatedResponse, handlers::location},
    state::AppState,
    store::{Answer, NewAnswer},
    validation::{require_text, MAX_ANSWER_LEN},
};

pub fn answer_routes() -> Router<AppState> {
    Router::new()
        .route("/questions/:question_id/answers", post(create_answer))
        .route(
            "/questions/:question_id/answers/:answer_id",
            put(update_answer).delete(delete_answer),
        )
}

#[instrument(skip(state, identity, path, payload), fields(user_id = %identity.user_id))]
pub async fn create_answer(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CreateAnswerRequest>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<CreatedResponse>), ApiError> {
    let Path(question_id) = path?;
    let Json(payload) = payload?;
    let answer_text = require_text("answer_text", &payload.answer_text, MAX_ANSWER_LEN)?;

    let author = state
        .store
        .find_user(identity.user_id)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    // No orphaned answers. The store rejects the insert as well if the
    // question is deleted in between.
    let question = state
        .store
        .find_question(question_id)
        .await?
        .ok_or(ApiError::NotFound("question"))?;

    let answer = state
        .store
        .create_answer(NewAnswer {
            answer_text,
            question: question.id,
            author: author.id,
            author_email: author.email,
        })
        .await?;

    info!(%question_id, answer_id = %answer.id, "answer posted");
    Ok((
        StatusCode::CREATED,
        location(&format!("/questions/{}/answers/{}", question_id, answer.id)),
        Json(CreatedResponse {
            message: "Answer Posted",
            id: answer.id,
        }),
    ))
}

#[instrument(skip(state, identity, path, payload), fields(user_id = %identity.user_id))]
pub async fn update_answer(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
    payload: Result<Json<UpdateAnswerRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Path((question_id, answer_id)) = path?;
    let answer = owned_answer(&state, &identity, question_id, answer_id).await?;

    let Json(payload) = payload?;
    let answer_text = require_text("answer_text", &payload.answer_text, MAX_ANSWER_LEN)?;

    state
        .store
        .update_answer_text(answer.id, &answer_text)
        .await?
        .ok_or(ApiError::NotFound("answer"))?;
    info!(%answer_id, "answer updated");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, identity, path), fields(user_id = %identity.user_id))]
pub async fn delete_answer(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path((question_id, answer_id)) = path?;
    let answer = owned_answer(&state, &identity, question_id, answer_id).await?;

    if !state.store.delete_answer(answer.id).await? {
        return Err(ApiError::NotFound("answer"));
    }
    info!(%answer_id, "answer deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Loads the answer addressed by the path and checks the caller wrote it.
/// An answer filed under a different question is treated as absent.
async fn owned_answer(
    state: &AppState,
    identity: &Identity,
    question_id: Uuid,
    answer_id: Uuid,
) -> Result<Answer, ApiError> {
    let answer = state
        .store
        .find_answer(answer_id)
        .await?
        .filter(|a| a.question == question_id)
        .ok_or(ApiError::NotFound("answer"))?;
    authorize_mutation(identity, answer.author)?;
    Ok(answer)
}
