use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{Answer, Question};

#[derive(Debug, Deserialize)]
pub struct CreateQuestionRequest {
    #[serde(default)]
    pub question_text: String,
}

/// `GET /questions/:id` body.
#[derive(Debug, Serialize)]
pub struct QuestionDetails {
    pub question: Question,
    pub answers: Vec<Answer>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub id: Uuid,
}
