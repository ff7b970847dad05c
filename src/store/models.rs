use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, never exposed in JSON
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: Uuid,
    pub question_text: String,
    pub author: Uuid,
    /// Author email at the time the question was posted.
    pub author_email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Answer {
    pub id: Uuid,
    pub answer_text: String,
    pub question: Uuid,
    pub author: Uuid,
    pub author_email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub question_text: String,
    pub author: Uuid,
    pub author_email: String,
}

#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub answer_text: String,
    pub question: Uuid,
    pub author: Uuid,
    pub author_email: String,
}
