//! Persistence for users, questions and answers.
//!
//! Handlers only see the [`Store`] trait. Uniqueness, referential integrity
//! and cascading deletes are the backend's job.

mod memory;
mod models;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use models::{Answer, NewAnswer, NewQuestion, Question, User};
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    UniqueViolation(&'static str),
    #[error("referenced {0} does not exist")]
    MissingReference(&'static str),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Removes the user together with every question and answer they authored.
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;

    async fn list_questions(&self) -> StoreResult<Vec<Question>>;
    async fn find_question(&self, id: Uuid) -> StoreResult<Option<Question>>;
    async fn create_question(&self, new: NewQuestion) -> StoreResult<Question>;
    /// Removes the question together with all of its answers.
    async fn delete_question(&self, id: Uuid) -> StoreResult<bool>;

    async fn list_answers(&self, question_id: Uuid) -> StoreResult<Vec<Answer>>;
    async fn find_answer(&self, id: Uuid) -> StoreResult<Option<Answer>>;
    async fn create_answer(&self, new: NewAnswer) -> StoreResult<Answer>;
    async fn update_answer_text(&self, id: Uuid, answer_text: &str) -> StoreResult<Option<Answer>>;
    async fn delete_answer(&self, id: Uuid) -> StoreResult<bool>;
}
