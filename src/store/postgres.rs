use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Answer, NewAnswer, NewQuestion, Question, Store, StoreError, StoreResult, User};

/// PostgreSQL backend. Cascades and uniqueness come from the schema in
/// `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn classify(e: sqlx::Error) -> StoreError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return StoreError::UniqueViolation("email");
        }
        if db_err.is_foreign_key_violation() {
            let entity = match db_err.constraint() {
                Some(c) if c.contains("question") => "question",
                _ => "user",
            };
            return StoreError::MissingReference(entity);
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(classify)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, email, password_hash, created_at, updated_at FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_questions(&self) -> StoreResult<Vec<Question>> {
        let rows = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, question_text, author, author_email, created_at, updated_at
            FROM questions
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_question(&self, id: Uuid) -> StoreResult<Option<Question>> {
        let row = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, question_text, author, author_email, created_at, updated_at
            FROM questions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn create_question(&self, new: NewQuestion) -> StoreResult<Question> {
        sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (question_text, author, author_email)
            VALUES ($1, $2, $3)
            RETURNING id, question_text, author, author_email, created_at, updated_at
            "#,
        )
        .bind(&new.question_text)
        .bind(new.author)
        .bind(&new.author_email)
        .fetch_one(&self.db)
        .await
        .map_err(classify)
    }

    async fn delete_question(&self, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_answers(&self, question_id: Uuid) -> StoreResult<Vec<Answer>> {
        let rows = sqlx::query_as::<_, Answer>(
            r#"
            SELECT id, answer_text, question, author, author_email, created_at, updated_at
            FROM answers
            WHERE question = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(question_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_answer(&self, id: Uuid) -> StoreResult<Option<Answer>> {
        let row = sqlx::query_as::<_, Answer>(
            r#"
            SELECT id, answer_text, question, author, author_email, created_at, updated_at
            FROM answers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn create_answer(&self, new: NewAnswer) -> StoreResult<Answer> {
        sqlx::query_as::<_, Answer>(
            r#"
            INSERT INTO answers (answer_text, question, author, author_email)
            VALUES ($1, $2, $3, $4)
            RETURNING id, answer_text, question, author, author_email, created_at, updated_at
            "#,
        )
        .bind(&new.answer_text)
        .bind(new.question)
        .bind(new.author)
        .bind(&new.author_email)
        .fetch_one(&self.db)
        .await
        .map_err(classify)
    }

    async fn update_answer_text(&self, id: Uuid, answer_text: &str) -> StoreResult<Option<Answer>> {
        let row = sqlx::query_as::<_, Answer>(
            r#"
            UPDATE answers
               SET answer_text = $2, updated_at = now()
             WHERE id = $1
            RETURNING id, answer_text, question, author, author_email, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(answer_text)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete_answer(&self, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM answers WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
