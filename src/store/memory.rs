use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Answer, NewAnswer, NewQuestion, Question, Store, StoreError, StoreResult, User};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    questions: Vec<Question>,
    answers: Vec<Answer>,
}

/// Process-local store with the same constraints as the Postgres schema.
/// Rows are kept in insertion order, which doubles as the listing order.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        if t.users.iter().any(|u| u.email == email) {
            return Err(StoreError::UniqueViolation("email"));
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let before = t.users.len();
        t.users.retain(|u| u.id != id);
        if t.users.len() == before {
            return Ok(false);
        }
        let owned: Vec<Uuid> = t
            .questions
            .iter()
            .filter(|q| q.author == id)
            .map(|q| q.id)
            .collect();
        t.questions.retain(|q| q.author != id);
        t.answers
            .retain(|a| a.author != id && !owned.contains(&a.question));
        Ok(true)
    }

    async fn list_questions(&self) -> StoreResult<Vec<Question>> {
        Ok(self.tables.read().await.questions.clone())
    }

    async fn find_question(&self, id: Uuid) -> StoreResult<Option<Question>> {
        let t = self.tables.read().await;
        Ok(t.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn create_question(&self, new: NewQuestion) -> StoreResult<Question> {
        let mut t = self.tables.write().await;
        if !t.users.iter().any(|u| u.id == new.author) {
            return Err(StoreError::MissingReference("user"));
        }
        let now = OffsetDateTime::now_utc();
        let question = Question {
            id: Uuid::new_v4(),
            question_text: new.question_text,
            author: new.author,
            author_email: new.author_email,
            created_at: now,
            updated_at: now,
        };
        t.questions.push(question.clone());
        Ok(question)
    }

    async fn delete_question(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let before = t.questions.len();
        t.questions.retain(|q| q.id != id);
        if t.questions.len() == before {
            return Ok(false);
        }
        t.answers.retain(|a| a.question != id);
        Ok(true)
    }

    async fn list_answers(&self, question_id: Uuid) -> StoreResult<Vec<Answer>> {
        let t = self.tables.read().await;
        Ok(t.answers
            .iter()
            .filter(|a| a.question == question_id)
            .cloned()
            .collect())
    }

    async fn find_answer(&self, id: Uuid) -> StoreResult<Option<Answer>> {
        let t = self.tables.read().await;
        Ok(t.answers.iter().find(|a| a.id == id).cloned())
    }

    async fn create_answer(&self, new: NewAnswer) -> StoreResult<Answer> {
        let mut t = self.tables.write().await;
        if !t.users.iter().any(|u| u.id == new.author) {
            return Err(StoreError::MissingReference("user"));
        }
        if !t.questions.iter().any(|q| q.id == new.question) {
            return Err(StoreError::MissingReference("question"));
        }
        let now = OffsetDateTime::now_utc();
        let answer = Answer {
            id: Uuid::new_v4(),
            answer_text: new.answer_text,
            question: new.question,
            author: new.author,
            author_email: new.author_email,
            created_at: now,
            updated_at: now,
        };
        t.answers.push(answer.clone());
        Ok(answer)
    }

    async fn update_answer_text(&self, id: Uuid, answer_text: &str) -> StoreResult<Option<Answer>> {
        let mut t = self.tables.write().await;
        let Some(answer) = t.answers.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        answer.answer_text = answer_text.to_string();
        answer.updated_at = OffsetDateTime::now_utc();
        Ok(Some(answer.clone()))
    }

    async fn delete_answer(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let before = t.answers.len();
        t.answers.retain(|a| a.id != id);
        Ok(t.answers.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(store: &MemoryStore, email: &str) -> User {
        store.create_user(email, "hash").await.expect("create user")
    }

    async fn seed_question(store: &MemoryStore, author: &User, text: &str) -> Question {
        store
            .create_question(NewQuestion {
                question_text: text.into(),
                author: author.id,
                author_email: author.email.clone(),
            })
            .await
            .expect("create question")
    }

    async fn seed_answer(store: &MemoryStore, author: &User, question: &Question) -> Answer {
        store
            .create_answer(NewAnswer {
                answer_text: "an answer".into(),
                question: question.id,
                author: author.id,
                author_email: author.email.clone(),
            })
            .await
            .expect("create answer")
    }

    #[tokio::test]
    async fn email_is_unique() {
        let store = MemoryStore::new();
        seed_user(&store, "a@x.com").await;
        let err = store.create_user("a@x.com", "other").await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation("email")));
    }

    #[tokio::test]
    async fn question_requires_existing_author() {
        let store = MemoryStore::new();
        let err = store
            .create_question(NewQuestion {
                question_text: "Q".into(),
                author: Uuid::new_v4(),
                author_email: "ghost@x.com".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingReference("user")));
    }

    #[tokio::test]
    async fn answer_requires_existing_question() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "a@x.com").await;
        let err = store
            .create_answer(NewAnswer {
                answer_text: "A".into(),
                question: Uuid::new_v4(),
                author: user.id,
                author_email: user.email.clone(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingReference("question")));
    }

    #[tokio::test]
    async fn deleting_question_cascades_to_answers() {
        let store = MemoryStore::new();
        let a = seed_user(&store, "a@x.com").await;
        let b = seed_user(&store, "b@x.com").await;
        let q1 = seed_question(&store, &a, "Q1").await;
        let q2 = seed_question(&store, &a, "Q2").await;
        let gone = seed_answer(&store, &b, &q1).await;
        let kept = seed_answer(&store, &b, &q2).await;

        assert!(store.delete_question(q1.id).await.unwrap());
        assert!(store.find_answer(gone.id).await.unwrap().is_none());
        assert!(store.find_answer(kept.id).await.unwrap().is_some());
        assert!(!store.delete_question(q1.id).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_user_cascades_to_questions_and_answers() {
        let store = MemoryStore::new();
        let a = seed_user(&store, "a@x.com").await;
        let b = seed_user(&store, "b@x.com").await;
        let qa = seed_question(&store, &a, "by a").await;
        let qb = seed_question(&store, &b, "by b").await;
        let a_on_b = seed_answer(&store, &a, &qb).await;
        let b_on_a = seed_answer(&store, &b, &qa).await;
        let b_on_b = seed_answer(&store, &b, &qb).await;

        assert!(store.delete_user(a.id).await.unwrap());

        assert!(store.find_question(qa.id).await.unwrap().is_none());
        assert!(store.find_question(qb.id).await.unwrap().is_some());
        assert!(store.find_answer(a_on_b.id).await.unwrap().is_none());
        assert!(store.find_answer(b_on_a.id).await.unwrap().is_none());
        assert!(store.find_answer(b_on_b.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_answer_text_touches_only_text_and_timestamp() {
        let store = MemoryStore::new();
        let a = seed_user(&store, "a@x.com").await;
        let q = seed_question(&store, &a, "Q").await;
        let ans = seed_answer(&store, &a, &q).await;

        let updated = store
            .update_answer_text(ans.id, "better")
            .await
            .unwrap()
            .expect("answer exists");
        assert_eq!(updated.answer_text, "better");
        assert_eq!(updated.author, ans.author);
        assert_eq!(updated.question, ans.question);
        assert_eq!(updated.created_at, ans.created_at);

        assert!(store
            .update_answer_text(Uuid::new_v4(), "x")
            .await
            .unwrap()
            .is_none());
    }
}
