use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateAnswerRequest {
    #[serde(default)]
    pub answer_text: String,
}

/// Replacement text for an existing answer. `answer` is accepted as an alias.
#[derive(Debug, Deserialize)]
pub struct UpdateAnswerRequest {
    #[serde(alias = "answer")]
    pub answer_text: String,
}
