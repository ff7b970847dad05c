use crate::errors::ApiError;

pub const MAX_QUESTION_LEN: usize = 250;
pub const MAX_ANSWER_LEN: usize = 500;

/// Trims `value` and checks it is non-blank and at most `max` characters.
pub fn require_text(field: &str, value: &str, max: usize) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::Validation(format!("{field} may not be blank")));
    }
    if value.chars().count() > max {
        return Err(ApiError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.to_string())
}
