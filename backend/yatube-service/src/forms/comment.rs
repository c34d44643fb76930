use super::{FieldErrors, Submission, REQUIRED};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CommentForm {
    pub text: String,
    pub errors: FieldErrors,
}

impl CommentForm {
    /// Trimmed comment text, or the form with its errors
    pub fn validate(submission: &Submission) -> Result<String, CommentForm> {
        let text = submission.value("text");
        let cleaned = text.trim();
        if cleaned.is_empty() {
            let mut errors = FieldErrors::default();
            errors.add("text", REQUIRED);
            return Err(CommentForm { text, errors });
        }
        Ok(cleaned.to_string())
    }
}
