/// Input validation for user-submitted content
///
/// All checks run before any ledger mutation; a rejected body never touches
/// the store.
use crate::error::WisperError;

/// Maximum wisper body length in characters
pub const MAX_WISPER_CHARS: usize = 1000;

/// Maximum comment body length in characters
pub const MAX_COMMENT_CHARS: usize = 500;

/// Username length bounds in characters
pub const MIN_USERNAME_CHARS: usize = 3;
pub const MAX_USERNAME_CHARS: usize = 32;

/// Validation error detail
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

/// Validation result with detailed errors
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate a wisper body
pub fn validate_wisper_content(content: &str) -> ValidationResult {
    validate_body(content, MAX_WISPER_CHARS)
}

/// Validate a comment body
pub fn validate_comment_content(content: &str) -> ValidationResult {
    validate_body(content, MAX_COMMENT_CHARS)
}

/// Validate a username handle
pub fn validate_username(username: &str) -> ValidationResult {
    let mut errors = Vec::new();
    let trimmed = username.trim();

    let char_count = trimmed.chars().count();
    if char_count < MIN_USERNAME_CHARS || char_count > MAX_USERNAME_CHARS {
        errors.push(ValidationError {
            path: "$.username".to_string(),
            message: format!(
                "Username must be between {} and {} characters",
                MIN_USERNAME_CHARS, MAX_USERNAME_CHARS
            ),
        });
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        errors.push(ValidationError {
            path: "$.username".to_string(),
            message: "Username may only contain letters, digits, '_' and '-'".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_body(content: &str, max_chars: usize) -> ValidationResult {
    let mut errors = Vec::new();

    if content.trim().is_empty() {
        errors.push(ValidationError {
            path: "$.content".to_string(),
            message: "Content must not be empty".to_string(),
        });
    }

    let char_count = content.chars().count();
    if char_count > max_chars {
        errors.push(ValidationError {
            path: "$.content".to_string(),
            message: format!(
                "Content exceeds maximum length of {} characters: {}",
                max_chars, char_count
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Convert validation errors to WisperError
pub fn validation_errors_to_error(errors: Vec<ValidationError>) -> WisperError {
    let messages: Vec<String> = errors
        .iter()
        .map(|e| format!("{}: {}", e.path, e.message))
        .collect();

    WisperError::Validation(messages.join("; "))
}
