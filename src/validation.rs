// Validation utilities module
// Provides custom validation functions for domain-specific rules

use validator::ValidationError;

/// Sigil the system prepends to handles for display
pub const HANDLE_SIGIL: char = '@';

/// Maximum number of tags a question may carry
pub const MAX_TAGS: usize = 5;

/// Maximum length of a single tag name
pub const MAX_TAG_LEN: usize = 50;

/// Validates that a value is non-empty and strictly alphanumeric
pub fn validate_alphanumeric(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new("required"));
    }
    if !value.chars().all(char::is_alphanumeric) {
        return Err(ValidationError::new("not_alphanumeric"));
    }
    Ok(())
}

/// Validates a handle: must not carry the display sigil, and is alphanumeric
pub fn validate_handle(handle: &str) -> Result<(), ValidationError> {
    if handle.starts_with(HANDLE_SIGIL) {
        let mut err = ValidationError::new("reserved_sigil");
        err.message = Some("handle must not start with '@'".into());
        return Err(err);
    }
    validate_alphanumeric(handle)
}

/// Validates that text has at least one non-whitespace character
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Validates a tag list: bounded size and no blank tags
pub fn validate_tags(tags: &Vec<String>) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(ValidationError::new("too_many_tags"));
    }
    if tags.iter().any(|tag| tag.trim().is_empty()) {
        return Err(ValidationError::new("blank_tag"));
    }
    if tags.iter().any(|tag| tag.trim().chars().count() > MAX_TAG_LEN) {
        return Err(ValidationError::new("tag_too_long"));
    }
    Ok(())
}

/// Normalize tags: trimmed, lower-cased, de-duplicated, in first-seen order
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

/// Render a stored handle the way it is shown publicly
pub fn display_handle(handle: &str) -> String {
    format!("{}{}", HANDLE_SIGIL, handle)
}
