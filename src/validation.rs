use validator::ValidationError;

pub const NAME_MAX_CHARS: usize = 255;
pub const FEEDBACK_MAX_CHARS: usize = 2000;

/// Rejects text that is empty once surrounding whitespace is removed.
pub fn not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Names of catalog entities, measured after trimming like they are stored.
pub fn name_text(text: &str) -> Result<(), ValidationError> {
    trimmed_within(text, NAME_MAX_CHARS)
}

/// Feedback length is measured in characters after trimming.
pub fn feedback_text(text: &str) -> Result<(), ValidationError> {
    trimmed_within(text, FEEDBACK_MAX_CHARS)
}

fn trimmed_within(text: &str, max: usize) -> Result<(), ValidationError> {
    not_blank(text)?;
    if text.trim().chars().count() > max {
        return Err(ValidationError::new("too_long"));
    }
    Ok(())
}
