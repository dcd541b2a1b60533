//! Field rules that are not expressible as simple validator attributes.

use crate::error::CoreError;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Emails are unique case-insensitively; they are always stored lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check length and confirmation of a new password.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), CoreError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    if password != confirm {
        return Err(CoreError::Validation("Passwords do not match!".into()));
    }
    Ok(())
}

/// Reject blank values for required text fields.
pub fn require_non_blank(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn short_password_is_rejected() {
        let err = validate_new_password("short", "short").unwrap_err();
        assert!(err.to_string().contains("at least 8 characters"));
    }

    #[test]
    fn mismatched_confirmation_is_rejected() {
        let err = validate_new_password("long-enough-1", "long-enough-2").unwrap_err();
        assert!(err.to_string().contains("do not match"));
    }

    #[test]
    fn matching_password_passes() {
        assert!(validate_new_password("long-enough", "long-enough").is_ok());
    }

    #[test]
    fn blank_values_are_rejected() {
        assert!(require_non_blank("title", "   ").is_err());
        assert!(require_non_blank("title", "Launch party").is_ok());
    }
}
