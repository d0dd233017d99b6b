//! # Validation Utilities
//!
//! Input validation helpers. All length checks count characters, not bytes.

/// Validate that a string is not empty.
pub fn validate_not_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} is required", field_name))
    } else {
        Ok(())
    }
}

/// Validate email format: one `@`, a non-empty local part, and a dotted domain
/// with no whitespace anywhere.
pub fn validate_email(email: &str) -> Result<(), String> {
    let invalid = || Err("Valid email is required".to_string());

    if email.chars().any(char::is_whitespace) {
        return invalid();
    }

    let Some((local, domain)) = email.split_once('@') else {
        return invalid();
    };

    if local.is_empty() || domain.contains('@') {
        return invalid();
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() && !host.ends_with('.') => Ok(()),
        _ => invalid(),
    }
}

/// Trim and lowercase an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate minimum length.
pub fn validate_min_length(value: &str, min: usize, field_name: &str) -> Result<(), String> {
    if value.chars().count() < min {
        Err(format!("{} must be at least {} characters", field_name, min))
    } else {
        Ok(())
    }
}

/// Validate that a length falls within `min..=max`.
pub fn validate_length(value: &str, min: usize, max: usize, field_name: &str) -> Result<(), String> {
    let len = value.chars().count();
    if len < min || len > max {
        Err(format!("{} must be between {} and {} characters", field_name, min, max))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("user+tag@mail.example.org").is_ok());

        assert!(validate_email("invalid-email").is_err());
        assert!(validate_email("@x.com").is_err());
        assert!(validate_email("a@x").is_err());
        assert!(validate_email("a@.com").is_err());
        assert!(validate_email("a@x.").is_err());
        assert!(validate_email("a b@x.com").is_err());
        assert!(validate_email("a@b@x.com").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn test_validate_length_counts_chars() {
        assert!(validate_length("héllo", 1, 5, "Title").is_ok());
        assert!(validate_length("", 1, 5, "Title").is_err());
        assert_eq!(
            validate_length("toolong", 1, 5, "Title"),
            Err("Title must be between 1 and 5 characters".to_string())
        );
    }

    #[test]
    fn test_validate_min_length() {
        assert!(validate_min_length("secret1", 6, "Password").is_ok());
        assert!(validate_min_length("short", 6, "Password").is_err());
    }

    #[test]
    fn test_validate_not_empty() {
        assert!(validate_not_empty("   ", "Password").is_err());
        assert!(validate_not_empty("x", "Password").is_ok());
    }
}
