/// Input validators
///
/// Checks applied to request bodies before they reach hashing, storage or
/// an upstream service. Each returns the normalized value on success.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 3;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 72; // bcrypt ignores bytes past 72
const MAX_TEXT_LENGTH: usize = 200;
pub const MAX_DAYS: i32 = 30;
const MAX_FREE_TEXT_LENGTH: usize = 2000;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).expect("email regex is valid");
}

/// Validates an email address: length limits, format, one `@`, local part
/// no longer than 64 characters.
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }
    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH));
    }
    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }
    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }
    match trimmed.split_once('@') {
        Some((local, _)) if local.len() <= 64 => {}
        _ => return Err(ValidationError::InvalidFormat("email".to_string())),
    }

    Ok(trimmed.to_string())
}

/// Validates a new password. Not trimmed: whitespace is part of the secret.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort(
            "password".to_string(),
            MIN_PASSWORD_LENGTH,
        ));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        ));
    }
    if password.contains('\0') {
        return Err(ValidationError::InvalidFormat("password".to_string()));
    }
    Ok(())
}

/// Short single-line text such as a destination or mood
pub fn is_valid_text(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }
    if trimmed.chars().count() > MAX_TEXT_LENGTH {
        return Err(ValidationError::TooLong(field.to_string(), MAX_TEXT_LENGTH));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat(field.to_string()));
    }

    Ok(trimmed.to_string())
}

/// Longer user prose forwarded to the AI service
pub fn is_valid_free_text(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }
    if trimmed.chars().count() > MAX_FREE_TEXT_LENGTH {
        return Err(ValidationError::TooLong(field.to_string(), MAX_FREE_TEXT_LENGTH));
    }

    Ok(trimmed.to_string())
}

pub fn is_valid_days(days: i32) -> Result<i32, ValidationError> {
    if !(1..=MAX_DAYS).contains(&days) {
        return Err(ValidationError::OutOfRange("days".to_string()));
    }
    Ok(days)
}

pub fn is_valid_coordinates(lat: f64, lng: f64) -> Result<(f64, f64), ValidationError> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(ValidationError::OutOfRange("lat".to_string()));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(ValidationError::OutOfRange("lng".to_string()));
    }
    Ok((lat, lng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
        assert_eq!(is_valid_email("  a@b.com ").unwrap(), "a@b.com");
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
        assert!(is_valid_email("").is_err());
    }

    #[test]
    fn test_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());

        let long_local = format!("{}@example.com", "a".repeat(65));
        assert!(is_valid_email(&long_local).is_err());
    }

    #[test]
    fn test_password_rules() {
        assert!(is_valid_password("password").is_ok());
        assert!(is_valid_password("short").is_err());
        assert!(is_valid_password(&"a".repeat(72)).is_ok());
        assert!(is_valid_password(&"a".repeat(73)).is_err());
        assert!(is_valid_password("with\0null-byte").is_err());
    }

    #[test]
    fn test_text_rules() {
        assert_eq!(is_valid_text("destination", " Pune ").unwrap(), "Pune");
        assert!(is_valid_text("destination", "   ").is_err());
        assert!(is_valid_text("destination", &"x".repeat(201)).is_err());
        assert!(is_valid_text("destination", "Pu\nne").is_err());
    }

    #[test]
    fn test_free_text_allows_newlines() {
        assert!(is_valid_free_text("places_list", "Fort\nLake\nTemple").is_ok());
        assert!(is_valid_free_text("places_list", "").is_err());
    }

    #[test]
    fn test_days_range() {
        assert!(is_valid_days(1).is_ok());
        assert!(is_valid_days(MAX_DAYS).is_ok());
        assert!(is_valid_days(0).is_err());
        assert!(is_valid_days(MAX_DAYS + 1).is_err());
    }

    #[test]
    fn test_coordinates_range() {
        assert!(is_valid_coordinates(18.52, 73.85).is_ok());
        assert!(is_valid_coordinates(91.0, 0.0).is_err());
        assert!(is_valid_coordinates(0.0, -181.0).is_err());
        assert!(is_valid_coordinates(f64::NAN, 0.0).is_err());
    }
}
