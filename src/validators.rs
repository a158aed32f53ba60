/// Input validators for principals and contacts
///
/// Length limits bound work on hostile input; format checks keep obviously
/// broken emails and phone numbers out of the database.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_LOCAL_PART_LENGTH: usize = 64;
const MAX_NAME_LENGTH: usize = 256;
const MAX_NOTES_LENGTH: usize = 2048;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).expect("email regex is valid");

    // Optional leading +, then 7-15 digits with common separators
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9][0-9 ()-]{5,20}[0-9]$")
        .expect("phone regex is valid");
}

/// Validates an email address and returns it trimmed
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email", MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    if let Some(at_pos) = trimmed.find('@') {
        if at_pos > MAX_LOCAL_PART_LENGTH {
            return Err(ValidationError::SuspiciousContent("email"));
        }
    }

    Ok(trimmed.to_string())
}

/// Validates a person's first or last name
pub fn is_valid_name(field: &'static str, name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }

    if trimmed.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong(field, MAX_NAME_LENGTH));
    }

    if has_suspicious_name_patterns(trimmed) {
        return Err(ValidationError::SuspiciousContent(field));
    }

    Ok(trimmed.to_string())
}

/// Validates a phone number, keeping the caller's formatting
pub fn is_valid_phone(phone: &str) -> Result<String, ValidationError> {
    let trimmed = phone.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("phone_number"));
    }

    let digits = trimmed.chars().filter(char::is_ascii_digit).count();
    if !PHONE_REGEX.is_match(trimmed) || !(7..=15).contains(&digits) {
        return Err(ValidationError::InvalidFormat("phone_number".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates free-form notes attached to a contact
pub fn is_valid_notes(notes: &str) -> Result<String, ValidationError> {
    if notes.len() > MAX_NOTES_LENGTH {
        return Err(ValidationError::TooLong("additional_data", MAX_NOTES_LENGTH));
    }

    if notes.contains('\0') {
        return Err(ValidationError::SuspiciousContent("additional_data"));
    }

    Ok(notes.trim().to_string())
}

fn has_suspicious_name_patterns(name: &str) -> bool {
    if name.chars().any(|c| c.is_control()) {
        return true;
    }

    let special_char_count = name
        .chars()
        .filter(|c| {
            !c.is_alphanumeric() && !c.is_whitespace() && !matches!(c, '-' | '.' | '_' | '\'')
        })
        .count();

    special_char_count > 5
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
        assert_eq!(
            is_valid_email(&long_local),
            Err(ValidationError::SuspiciousContent("email"))
        );
    }

    #[test]
    fn test_valid_name() {
        assert!(is_valid_name("first_name", "John").is_ok());
        assert!(is_valid_name("last_name", "Jean-Pierre").is_ok());
        assert!(is_valid_name("last_name", "O'Brien").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        assert!(is_valid_name("first_name", "").is_err());
        assert!(is_valid_name("first_name", &"a".repeat(257)).is_err());
        assert!(is_valid_name("first_name", "Name\0with\0null").is_err());
        assert!(is_valid_name("first_name", "!!!!!!@@@@").is_err());
    }

    #[test]
    fn test_phone_numbers() {
        assert!(is_valid_phone("+1 (555) 123-4567").is_ok());
        assert!(is_valid_phone("0441234567").is_ok());
        assert!(is_valid_phone("12345").is_err());
        assert!(is_valid_phone("call me").is_err());
        assert!(is_valid_phone("").is_err());
    }

    #[test]
    fn test_notes() {
        assert_eq!(is_valid_notes(" met at conference ").unwrap(), "met at conference");
        assert!(is_valid_notes(&"x".repeat(2049)).is_err());
    }
}
