/// Password Hashing and Verification
///
/// bcrypt-backed credential verifier plus the password strength policy
/// applied at signup.

use crate::error::{AppError, ValidationError};

const MIN_PASSWORD_LENGTH: usize = 8;
/// bcrypt ignores everything past this many bytes
const MAX_PASSWORD_BYTES: usize = 72;

/// Hashes and verifies passwords with a configurable bcrypt cost
#[derive(Debug, Clone, Copy)]
pub struct CredentialVerifier {
    cost: u32,
}

impl Default for CredentialVerifier {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl CredentialVerifier {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Salted bcrypt digest of `password`; a fresh salt is drawn on every call
    ///
    /// # Errors
    /// Returns error if the password exceeds 72 bytes or the cost is outside
    /// bcrypt's accepted range
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(ValidationError::TooLong("password", MAX_PASSWORD_BYTES).into());
        }
        bcrypt::hash(password, self.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Whether `password` matches `hash`. Malformed hashes and passwords
    /// longer than 72 bytes never match.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        if password.len() > MAX_PASSWORD_BYTES {
            return false;
        }
        match bcrypt::verify(password, hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::debug!(error = %e, "Stored password hash could not be parsed");
                false
            }
        }
    }
}

/// Validate password strength requirements
///
/// Requirements:
/// - 8 characters to 72 bytes
/// - At least one digit, one lowercase and one uppercase letter
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }

    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_BYTES));
    }

    let has_digit = password.chars().any(|c| c.is_numeric());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());

    if !has_digit || !has_lowercase || !has_uppercase {
        return Err(ValidationError::InvalidFormat(
            "password must contain at least one digit, one lowercase letter, and one uppercase letter"
                .to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum bcrypt cost keeps the suite fast
    fn verifier() -> CredentialVerifier {
        CredentialVerifier::new(4)
    }

    #[test]
    fn test_hash_password() {
        let password = "ValidPassword123";
        let hash = verifier().hash(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn test_verify_password() {
        let hash = verifier().hash("ValidPassword123").unwrap();
        assert!(verifier().verify("ValidPassword123", &hash));
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = verifier().hash("ValidPassword123").unwrap();
        assert!(!verifier().verify("WrongPassword123", &hash));
    }

    #[test]
    fn test_fresh_salt_per_hash() {
        let first = verifier().hash("ValidPassword123").unwrap();
        let second = verifier().hash("ValidPassword123").unwrap();

        assert_ne!(first, second);
        assert!(verifier().verify("ValidPassword123", &first));
        assert!(verifier().verify("ValidPassword123", &second));
    }

    #[test]
    fn test_malformed_hash_does_not_match() {
        assert!(!verifier().verify("ValidPassword123", "not-a-bcrypt-hash"));
        assert!(!verifier().verify("ValidPassword123", ""));
    }

    #[test]
    fn test_empty_password_does_not_match() {
        let hash = verifier().hash("ValidPassword123").unwrap();
        assert!(!verifier().verify("", &hash));
    }

    #[test]
    fn test_invalid_cost_is_an_error() {
        assert!(CredentialVerifier::new(1).hash("ValidPassword123").is_err());
    }

    #[test]
    fn test_strength_rules() {
        assert!(validate_password_strength("ValidPassword123").is_ok());
        assert_eq!(
            validate_password_strength(""),
            Err(ValidationError::EmptyField("password"))
        );
        assert!(validate_password_strength("Short1").is_err());
        assert!(validate_password_strength("NoDigitsPassword").is_err());
        assert!(validate_password_strength("NOLOWERCASE1").is_err());
        assert!(validate_password_strength("nouppercase1").is_err());

        let at_limit = "Aa1".to_string() + &"x".repeat(MAX_PASSWORD_BYTES - 3);
        assert!(validate_password_strength(&at_limit).is_ok());

        let long_password = "Aa1".to_string() + &"x".repeat(MAX_PASSWORD_BYTES - 2);
        assert_eq!(
            validate_password_strength(&long_password),
            Err(ValidationError::TooLong("password", MAX_PASSWORD_BYTES))
        );
    }

    #[test]
    fn test_passwords_sharing_72_byte_prefix_do_not_match() {
        let prefix = "Aa1".to_string() + &"x".repeat(69);
        let first = prefix.clone() + "SecretTail1";
        let second = prefix.clone() + "CompletelyDifferent";

        assert!(verifier().hash(&first).is_err());
        let hash = verifier().hash(&prefix).unwrap();
        assert!(verifier().verify(&prefix, &hash));
        assert!(!verifier().verify(&first, &hash));
        assert!(!verifier().verify(&second, &hash));
    }
}
