use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordValidationError {
    #[error("Password must be at least {0} characters")]
    TooShort(usize),

    #[error("Password must be at most {0} characters")]
    TooLong(usize),

    #[error("Password must not contain the username")]
    ContainsUsername,

    #[error("Password must not be a single repeated character")]
    SingleCharacter,
}

/// Password policy applied at registration and by the CLI
///
/// The username may not appear anywhere in the password, ignoring case.
pub struct PasswordValidatorProvider {
    min_length: usize,
    max_length: usize,
}

impl PasswordValidatorProvider {
    pub fn new() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
        }
    }

    /// Validate in order, failing fast: length, username substring, repetition
    pub fn validate(&self, password: &str, username: Option<&str>) -> Result<(), PasswordValidationError> {
        let length = password.chars().count();
        if length < self.min_length {
            return Err(PasswordValidationError::TooShort(self.min_length));
        }
        if length > self.max_length {
            return Err(PasswordValidationError::TooLong(self.max_length));
        }

        if let Some(username) = username.filter(|name| !name.is_empty()) {
            if password.to_lowercase().contains(&username.to_lowercase()) {
                return Err(PasswordValidationError::ContainsUsername);
            }
        }

        let mut chars = password.chars();
        if let Some(first) = chars.next() {
            if chars.all(|c| c == first) {
                return Err(PasswordValidationError::SingleCharacter);
            }
        }

        Ok(())
    }
}

impl Default for PasswordValidatorProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_bounds() {
        let validator = PasswordValidatorProvider::new();

        assert_eq!(validator.validate("short", None), Err(PasswordValidationError::TooShort(8)));
        assert_eq!(validator.validate(&"ab".repeat(65), None), Err(PasswordValidationError::TooLong(128)));
        assert!(validator.validate("handloom-42", None).is_ok());
    }

    #[test]
    fn test_username_substring_is_case_insensitive() {
        let validator = PasswordValidatorProvider::new();

        assert_eq!(
            validator.validate("MyWeaverPass1", Some("weaver")),
            Err(PasswordValidationError::ContainsUsername)
        );
        assert!(validator.validate("MyWeaverPass1", Some("potter")).is_ok());
    }

    #[test]
    fn test_repeated_character_rejected() {
        assert_eq!(
            PasswordValidatorProvider::new().validate("aaaaaaaaaa", None),
            Err(PasswordValidationError::SingleCharacter)
        );
    }
}
