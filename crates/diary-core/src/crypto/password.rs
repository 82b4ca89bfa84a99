//! Password strength rules.
//!
//! Applied when a password is created or changed. Checking a candidate
//! against the verification token never applies these rules.

use std::fmt;

use crate::error::{DiaryError, Result};

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A single failed strength rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordIssue {
    TooShort,
    MissingUppercase,
    MissingLowercase,
    MissingDigit,
}

impl fmt::Display for PasswordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordIssue::TooShort => {
                write!(f, "at least {} characters", MIN_PASSWORD_LENGTH)
            }
            PasswordIssue::MissingUppercase => write!(f, "an uppercase letter"),
            PasswordIssue::MissingLowercase => write!(f, "a lowercase letter"),
            PasswordIssue::MissingDigit => write!(f, "a digit"),
        }
    }
}

/// List every rule `password` fails, in a stable order.
pub fn password_issues(password: &str) -> Vec<PasswordIssue> {
    let mut issues = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        issues.push(PasswordIssue::TooShort);
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        issues.push(PasswordIssue::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        issues.push(PasswordIssue::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        issues.push(PasswordIssue::MissingDigit);
    }
    issues
}

/// Validate a new password.
///
/// # Errors
///
/// Returns `Validation` naming all missing requirements at once.
///
/// # Examples
///
/// ```
/// use diary_core::crypto::validate_password;
///
/// assert!(validate_password("Abcd1234").is_ok());
/// assert!(validate_password("abcd").is_err());
/// ```
pub fn validate_password(password: &str) -> Result<()> {
    let issues = password_issues(password);
    if issues.is_empty() {
        return Ok(());
    }
    let missing = issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Err(DiaryError::Validation(format!(
        "Password must contain {}",
        missing
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_password() {
        assert!(validate_password("Abcd1234").is_ok());
        assert!(password_issues("Sommer2024!").is_empty());
    }

    #[test]
    fn test_collects_all_issues() {
        assert_eq!(
            password_issues("abc"),
            vec![
                PasswordIssue::TooShort,
                PasswordIssue::MissingUppercase,
                PasswordIssue::MissingDigit
            ]
        );
    }

    #[test]
    fn test_length_counts_characters() {
        // Eight characters, more than eight bytes.
        assert!(!password_issues("\u{00C4}\u{00E4}\u{00F6}\u{00FC}abc1").contains(&PasswordIssue::TooShort));
    }

    #[test]
    fn test_error_message_lists_requirements() {
        let err = validate_password("ABCDEFGH").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("a lowercase letter"));
        assert!(message.contains("a digit"));
    }
}
