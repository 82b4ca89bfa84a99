//! CLI error types for structured error handling.
//!
//! Typed errors map to specific exit codes. Core errors that reach `main`
//! are classified into the same codes.

use std::fmt;

use diary_core::DiaryError;

/// CLI-specific errors with associated exit codes.
#[derive(Debug, Clone)]
pub enum CliError {
    /// Resource not found (config, diary, entry, template)
    NotFound { message: String, hint: String },

    /// Authentication failed (wrong password, too many attempts)
    AuthFailed {
        message: String,
        hint: Option<String>,
    },

    /// Invalid user input
    InvalidInput(String),

    /// Encrypted content needed without a valid session
    Locked { message: String, hint: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } | CliError::Locked { message, hint } => {
                write!(f, "{}\n{}", message, hint)
            }
            CliError::AuthFailed { message, hint } => {
                if let Some(h) = hint {
                    write!(f, "{}\n{}", message, h)
                } else {
                    write!(f, "{}", message)
                }
            }
            CliError::InvalidInput(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an AuthFailed error with message and optional hint.
    pub fn auth_failed(message: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: None,
        }
    }

    /// Create an AuthFailed error with message and hint.
    pub fn auth_failed_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    pub fn locked(message: impl Into<String>) -> Self {
        CliError::Locked {
            message: message.into(),
            hint: "Hint: Run `diary unlock` first.".to_string(),
        }
    }

    /// Map a core error onto a CLI error, `None` for general failures.
    pub fn from_diary(err: &DiaryError) -> Option<Self> {
        let mapped = match err {
            DiaryError::NotFound(message) => {
                CliError::not_found(message.clone(), "Hint: Check the id or name and try again.")
            }
            DiaryError::InvalidInput(message) | DiaryError::Validation(message) => {
                CliError::invalid_input(message.clone())
            }
            DiaryError::IncorrectPassword => CliError::auth_failed("Incorrect password."),
            DiaryError::PasswordNotSet => CliError::auth_failed_with_hint(
                "No password is set for this diary.",
                "Hint: Run `diary password set`.",
            ),
            DiaryError::PasswordAlreadySet => CliError::invalid_input(
                "A password is already set. Use `diary password change`.",
            ),
            DiaryError::FreshAuthRequired => {
                CliError::auth_failed("This change requires entering your password again.")
            }
            DiaryError::BiometricUnavailable => CliError::auth_failed_with_hint(
                "Biometric unlock is not available here.",
                "Hint: It needs an interactive terminal and an HTTPS origin with a real hostname.",
            ),
            DiaryError::BiometricNotRegistered => CliError::auth_failed_with_hint(
                "Biometric unlock is not enabled.",
                "Hint: Run `diary biometric enable`.",
            ),
            DiaryError::BiometricStaleCredential => CliError::auth_failed_with_hint(
                "Biometric unlock needs to be set up again.",
                "Hint: Unlock with your password, then run `diary biometric enable`.",
            ),
            DiaryError::Authenticator(message) => {
                CliError::auth_failed(format!("Authenticator failed: {}", message))
            }
            DiaryError::DecryptionFailed => CliError::auth_failed_with_hint(
                "Decryption failed.",
                "Hint: The entry may be corrupted or was written with another password.",
            ),
            DiaryError::Locked => CliError::locked("The diary is locked."),
            DiaryError::CryptoUnavailable(reason) => CliError::Locked {
                message: format!("Encryption is unavailable: {}.", reason),
                hint: "Hint: Set `[platform] origin` to an https:// or localhost origin."
                    .to_string(),
            },
            _ => return None,
        };
        Some(mapped)
    }

    /// Classify an error returned by a command handler.
    pub fn classify(err: &anyhow::Error) -> Option<Self> {
        if let Some(cli_err) = err.downcast_ref::<CliError>() {
            return Some(cli_err.clone());
        }
        err.downcast_ref::<DiaryError>().and_then(CliError::from_diary)
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        use super::constants::exit_codes;
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::AuthFailed { .. } => exit_codes::AUTH_FAILED,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
            CliError::Locked { .. } => exit_codes::LOCKED,
        }
    }

    /// Print error message to stderr and exit with appropriate code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        std::process::exit(self.exit_code())
    }
}
