//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Resource not found (config, diary, entry, template).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Authentication failed (wrong password, too many attempts, biometric failure).
    pub const AUTH_FAILED: i32 = 5;

    /// Encrypted content needed but the diary is locked or encryption is unavailable.
    pub const LOCKED: i32 = 6;
}

/// Maximum interactive password attempts before giving up.
pub const MAX_PASSWORD_ATTEMPTS: u32 = 3;

/// Name of the template seeded by `diary init`.
pub const DEFAULT_TEMPLATE_NAME: &str = "Journal";
