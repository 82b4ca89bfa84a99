//! Application-level utilities for the Diary CLI.
//!
//! - Path resolution for config and diary files
//! - The per-invocation context that opens storage and the vault
//! - Password prompting with retry logic

mod context;
mod resolver;
mod unlock;

pub use context::{AppContext, CliVault};
pub use resolver::{missing_diary_message, resolve_config_path};
pub use unlock::{
    ensure_unlocked, fresh_auth, new_password, unlock_with_password, verified_password,
};
