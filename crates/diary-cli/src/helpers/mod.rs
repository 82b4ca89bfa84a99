//! Input and parsing helper functions for the CLI.
//!
//! - Password and field prompting (`input`)
//! - Datetime, duration, value and block spec parsing (`parsing`)

mod input;
mod parsing;

pub use input::{confirm, env_secret, prompt_block_values, prompt_new_password, prompt_password};
pub use parsing::{parse_block_spec, parse_datetime, parse_duration, parse_value_pair};
