//! UI primitives for the Diary CLI.
//!
//! - **Context**: environment detection (TTY, width, color, unicode)
//! - **Mode**: output mode resolution (json, plain, pretty)
//! - **Theme**: badges and color styles
//! - **Render**: tables, headers, receipts, hints
//! - **Progress**: spinner for key derivation and re-encryption passes
//! - **Format**: string helpers

mod context;
pub mod format;
mod mode;
pub mod progress;
pub mod render;
pub mod theme;

pub use context::UiContext;
pub use mode::OutputMode;
pub use theme::Badge;

pub use render::{badge, header, hint, kv, print, print_error, receipt, simple_table, Column};

pub use progress::Spinner;

pub use format::{format_datetime, short_id, single_line, truncate};
