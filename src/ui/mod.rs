//! UI module for consistent CLI output
//!
//! Styled output in interactive terminals with automatic fallback to
//! plain ASCII prefixes in CI/non-interactive environments, so logs
//! stay grep-able.

mod context;
mod output;

pub use context::UiContext;
pub use output::{intro, key_value, outro_success, step_info, step_ok, step_ok_detail, step_warn};
