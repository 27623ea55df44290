//! User-facing output utilities for clean, colored terminal messages
//!
//! These print straight to stderr without the timestamps and levels of the
//! logger, for messages meant for the person at the terminal.

use owo_colors::OwoColorize;

/// Display a warning message to the user in yellow with padding
///
/// # Example
/// ```ignore
/// output::warn("3 records were skipped as malformed.");
/// ```
pub fn warn(message: &str) {
    eprintln!("\n{}\n", message.yellow());
}

/// Display an error message to the user in red with padding
///
/// # Example
/// ```ignore
/// output::error("Index not found. Run 'dxs index <PATH>' to build it first.");
/// ```
pub fn error(message: &str) {
    eprintln!("\n{}\n", message.red());
}

/// Display an informational message to the user in default color with padding
pub fn info(message: &str) {
    eprintln!("\n{}\n", message);
}
