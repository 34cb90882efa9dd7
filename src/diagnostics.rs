//! Messages printed by the command-line tool.

use std::fmt::Display;

/// Report a non-fatal finding on stderr.
pub fn warn(msg: impl Display) {
    eprintln!("WARN: {msg}");
}

/// Text of a fatal message, as printed before exiting.
pub fn error_message(msg: impl Display) -> String {
    format!("ERROR: {msg}")
}

/// Describe a library error with its category.
pub fn describe(err: &ymmsl::Error) -> String {
    format!("{}: {err}", err.category())
}
