//! Heuristic split between transport failures and logical tool failures.

use std::fmt::Display;

/// Lowercase fragments that mark an error as a lost or unusable connection.
pub const CONNECTION_ERROR_SIGNATURES: &[&str] = &[
    "not connected",
    "connection lost",
    "connection closed",
    "connection reset",
    "connection refused",
    "connection timed out",
    "econnrefused",
    "etimedout",
    "econnreset",
    "epipe",
    "socket hang up",
    "network error",
    "broken pipe",
];

/// `true` when `error` looks like a connection failure.
///
/// Anything else (bad input, tool errors) is a logical failure and must be
/// surfaced to the caller without reconnecting. `None` is never a connection
/// error.
pub fn is_connection_error<E: Display + ?Sized>(error: Option<&E>) -> bool {
    let Some(error) = error else {
        return false;
    };

    let message = error.to_string().to_lowercase();
    CONNECTION_ERROR_SIGNATURES
        .iter()
        .any(|signature| message.contains(signature))
}
