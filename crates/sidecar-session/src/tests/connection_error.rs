use crate::{ClientError, is_connection_error};

#[test]
fn given_transport_failures_when_classified_then_connection_errors() {
    // Given
    let messages = [
        "MCP client is not connected",
        "Connection lost",
        "ECONNREFUSED",
        "ETIMEDOUT",
        "Socket hang up",
        "Network error",
        "read ECONNRESET",
        "write EPIPE",
        "Connection reset by peer",
        "Broken pipe (os error 32)",
    ];

    // When / Then
    for message in messages {
        assert!(is_connection_error(Some(message)), "{message}");
    }
}

#[test]
fn given_logical_failures_when_classified_then_not_connection_errors() {
    // Given
    let messages = ["Invalid syntax", "Task execution failed", "Unknown tool: plan"];

    // When / Then
    for message in messages {
        assert!(!is_connection_error(Some(message)), "{message}");
    }
}

#[test]
fn given_no_error_when_classified_then_not_connection_error() {
    // Given
    let missing: Option<&str> = None;

    // When
    let classified = is_connection_error(missing);

    // Then
    assert!(!classified);
}

#[test]
fn given_client_errors_when_classified_then_message_decides() {
    // Given
    let not_connected = ClientError::not_connected();
    let coded = ClientError::with_code("Task execution failed", "-32603");

    // When / Then
    assert!(not_connected.is_connection_error());
    assert!(!coded.is_connection_error());
    assert_eq!(coded.code.as_deref(), Some("-32603"));
}
