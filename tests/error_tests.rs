use std::error::Error;
use std::io;
use std::time::Duration;

use gesture_socket_rs::{ConnectError, ConnectionState, LinkError};

// Test ConnectError display implementation
#[test]
fn test_connect_error_display() {
    let err = ConnectError::Timeout(Duration::from_millis(2000));
    assert_eq!(format!("{}", err), "Timeout while connecting (after 2s)");

    let err = ConnectError::Refused("127.0.0.1:12345".to_string());
    assert_eq!(format!("{}", err), "Connection refused by 127.0.0.1:12345");

    let err = ConnectError::Network("network unreachable".to_string());
    assert_eq!(format!("{}", err), "Network error: network unreachable");

    let err = ConnectError::InvalidAddress("nowhere:0".to_string());
    assert_eq!(format!("{}", err), "Invalid address: nowhere:0");
}

// Test LinkError display implementation
#[test]
fn test_link_error_display() {
    let err = LinkError::GracefulClose;
    assert_eq!(format!("{}", err), "Connection closed by peer");

    let io_err = io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer");
    let err = LinkError::ReadFailure(io_err);
    assert_eq!(format!("{}", err), "Read failed: reset by peer");
}

// Test both error types implement Error
#[test]
fn test_error_traits() {
    fn takes_error(_: &dyn Error) {}
    takes_error(&ConnectError::Refused("x".to_string()));
    takes_error(&LinkError::GracefulClose);
}

// Test conversions to LinkError
#[test]
fn test_link_error_conversions() {
    let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "broken");
    let err: LinkError = io_err.into();
    match err {
        LinkError::ReadFailure(_) => {} // Success
        _ => panic!("Expected ReadFailure variant"),
    }
}

#[test]
fn test_is_graceful() {
    assert!(LinkError::GracefulClose.is_graceful());
    assert!(!LinkError::ReadFailure(io::Error::new(io::ErrorKind::Other, "x")).is_graceful());
}

// Connect errors end up verbatim in the status line
#[test]
fn test_error_state_carries_message() {
    let err = ConnectError::Timeout(Duration::from_millis(2000));
    let state = ConnectionState::Error(err.to_string());
    assert_eq!(
        state.to_string(),
        "Error: Timeout while connecting (after 2s)"
    );
    assert!(state.awaits_retry());
    assert!(ConnectionState::Reconnecting.awaits_retry());
    assert!(!ConnectionState::Connected.awaits_retry());
}
