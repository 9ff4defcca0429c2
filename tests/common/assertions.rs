//! Custom assertion macros
//!
//! Provides assertion macros with more descriptive failure output.

/// Assert that a result is ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $message:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $message, e),
        }
    };
}

/// Assert that a backend result failed with the given `ErrorKind`
#[macro_export]
macro_rules! assert_err_kind {
    ($result:expr, $kind:expr) => {
        match $result {
            Ok(value) => panic!("Expected Err({:?}), got Ok: {:?}", $kind, value),
            Err(e) => assert_eq!(e.kind(), $kind, "unexpected error: {:?}", e),
        }
    };
}

/// Assert the sequence of event names a client received
#[macro_export]
macro_rules! assert_events {
    ($client:expr, [$($name:expr),* $(,)?]) => {
        let expected: Vec<&str> = vec![$($name),*];
        assert_eq!($client.event_names(), expected);
    };
}
