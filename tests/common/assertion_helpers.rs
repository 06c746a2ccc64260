//! Assertion helpers for testing

use scm_bridge::{ErrorKind, ScmResult};

/// Assert that a result failed with the given error kind
#[macro_export]
macro_rules! assert_error_kind {
    ($result:expr, $kind:expr) => {
        match $result {
            Ok(_) => panic!("Expected {:?} error, got a value", $kind),
            Err(err) => assert_eq!(err.kind(), $kind, "unexpected error: {}", err),
        }
    };
}

/// Error kind of a failed result, panicking on success
pub fn error_kind<T>(result: ScmResult<T>) -> ErrorKind {
    match result {
        Ok(_) => panic!("Expected an error, got a value"),
        Err(err) => err.kind(),
    }
}
