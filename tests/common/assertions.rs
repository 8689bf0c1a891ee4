//! Custom assertion macros and utilities
//!
//! Provides enhanced assertion macros for better test output and
//! more descriptive error messages.

/// Assert that a string contains a substring
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        assert!(
            $haystack.contains($needle),
            "Expected '{}' to contain '{}'",
            $haystack,
            $needle
        );
    };
}

/// Assert an error response: status code and `error` message
#[macro_export]
macro_rules! assert_error_response {
    ($response:expr, $status:expr, $message:expr) => {{
        let (status, body) = $response;
        assert_eq!(status, $status, "unexpected status, body: {}", body);
        assert_eq!(body["error"], $message, "unexpected error body: {}", body);
        assert_eq!(body["status"], $status.as_u16());
    }};
}
