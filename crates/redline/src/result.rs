//! Result and error types for Redline.
//!
//! Assertion mismatches are not errors: they travel as
//! [`AssertionOutcome`](crate::AssertionOutcome) values inside a test result.
//! Everything here is a collaborator failure (browser, page, fixture, I/O).

use thiserror::Error;

/// Result type for Redline operations
pub type RedlineResult<T> = Result<T, RedlineError>;

/// Errors that can occur in Redline
#[derive(Debug, Error)]
pub enum RedlineError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Browser feature not compiled in
    #[error("Browser driver unavailable: rebuild with the `browser` feature")]
    BrowserUnavailable,

    /// Page error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Test timeout of {ms}ms exceeded")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Input simulation error
    #[error("Input simulation failed: {message}")]
    InputError {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    ScreenshotError {
        /// Error message
        message: String,
    },

    /// Fixture file could not be parsed
    #[error("Failed to parse fixture {source_name}: {message}")]
    FixtureParse {
        /// File name or `<inline>`
        source_name: String,
        /// Parser message
        message: String,
    },

    /// Fixture parsed but is structurally invalid
    #[error("Invalid fixture {source_name}: {message}")]
    FixtureInvalid {
        /// File name or `<inline>`
        source_name: String,
        /// What is wrong
        message: String,
    },

    /// Bad `--grep` pattern
    #[error("Invalid filter pattern: {0}")]
    Filter(#[from] regex::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RedlineError {
    /// Whether this error is a timeout (reported as `timedOut`)
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_error_names_url() {
        let err = RedlineError::NavigationError {
            url: "https://example.invalid/".to_string(),
            message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("https://example.invalid/"));
        assert!(text.contains("ERR_NAME_NOT_RESOLVED"));
    }

    #[test]
    fn test_timeout_message() {
        let err = RedlineError::Timeout { ms: 30000 };
        assert_eq!(err.to_string(), "Test timeout of 30000ms exceeded");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: RedlineError = io_err.into();
        assert!(err.to_string().contains("I/O"));
        assert!(!err.is_timeout());
    }
}
