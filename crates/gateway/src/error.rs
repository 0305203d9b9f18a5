//! Gateway error type.

use thiserror::Error;

/// A failed platform API call: the HTTP status and response body.
///
/// The platform reports all failures this way; callers branch on status
/// where a specific condition matters (404 on delete is success, 409 on
/// alias creation is a conflict) and propagate the rest.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Platform returned {status}: {body}")]
pub struct GatewayError {
    /// HTTP status code of the failed call.
    pub status: u16,
    /// Response body, usually a short JSON error message.
    pub body: String,
}

impl GatewayError {
    /// Creates a gateway error from a status and body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A 400 validation rejection.
    pub fn bad_request(body: impl Into<String>) -> Self {
        Self::new(400, body)
    }

    /// A 404 for a missing resource or alias.
    pub fn not_found(body: impl Into<String>) -> Self {
        Self::new(404, body)
    }

    /// A 409 for a conflicting alias id.
    pub fn conflict(body: impl Into<String>) -> Self {
        Self::new(409, body)
    }

    /// A 500 platform-side failure.
    pub fn server_error(body: impl Into<String>) -> Self {
        Self::new(500, body)
    }

    /// Returns true if the platform reported the target missing.
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

/// Convenience type alias for gateway results.
pub type Result<T> = std::result::Result<T, GatewayError>;
