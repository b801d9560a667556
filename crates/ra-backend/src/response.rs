//! Structured backend call results.

use ra_model::is_success_status;
use thiserror::Error;

/// Status used when no HTTP response was obtained.
pub const NO_RESPONSE: u16 = 0;

/// Result of one backend call: the HTTP status plus either the decoded body
/// or a failure description.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    /// HTTP status, or [`NO_RESPONSE`].
    pub status: u16,
    /// Decoded body or failure description.
    pub body: Result<T, String>,
}

impl<T> ApiResponse<T> {
    /// Successful response.
    #[must_use]
    pub const fn ok(status: u16, value: T) -> Self {
        Self {
            status,
            body: Ok(value),
        }
    }

    /// Failed response carrying the backend's status.
    #[must_use]
    pub fn error(status: u16, description: impl Into<String>) -> Self {
        Self {
            status,
            body: Err(description.into()),
        }
    }

    /// Failure without an HTTP response (connection refused, timeout, IO).
    #[must_use]
    pub fn transport(description: impl Into<String>) -> Self {
        Self::error(NO_RESPONSE, description)
    }

    /// Returns whether the call succeeded with a success status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.body.is_ok() && is_success_status(self.status)
    }

    /// Returns the decoded body on success.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        self.body.as_ref().ok()
    }

    /// Returns the failure description.
    #[must_use]
    pub fn error_description(&self) -> Option<&str> {
        self.body.as_ref().err().map(String::as_str)
    }

    /// Maps the decoded body.
    pub fn map<U, F>(self, f: F) -> ApiResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        ApiResponse {
            status: self.status,
            body: self.body.map(f),
        }
    }

    /// Converts into a `Result`, treating any non-success status as failure.
    pub fn into_result(self) -> Result<(u16, T), ApiFailure> {
        let status = self.status;
        match self.body {
            Ok(value) if is_success_status(status) => Ok((status, value)),
            Ok(_) => Err(ApiFailure::new(status, format!("unexpected HTTP status {status}"))),
            Err(description) => Err(ApiFailure::new(status, description)),
        }
    }

    /// Converts into a `Result`, discarding the status.
    pub fn into_value(self) -> Result<T, ApiFailure> {
        self.into_result().map(|(_, value)| value)
    }
}

/// A failed backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("backend call failed with status {status}: {description}")]
pub struct ApiFailure {
    /// HTTP status, or [`NO_RESPONSE`].
    pub status: u16,
    /// Failure description.
    pub description: String,
}

impl ApiFailure {
    /// Creates a failure.
    #[must_use]
    pub fn new(status: u16, description: impl Into<String>) -> Self {
        Self {
            status,
            description: description.into(),
        }
    }

    /// Returns whether no HTTP response was obtained.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        self.status == NO_RESPONSE
    }
}

impl<T> From<ApiFailure> for ApiResponse<T> {
    fn from(failure: ApiFailure) -> Self {
        Self::error(failure.status, failure.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_requires_status_and_body() {
        assert!(ApiResponse::ok(204, ()).is_success());
        assert!(!ApiResponse::ok(202, ()).is_success());
        assert!(!ApiResponse::<()>::error(200, "bad body").is_success());
        assert!(!ApiResponse::<()>::transport("refused").is_success());
    }

    #[test]
    fn into_result_classifies() {
        assert_eq!(ApiResponse::ok(201, "id").into_result(), Ok((201, "id")));

        let failure = ApiResponse::<()>::error(409, "Client exists").into_result().unwrap_err();
        assert_eq!(failure.status, 409);
        assert_eq!(failure.description, "Client exists");
        assert!(!failure.is_transport());

        let failure = ApiResponse::<()>::transport("timed out").into_result().unwrap_err();
        assert!(failure.is_transport());

        let failure = ApiResponse::ok(202, ()).into_result().unwrap_err();
        assert_eq!(failure.status, 202);
    }

    #[test]
    fn map_keeps_status() {
        let mapped = ApiResponse::ok(200, 2).map(|v| v * 2);
        assert_eq!(mapped, ApiResponse::ok(200, 4));
        assert_eq!(
            ApiResponse::<u8>::error(404, "gone").map(|v| v + 1).error_description(),
            Some("gone")
        );
    }
}
