//! Request-level faults
//!
//! Everything below the dispatcher returns `Result<_, Fault>`. The dispatcher
//! is the only place that turns a fault into a response.

use thiserror::Error;

use crate::http::ApiResponse;

/// Failure to resolve the request verb
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MethodError {
    #[error("Didn't get any valid HTTP method")]
    Missing,
    #[error("HTTP method must be GET, PUT, DELETE, or POST, not {0}")]
    Unsupported(String),
}

/// A fault raised while handling a request
#[derive(Debug, Error)]
pub enum Fault {
    /// Fault whose payload is a complete response, surfaced verbatim
    #[error("{}", .0.rendered_body())]
    Http(ApiResponse),

    /// The request parameter was missing or empty
    #[error("Missing request parameter")]
    MissingRequest,

    #[error(transparent)]
    Method(#[from] MethodError),

    /// Declared JSON body failed to decode
    #[error("Invalid JSON body: {0}")]
    Body(#[from] serde_json::Error),

    /// Anything else; reported as a 500 with this message
    #[error("{0}")]
    Internal(String),
}

impl Fault {
    /// Short-circuit with a 400 Bad Request carrying `message` as body
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Http(ApiResponse::with_status_body(400, message))
    }

    /// Short-circuit with a 501 Not Implemented carrying `message` as body
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::Http(ApiResponse::with_status_body(501, message))
    }

    /// Generic fault reported as a 500
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// The embedded response, if this fault carries one
    pub const fn response(&self) -> Option<&ApiResponse> {
        match self {
            Self::Http(response) => Some(response),
            _ => None,
        }
    }

    /// Status code this fault is reported with
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Http(response) => response.status_code(),
            Self::MissingRequest => 404,
            Self::Method(_) | Self::Body(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Convert into the response written back to the client
    pub fn into_response(self) -> ApiResponse {
        match self {
            Self::Http(response) => response,
            other => ApiResponse::with_status_body(other.status_code(), other.to_string()),
        }
    }
}

impl From<ApiResponse> for Fault {
    fn from(response: ApiResponse) -> Self {
        Self::Http(response)
    }
}

// Non-response payloads never become `Fault::Http`
impl From<String> for Fault {
    fn from(message: String) -> Self {
        Self::Internal(message)
    }
}

impl From<&str> for Fault {
    fn from(message: &str) -> Self {
        Self::Internal(message.to_string())
    }
}

impl From<std::io::Error> for Fault {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_carries_response() {
        let fault = Fault::bad_request("bad wolf");
        let resp = fault.response().expect("bad request carries a response");
        assert_eq!(resp.status_code(), 400);
        assert_eq!(resp.body(), Some("bad wolf"));
        assert_eq!(fault.to_string(), "bad wolf");
    }

    #[test]
    fn test_not_implemented_carries_response() {
        let fault = Fault::not_implemented("bad wolf");
        let resp = fault.into_response();
        assert_eq!(resp.status_code(), 501);
        assert_eq!(resp.body(), Some("bad wolf"));
    }

    #[test]
    fn test_non_response_payload_is_generic() {
        let fault = Fault::from("plain failure");
        assert!(fault.response().is_none());
        assert!(matches!(fault, Fault::Internal(_)));

        let resp = Fault::from(String::from("boom")).into_response();
        assert_eq!(resp.status_code(), 500);
        assert_eq!(resp.body(), Some("boom"));
    }

    #[test]
    fn test_response_payload_is_http() {
        let fault = Fault::from(ApiResponse::with_status_body(409, "taken"));
        assert_eq!(fault.status_code(), 409);
        assert_eq!(fault.into_response().body(), Some("taken"));
    }

    #[test]
    fn test_input_faults_are_client_errors() {
        assert_eq!(Fault::MissingRequest.status_code(), 404);
        assert_eq!(Fault::from(MethodError::Missing).status_code(), 400);
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(Fault::from(json_err).status_code(), 400);
    }

    #[test]
    fn test_method_error_messages() {
        assert_eq!(
            MethodError::Missing.to_string(),
            "Didn't get any valid HTTP method"
        );
        assert_eq!(
            MethodError::Unsupported("PATCH".to_string()).to_string(),
            "HTTP method must be GET, PUT, DELETE, or POST, not PATCH"
        );
    }
}
