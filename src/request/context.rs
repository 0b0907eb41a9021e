//! Explicit per-request transport context
//!
//! Everything the core needs from the transport, passed in as plain fields.

use super::body::FormFields;
use crate::http::Headers;

/// Transport-level view of one inbound call
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Value of the request query parameter, e.g. `widgets/7`
    pub request: Option<String>,
    /// Verb reported by the transport
    pub method: Option<String>,
    /// Request headers
    pub headers: Headers,
    /// Content type reported by the transport, if it parsed one itself
    pub content_type: Option<String>,
    /// Form fields decoded by the transport (POST form submissions only)
    pub form: Option<FormFields>,
    /// Raw request body
    pub input: String,
}

impl RequestContext {
    /// Context for a bare request path with the given transport verb
    pub fn new(request: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            request: Some(request.into()),
            method: Some(method.into()),
            ..Self::default()
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Transport-reported content type, falling back to the request header
    pub fn content_type(&self) -> Option<&str> {
        self.content_type
            .as_deref()
            .filter(|ct| !ct.is_empty())
            .or_else(|| self.header("Content-Type"))
    }

    /// The request parameter, if present and non-empty
    pub fn request_line(&self) -> Option<&str> {
        self.request.as_deref().filter(|r| !r.is_empty())
    }
}
