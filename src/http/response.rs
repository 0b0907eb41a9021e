//! API response value object
//!
//! `ApiResponse` carries the status code, headers and body a controller (or a
//! fault) hands back to the dispatcher. The transport layer turns it into a
//! hyper response; nothing in here knows about sockets.

use std::borrow::Cow;

use super::status::{status_line, status_meaning};

/// Content type synthesized when no explicit `Content-Type` header is set
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Ordered header map with unique, ASCII-case-insensitive keys
///
/// Writing an existing key replaces its value in place (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Look up a header value by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set a header, overwriting any existing value for the same name
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(entry) => *entry = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    /// Merge `other` into `self`; values from `other` win on collision
    pub fn merge(&mut self, other: &Self) {
        for (name, value) in other.iter() {
            self.set(name, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.set(name, value);
        }
        headers
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Response returned by controllers, faults and the dispatcher
///
/// ```
/// use restapi::http::ApiResponse;
/// let resp = ApiResponse::new(201)
///     .with_header("Location", "/widgets/7")
///     .with_body("/widgets/7");
/// assert_eq!(resp.status_header(), "HTTP/1.1 201 Created");
/// assert_eq!(resp.headers().get("Content-Type"), Some("text/plain"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    status_code: u16,
    headers: Headers,
    content_type: String,
    body: Option<String>,
}

impl Default for ApiResponse {
    fn default() -> Self {
        Self::new(200)
    }
}

impl ApiResponse {
    /// Create a response with the given status, no headers and no body
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: Headers::new(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            body: None,
        }
    }

    /// Shorthand for a status code plus body
    pub fn with_status_body(status_code: u16, body: impl Into<String>) -> Self {
        Self::new(status_code).with_body(body)
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub const fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn set_status_code(&mut self, status_code: u16) {
        self.status_code = status_code;
    }

    /// Headers to send, with `Content-Type` synthesized from
    /// [`content_type`](Self::content_type) when none was set explicitly
    pub fn headers(&self) -> Headers {
        let mut headers = self.headers.clone();
        if !headers.contains("Content-Type") {
            headers.set("Content-Type", self.content_type.clone());
        }
        headers
    }

    /// Headers exactly as set, without the synthesized `Content-Type`
    pub const fn explicit_headers(&self) -> &Headers {
        &self.headers
    }

    /// Replace the whole header map
    pub fn set_headers(&mut self, headers: Headers) {
        self.headers = headers;
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = content_type.into();
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = Some(body.into());
    }

    /// Body to write on the wire; `"<code> <reason>"` when no body was set
    pub fn rendered_body(&self) -> Cow<'_, str> {
        match &self.body {
            Some(body) => Cow::Borrowed(body.as_str()),
            None => Cow::Owned(format!("{} {}", self.status_code, self.status_meaning())),
        }
    }

    /// Status line, e.g. `HTTP/1.1 200 OK`
    pub fn status_header(&self) -> String {
        status_line(self.status_code)
    }

    pub const fn status_meaning(&self) -> &'static str {
        status_meaning(self.status_code)
    }
}
