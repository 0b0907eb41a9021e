//! Per-request controller state
//!
//! An `Exchange` is built once per call from the raw request line: it owns the
//! parsed resource, arguments, verb and body, plus the response headers
//! accumulated while the request is handled.

use serde_json::Value;

use super::Reply;
use crate::config::Config;
use crate::error::Fault;
use crate::http::{ApiResponse, Headers};
use crate::request::{
    extract_body, extract_method, parse_request_path, Method, Payload, RawBody, RequestContext,
    JSON_CONTENT_TYPE,
};

/// Header carrying a tunneled verb on POST requests
pub const DEFAULT_METHOD_OVERRIDE_HEADER: &str = "X-HTTP-Method";

/// Lifecycle of an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Resource, arguments, verb and body are set
    Parsed,
    Dispatching,
    Completed,
    /// Verb not supported by the controller (405)
    Rejected,
    Faulted,
}

impl Phase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Dispatching => "dispatching",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Faulted => "faulted",
        }
    }
}

/// Settings shared by every exchange a dispatcher builds
#[derive(Debug, Clone)]
pub struct ExchangeSettings {
    pub method_override_header: String,
    /// Headers applied at construction; controllers may overwrite them
    pub default_headers: Headers,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            method_override_header: DEFAULT_METHOD_OVERRIDE_HEADER.to_string(),
            default_headers: Headers::from([
                ("Access-Control-Allow-Origin", "*"),
                ("Access-Control-Allow-Methods", "*"),
                ("Content-Type", JSON_CONTENT_TYPE),
            ]),
        }
    }
}

impl From<&Config> for ExchangeSettings {
    fn from(config: &Config) -> Self {
        Self {
            method_override_header: config.api.method_override_header.clone(),
            default_headers: Headers::from([
                (
                    "Access-Control-Allow-Origin",
                    config.http.cors_allow_origin.as_str(),
                ),
                (
                    "Access-Control-Allow-Methods",
                    config.http.cors_allow_methods.as_str(),
                ),
                ("Content-Type", config.http.default_content_type.as_str()),
            ]),
        }
    }
}

/// Parsed request plus accumulated response headers
#[derive(Debug, Clone)]
pub struct Exchange {
    resource: String,
    args: Vec<String>,
    method: Method,
    body: Option<Payload>,
    // Only reachable through set_response_headers, which never clears
    response_headers: Headers,
    phase: Phase,
}

impl Exchange {
    /// Build an exchange from a transport request
    pub fn from_request(
        raw: &str,
        ctx: &RequestContext,
        settings: &ExchangeSettings,
    ) -> Result<Self, Fault> {
        Self::build(raw, None, None, None, ctx, settings)
    }

    /// Build an exchange without a transport, e.g. from another controller
    /// or a test
    pub fn direct(
        raw: &str,
        method: &str,
        body: Option<RawBody>,
        content_type: Option<&str>,
    ) -> Result<Self, Fault> {
        Self::build(
            raw,
            Some(method),
            body,
            content_type,
            &RequestContext::default(),
            &ExchangeSettings::default(),
        )
    }

    fn build(
        raw: &str,
        declared_method: Option<&str>,
        body: Option<RawBody>,
        content_type: Option<&str>,
        ctx: &RequestContext,
        settings: &ExchangeSettings,
    ) -> Result<Self, Fault> {
        if raw.is_empty() {
            return Err(Fault::MissingRequest);
        }

        let (resource, args) = parse_request_path(raw);
        let method = extract_method(
            declared_method,
            ctx.method.as_deref(),
            ctx.header(&settings.method_override_header),
        )?;
        let body = extract_body(method, body, content_type, ctx)?;

        let mut exchange = Self {
            resource,
            args,
            method,
            body,
            response_headers: Headers::new(),
            phase: Phase::Parsed,
        };
        exchange.set_response_headers(settings.default_headers.iter());
        Ok(exchange)
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub const fn method(&self) -> Method {
        self.method
    }

    pub const fn body(&self) -> Option<&Payload> {
        self.body.as_ref()
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Add or overwrite response headers; existing headers are never dropped
    pub fn set_response_headers<I, K, V>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.response_headers.set(name, value);
        }
    }

    pub const fn response_headers(&self) -> &Headers {
        &self.response_headers
    }

    /// Package a controller reply as the final response
    ///
    /// Responses keep their own headers over accumulated ones; other replies
    /// get status 200 and the accumulated headers.
    pub(crate) fn normalize(&mut self, reply: Reply) -> ApiResponse {
        match reply {
            Reply::Response(mut response) => {
                self.set_response_headers(response.headers().iter());
                response.set_headers(self.response_headers.clone());
                response
            }
            Reply::Json(value) => {
                self.set_response_headers([("Content-Type", JSON_CONTENT_TYPE)]);
                let mut response = ApiResponse::with_status_body(200, encode_json(&value));
                response.set_headers(self.response_headers.clone());
                response
            }
            // Deprecated: the string is the whole body, not a JSON string
            Reply::Literal(body) => self.normalize(Reply::Response(
                ApiResponse::with_status_body(200, body),
            )),
        }
    }
}

fn encode_json(value: &Value) -> String {
    // Display for Value is the compact JSON encoding and cannot fail
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_exchange_parses_everything() {
        let exchange = Exchange::direct(
            "widgets/7/parts/",
            "POST",
            Some(RawBody::from(r#"{"hi":"there"}"#)),
            Some("application/json"),
        )
        .unwrap();
        assert_eq!(exchange.resource(), "widgets");
        assert_eq!(exchange.args(), ["7", "parts"]);
        assert_eq!(exchange.arg(0), Some("7"));
        assert_eq!(exchange.arg(5), None);
        assert_eq!(exchange.method(), Method::Post);
        assert_eq!(exchange.body().and_then(|b| b.field("hi")), Some("there"));
        assert_eq!(exchange.phase(), Phase::Parsed);
    }

    #[test]
    fn test_default_headers_applied() {
        let exchange = Exchange::direct("widgets", "GET", None, None).unwrap();
        let headers = exchange.response_headers();
        assert_eq!(headers.get("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(headers.get("Access-Control-Allow-Methods"), Some("*"));
        assert_eq!(headers.get("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_empty_request_rejected() {
        let result = Exchange::direct("", "GET", None, None);
        assert!(matches!(result, Err(Fault::MissingRequest)));
    }

    #[test]
    fn test_invalid_method_rejected() {
        let result = Exchange::direct("widgets", "PATCH", None, None);
        assert!(matches!(result, Err(Fault::Method(_))));
    }

    #[test]
    fn test_override_header_from_context() {
        let mut ctx = RequestContext::new("widgets/3", "POST");
        ctx.headers.set("X-HTTP-Method", "DELETE");
        let exchange =
            Exchange::from_request("widgets/3", &ctx, &ExchangeSettings::default()).unwrap();
        assert_eq!(exchange.method(), Method::Delete);
        assert!(exchange.body().is_none());
    }

    #[test]
    fn test_set_response_headers_never_resets() {
        let mut exchange = Exchange::direct("widgets", "GET", None, None).unwrap();
        exchange.set_response_headers([("X-Trace", "abc")]);
        exchange.set_response_headers(Vec::<(String, String)>::new());
        exchange.set_response_headers([("Content-Type", "text/csv")]);
        let headers = exchange.response_headers();
        assert_eq!(headers.get("X-Trace"), Some("abc"));
        assert_eq!(headers.get("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(headers.get("Content-Type"), Some("text/csv"));
    }

    #[test]
    fn test_normalize_json_reply() {
        let mut exchange = Exchange::direct("widgets", "GET", None, None).unwrap();
        exchange.set_response_headers([("Content-Type", "text/csv")]);
        let resp = exchange.normalize(Reply::Json(serde_json::json!(["a", 1])));
        assert_eq!(resp.status_code(), 200);
        assert_eq!(resp.body(), Some(r#"["a",1]"#));
        assert_eq!(resp.headers().get("Content-Type"), Some("application/json"));
        assert_eq!(resp.headers().get("Access-Control-Allow-Origin"), Some("*"));
    }

    #[test]
    fn test_normalize_json_string_is_quoted() {
        let mut exchange = Exchange::direct("widgets", "GET", None, None).unwrap();
        let resp = exchange.normalize(Reply::Json(Value::from("I Got!")));
        assert_eq!(resp.body(), Some(r#""I Got!""#));
    }

    #[test]
    fn test_normalize_response_headers_win() {
        let mut exchange = Exchange::direct("widgets", "POST", None, None).unwrap();
        exchange.set_response_headers([("X-Keep", "1"), ("X-Clash", "controller")]);
        let reply = ApiResponse::with_status_body(201, "/widgets/9")
            .with_header("Location", "/widgets/9")
            .with_header("X-Clash", "response");
        let resp = exchange.normalize(Reply::Response(reply));
        let headers = resp.headers();
        assert_eq!(resp.status_code(), 201);
        assert_eq!(headers.get("X-Keep"), Some("1"));
        assert_eq!(headers.get("X-Clash"), Some("response"));
        assert_eq!(headers.get("Location"), Some("/widgets/9"));
        // The response's own content type (synthesized text/plain) wins
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn test_normalize_literal_is_not_encoded() {
        let mut exchange = Exchange::direct("widgets", "GET", None, None).unwrap();
        let resp = exchange.normalize(Reply::Literal("plain words".to_string()));
        assert_eq!(resp.status_code(), 200);
        assert_eq!(resp.body(), Some("plain words"));
        assert_eq!(resp.headers().get("Access-Control-Allow-Origin"), Some("*"));
    }
}
