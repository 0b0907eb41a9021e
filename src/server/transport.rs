//! HTTP transport for the dispatcher
//!
//! Turns a hyper request into a [`RequestContext`], routes it and writes the
//! resulting [`ApiResponse`] back as a hyper response.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, SERVER, USER_AGENT};
use hyper::{Method, Request, Response, StatusCode, Uri};

use super::ServerState;
use crate::http::{ApiResponse, Headers};
use crate::logger::{self, AccessLogEntry};
use crate::request::{resource_name, FormFields, RequestContext};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Entry point for every HTTP request
pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<ServerState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let http = &state.config.http;

    let api_response = match read_body(&parts.headers, body, http.max_body_size).await {
        Ok(body) => {
            let ctx = build_context(
                &parts.method,
                &parts.uri,
                &parts.headers,
                &body,
                &state.config.api.request_param,
            );
            let response = state.dispatcher.route(&ctx);
            if state.config.logging.access_log {
                let mut entry = access_entry(&parts.method, &parts.uri, &parts.headers, peer_addr);
                entry.resource = ctx.request_line().map(|raw| resource_name(raw).to_string());
                finish_access_log(entry, &response, started, &state.config.logging.access_log_format);
            }
            response
        }
        Err(response) => {
            if state.config.logging.access_log {
                let entry = access_entry(&parts.method, &parts.uri, &parts.headers, peer_addr);
                finish_access_log(entry, &response, started, &state.config.logging.access_log_format);
            }
            response
        }
    };

    Ok(into_hyper_response(&api_response, &http.server_name))
}

/// Collect the request body, refusing anything over `max_body_size`
async fn read_body(headers: &HeaderMap, body: Incoming, max_body_size: u64) -> Result<String, ApiResponse> {
    if let Some(size) = declared_length(headers) {
        if size > max_body_size {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            return Err(payload_too_large());
        }
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => decode_body(collected.to_bytes()),
        Err(e) => {
            if e.downcast_ref::<http_body_util::LengthLimitError>().is_some() {
                logger::log_warning(&format!("Request body exceeded {max_body_size} bytes"));
                Err(payload_too_large())
            } else {
                logger::log_error(&format!("Failed to read request body: {e}"));
                Err(ApiResponse::with_status_body(400, "Failed to read request body"))
            }
        }
    }
}

/// Bodies must be UTF-8; anything else is a 400 rather than a lossy copy
fn decode_body(bytes: Bytes) -> Result<String, ApiResponse> {
    String::from_utf8(bytes.to_vec()).map_err(|e| {
        logger::log_warning(&format!("Rejecting non UTF-8 request body: {e}"));
        ApiResponse::with_status_body(400, "Request body is not valid UTF-8")
    })
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(CONTENT_LENGTH)?.to_str().ok()?;
    match value.parse() {
        Ok(size) => Some(size),
        Err(_) => {
            logger::log_warning(&format!(
                "Invalid Content-Length value: '{value}', skipping size check"
            ));
            None
        }
    }
}

fn payload_too_large() -> ApiResponse {
    ApiResponse::with_status_body(413, "413 Request Entity Too Large")
}

/// Snapshot of one request as the dispatcher sees it
///
/// The request line comes from the `request_param` query parameter. Form
/// bodies are pre-parsed only for POST, as browsers send them.
pub fn build_context(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: &str,
    request_param: &str,
) -> RequestContext {
    let request = uri.query().and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == request_param)
            .map(|(_, value)| value.into_owned())
    });

    let headers: Headers = headers
        .iter()
        .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?)))
        .collect();
    let content_type = headers.get(CONTENT_TYPE.as_str()).map(ToString::to_string);

    let form = (*method == Method::POST
        && content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with(FORM_CONTENT_TYPE)))
    .then(|| {
        url::form_urlencoded::parse(body.as_bytes())
            .into_owned()
            .collect::<FormFields>()
    });

    RequestContext {
        request,
        method: Some(method.as_str().to_string()),
        headers,
        content_type,
        form,
        input: body.to_string(),
    }
}

/// Convert an `ApiResponse` into the hyper response written on the wire
pub fn into_hyper_response(response: &ApiResponse, server_name: &str) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(response.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = Response::builder().status(status);

    if let Some(headers) = builder.headers_mut() {
        for (name, value) in response.headers().iter() {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => logger::log_warning(&format!("Dropping invalid response header '{name}'")),
            }
        }
        if let Ok(value) = HeaderValue::from_str(server_name) {
            headers.insert(SERVER, value);
        }
    }

    let body = Bytes::from(response.rendered_body().into_owned());
    builder.body(Full::new(body)).unwrap_or_else(|e| {
        logger::log_error(&format!("Failed to build response: {e}"));
        let mut fallback = Response::new(Full::new(Bytes::from("500 Internal Server Error")));
        *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

fn access_entry(method: &Method, uri: &Uri, headers: &HeaderMap, peer_addr: SocketAddr) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(peer_addr.ip().to_string(), method.as_str(), uri.to_string());
    entry.user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    entry
}

fn finish_access_log(mut entry: AccessLogEntry, response: &ApiResponse, started: Instant, format: &str) {
    entry.status = response.status_code();
    entry.body_bytes = response.rendered_body().len();
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    logger::log_access(&entry, format);
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        pairs
            .iter()
            .map(|(k, v)| (HeaderName::from_static(k), HeaderValue::from_static(v)))
            .collect()
    }

    #[test]
    fn test_request_line_from_query() {
        let uri: Uri = "/api.php?foo=1&request=widgets%2F7&bar=2".parse().unwrap();
        let ctx = build_context(&Method::GET, &uri, &HeaderMap::new(), "", "request");
        assert_eq!(ctx.request.as_deref(), Some("widgets/7"));
        assert_eq!(ctx.method.as_deref(), Some("GET"));
        assert!(ctx.form.is_none());
    }

    #[test]
    fn test_custom_request_param() {
        let uri: Uri = "/?r=gadgets".parse().unwrap();
        let ctx = build_context(&Method::GET, &uri, &HeaderMap::new(), "", "r");
        assert_eq!(ctx.request_line(), Some("gadgets"));

        let ctx = build_context(&Method::GET, &uri, &HeaderMap::new(), "", "request");
        assert_eq!(ctx.request_line(), None);
    }

    #[test]
    fn test_post_form_is_preparsed() {
        let uri: Uri = "/?request=widgets".parse().unwrap();
        let h = headers(&[("content-type", "application/x-www-form-urlencoded")]);
        let ctx = build_context(&Method::POST, &uri, &h, "name=sprocket&size=2", "request");
        let form = ctx.form.unwrap();
        assert_eq!(form.get("name").map(String::as_str), Some("sprocket"));
        assert_eq!(form.get("size").map(String::as_str), Some("2"));
        assert_eq!(ctx.content_type.as_deref(), Some("application/x-www-form-urlencoded"));
    }

    #[test]
    fn test_put_form_is_raw_input() {
        let uri: Uri = "/?request=widgets".parse().unwrap();
        let h = headers(&[("content-type", "application/x-www-form-urlencoded")]);
        let ctx = build_context(&Method::PUT, &uri, &h, "name=sprocket", "request");
        assert!(ctx.form.is_none());
        assert_eq!(ctx.input, "name=sprocket");
    }

    #[test]
    fn test_headers_copied() {
        let uri: Uri = "/?request=widgets".parse().unwrap();
        let h = headers(&[("x-http-method", "DELETE")]);
        let ctx = build_context(&Method::POST, &uri, &h, "", "request");
        assert_eq!(ctx.header("X-HTTP-Method"), Some("DELETE"));
    }

    #[tokio::test]
    async fn test_into_hyper_response() {
        let api = ApiResponse::with_status_body(201, "created").with_header("Location", "/widgets/7");
        let resp = into_hyper_response(&api, "restapi/test");
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.headers()["location"], "/widgets/7");
        assert_eq!(resp.headers()["content-type"], "text/plain");
        assert_eq!(resp.headers()["server"], "restapi/test");
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"created");
    }

    #[tokio::test]
    async fn test_missing_body_renders_fallback() {
        let resp = into_hyper_response(&ApiResponse::new(404), "restapi/test");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"404 Not Found");
    }

    #[test]
    fn test_utf8_body_decoded() {
        let body = decode_body(Bytes::from_static("{\"name\":\"caf\u{e9}\"}".as_bytes())).unwrap();
        assert_eq!(body, "{\"name\":\"caf\u{e9}\"}");
    }

    #[test]
    fn test_invalid_utf8_body_is_400() {
        let resp = decode_body(Bytes::from_static(b"{\"name\":\"caf\xe9\"}")).unwrap_err();
        assert_eq!(resp.status_code(), 400);
        assert_eq!(resp.body(), Some("Request body is not valid UTF-8"));
    }

    #[test]
    fn test_declared_length() {
        assert_eq!(declared_length(&headers(&[("content-length", "42")])), Some(42));
        assert_eq!(declared_length(&headers(&[("content-length", "lots")])), None);
        assert_eq!(declared_length(&HeaderMap::new()), None);
    }
}
