//! Request body extraction
//!
//! PUT and POST bodies are located (explicit override, pre-parsed form
//! fields, raw input) and decoded according to the declared content type.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::context::RequestContext;
use super::method::Method;
use crate::error::Fault;

/// Content type that triggers JSON decoding
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Form fields already decoded by the transport
pub type FormFields = BTreeMap<String, String>;

/// Undecoded body content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawBody {
    Text(String),
    Form(FormFields),
}

impl From<&str> for RawBody {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for RawBody {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<FormFields> for RawBody {
    fn from(fields: FormFields) -> Self {
        Self::Form(fields)
    }
}

/// Decoded body handed to controllers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Json(Value),
    Form(FormFields),
    Text(String),
}

impl Payload {
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    pub const fn as_form(&self) -> Option<&FormFields> {
        match self {
            Self::Form(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Look up a top-level string field in a JSON object or form body
    pub fn field(&self, name: &str) -> Option<&str> {
        match self {
            Self::Json(value) => value.get(name).and_then(Value::as_str),
            Self::Form(fields) => fields.get(name).map(String::as_str),
            Self::Text(_) => None,
        }
    }
}

/// Extract and decode the request body
///
/// Returns `Ok(None)` for verbs other than PUT and POST. Content is taken from
/// `override_body` if given, else from non-empty pre-parsed form fields, else
/// from the raw input. The content type is `declared_content_type`, else the
/// one reported by the transport. Text declared as `application/json` is
/// parsed; malformed JSON is an error. Anything else passes through as is.
pub fn extract_body(
    method: Method,
    override_body: Option<RawBody>,
    declared_content_type: Option<&str>,
    ctx: &RequestContext,
) -> Result<Option<Payload>, Fault> {
    if !method.has_body() {
        return Ok(None);
    }

    let raw = match override_body {
        Some(body) => body,
        None => match ctx.form.as_ref().filter(|fields| !fields.is_empty()) {
            Some(fields) => RawBody::Form(fields.clone()),
            None => RawBody::Text(ctx.input.clone()),
        },
    };

    let content_type = declared_content_type
        .filter(|ct| !ct.is_empty())
        .or_else(|| ctx.content_type());

    let payload = match raw {
        RawBody::Text(text) if content_type == Some(JSON_CONTENT_TYPE) => {
            Payload::Json(serde_json::from_str(&text)?)
        }
        RawBody::Text(text) => Payload::Text(text),
        RawBody::Form(fields) => Payload::Form(fields),
    };

    Ok(Some(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_body(raw: impl Into<RawBody>, content_type: &str) -> Result<Option<Payload>, Fault> {
        extract_body(
            Method::Post,
            Some(raw.into()),
            Some(content_type),
            &RequestContext::default(),
        )
    }

    #[test]
    fn test_json_body() {
        let payload = post_body(r#"{ "hi": "there" }"#, "application/json")
            .unwrap()
            .unwrap();
        assert_eq!(payload.field("hi"), Some("there"));
        assert_eq!(payload, Payload::Json(serde_json::json!({"hi": "there"})));
    }

    #[test]
    fn test_malformed_json_fails() {
        let result = post_body(r#"{ "hi": "#, "application/json");
        assert!(matches!(result, Err(Fault::Body(_))));
    }

    #[test]
    fn test_form_body_stays_structured() {
        let fields = FormFields::from([("hi".to_string(), "there".to_string())]);
        let payload = post_body(fields.clone(), "application/x-www-form-urlencoded")
            .unwrap()
            .unwrap();
        assert_eq!(payload.as_form(), Some(&fields));
        assert_eq!(payload.field("hi"), Some("there"));
    }

    #[test]
    fn test_text_body_passes_through() {
        let payload = post_body("Well, hello there.", "text/plain").unwrap().unwrap();
        assert_eq!(payload.as_text(), Some("Well, hello there."));
    }

    #[test]
    fn test_json_with_parameters_is_not_decoded() {
        let payload = post_body("{}", "application/json; charset=utf-8")
            .unwrap()
            .unwrap();
        assert_eq!(payload, Payload::Text("{}".to_string()));
    }

    #[test]
    fn test_no_body_for_get_and_delete() {
        let ctx = RequestContext {
            input: "ignored".to_string(),
            ..RequestContext::default()
        };
        assert_eq!(extract_body(Method::Get, None, None, &ctx).unwrap(), None);
        assert_eq!(extract_body(Method::Delete, None, None, &ctx).unwrap(), None);
    }

    #[test]
    fn test_put_reads_raw_input_and_header_content_type() {
        let mut ctx = RequestContext {
            input: r#"{"name":"sprocket"}"#.to_string(),
            ..RequestContext::default()
        };
        ctx.headers.set("Content-Type", "application/json");
        let payload = extract_body(Method::Put, None, None, &ctx).unwrap().unwrap();
        assert_eq!(payload.field("name"), Some("sprocket"));
    }

    #[test]
    fn test_form_fields_preferred_over_raw_input() {
        let ctx = RequestContext {
            form: Some(FormFields::from([("a".to_string(), "1".to_string())])),
            input: "a=1".to_string(),
            ..RequestContext::default()
        };
        let payload = extract_body(Method::Post, None, None, &ctx).unwrap().unwrap();
        assert_eq!(payload.field("a"), Some("1"));

        // Empty form falls back to the raw input
        let ctx = RequestContext {
            form: Some(FormFields::new()),
            input: "raw".to_string(),
            ..RequestContext::default()
        };
        let payload = extract_body(Method::Post, None, None, &ctx).unwrap().unwrap();
        assert_eq!(payload.as_text(), Some("raw"));
    }

    #[test]
    fn test_declared_content_type_beats_transport() {
        let ctx = RequestContext {
            content_type: Some("application/json".to_string()),
            input: "not json".to_string(),
            ..RequestContext::default()
        };
        let payload = extract_body(Method::Post, None, Some("text/plain"), &ctx)
            .unwrap()
            .unwrap();
        assert_eq!(payload.as_text(), Some("not json"));
        assert!(extract_body(Method::Post, None, None, &ctx).is_err());
    }
}
