//! Template resource
//!
//! Starting point for new resources. GET takes a filter argument such as
//! `filter1=something,somethingelse;limit=20`; POST stores the body and
//! answers 201 with the new record's location.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use super::backend::RecordStore;
use crate::controller::{Controller, Exchange, HandlerResult, Reply};
use crate::error::Fault;
use crate::http::ApiResponse;
use crate::request::{Method, MethodSet};

/// One parsed filter value: `a` or `a,b,c`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    One(String),
    Many(Vec<String>),
}

/// Parse `key=v1,v2;key2=v` into a map
///
/// Values holding a comma become lists. Empty segments are skipped; a
/// segment without `=` is a bad request.
pub fn parse_args(input: &str) -> Result<BTreeMap<String, ArgValue>, Fault> {
    let mut params = BTreeMap::new();
    for pair in input.split(';').filter(|p| !p.is_empty()) {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| Fault::bad_request(format!("Malformed argument '{pair}', expected name=value")))?;
        let value = if value.contains(',') {
            ArgValue::Many(value.split(',').map(ToString::to_string).collect())
        } else {
            ArgValue::One(value.to_string())
        };
        params.insert(name.to_string(), value);
    }
    Ok(params)
}

pub struct TemplateController {
    store: Arc<RecordStore>,
}

impl TemplateController {
    pub const fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    fn not_finished_feature() -> Fault {
        Fault::not_implemented("GET by ID not yet supported")
    }
}

impl Controller for TemplateController {
    fn methods(&self) -> MethodSet {
        MethodSet::of(&[Method::Get, Method::Post])
    }

    fn do_get(&mut self, exchange: &mut Exchange) -> HandlerResult {
        let first = exchange.arg(0).unwrap_or_default();
        if !first.is_empty() && !first.contains('=') {
            return Err(Self::not_finished_feature());
        }

        let filters = parse_args(first)?;
        if filters.get("filter1") != Some(&ArgValue::One("something".to_string())) {
            return Err(Fault::bad_request("filter1 must be a something"));
        }

        Reply::json(&json!({ "result": "I Got!", "filters": filters }))
    }

    fn do_post(&mut self, exchange: &mut Exchange) -> HandlerResult {
        let body = exchange
            .body()
            .filter(|b| b.as_text() != Some(""))
            .ok_or_else(|| Fault::bad_request("POST body is required"))?;
        let record = serde_json::to_value(body).map_err(|e| Fault::internal(e.to_string()))?;
        let id = self.store.insert(exchange.resource(), record)?;

        let location = format!("/{}/{id}", exchange.resource());
        Ok(ApiResponse::with_status_body(201, location.clone())
            .with_header("Location", location)
            .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::dispatch;
    use crate::request::RawBody;

    fn controller() -> TemplateController {
        TemplateController::new(Arc::new(RecordStore::new()))
    }

    #[test]
    fn test_parse_args() {
        let args = parse_args("latlon=33.22,55.33;maxmiles=20").unwrap();
        assert_eq!(
            args.get("latlon"),
            Some(&ArgValue::Many(vec!["33.22".to_string(), "55.33".to_string()]))
        );
        assert_eq!(args.get("maxmiles"), Some(&ArgValue::One("20".to_string())));
    }

    #[test]
    fn test_parse_args_edges() {
        assert!(parse_args("").unwrap().is_empty());
        assert_eq!(parse_args("a=1;").unwrap().len(), 1);
        assert_eq!(parse_args("q=x=y").unwrap().get("q"), Some(&ArgValue::One("x=y".to_string())));
        assert_eq!(parse_args("oops").unwrap_err().status_code(), 400);
    }

    #[test]
    fn test_get_with_valid_filter() {
        let mut exchange = Exchange::direct("template/filter1=something;limit=5", "GET", None, None).unwrap();
        let resp = dispatch(&mut controller(), &mut exchange).unwrap();
        assert_eq!(resp.status_code(), 200);
        let body: serde_json::Value = serde_json::from_str(resp.body().unwrap()).unwrap();
        assert_eq!(body["result"], "I Got!");
        assert_eq!(body["filters"]["limit"], "5");
    }

    #[test]
    fn test_get_with_wrong_filter_is_400() {
        let mut exchange = Exchange::direct("template/filter1=nothing", "GET", None, None).unwrap();
        let fault = dispatch(&mut controller(), &mut exchange).unwrap_err();
        assert_eq!(fault.status_code(), 400);
        assert_eq!(fault.to_string(), "filter1 must be a something");

        let mut exchange = Exchange::direct("template/filter1=something,else", "GET", None, None).unwrap();
        assert_eq!(dispatch(&mut controller(), &mut exchange).unwrap_err().status_code(), 400);
    }

    #[test]
    fn test_get_by_id_not_implemented() {
        let mut exchange = Exchange::direct("template/17", "GET", None, None).unwrap();
        let fault = dispatch(&mut controller(), &mut exchange).unwrap_err();
        assert_eq!(fault.status_code(), 501);
        assert_eq!(fault.to_string(), "GET by ID not yet supported");
    }

    #[test]
    fn test_post_creates_record() {
        let store = Arc::new(RecordStore::new());
        let mut controller = TemplateController::new(Arc::clone(&store));

        let body = RawBody::from(r#"{"something":"is awesome"}"#);
        let mut exchange = Exchange::direct("template", "POST", Some(body), Some("application/json")).unwrap();
        let resp = dispatch(&mut controller, &mut exchange).unwrap();
        assert_eq!(resp.status_code(), 201);
        assert_eq!(resp.headers().get("Location"), Some("/template/1"));
        assert_eq!(store.get("template", 1).unwrap()["something"], "is awesome");
    }

    #[test]
    fn test_post_without_body_is_400() {
        let store = Arc::new(RecordStore::new());
        let mut controller = TemplateController::new(Arc::clone(&store));

        let mut exchange = Exchange::direct("template", "POST", None, None).unwrap();
        let fault = dispatch(&mut controller, &mut exchange).unwrap_err();
        assert_eq!(fault.status_code(), 400);
        assert_eq!(fault.to_string(), "POST body is required");
        assert_eq!(store.get("template", 1), None);
    }

    #[test]
    fn test_post_empty_text_body_is_400() {
        let mut exchange =
            Exchange::direct("template", "POST", Some(RawBody::from("")), Some("text/plain")).unwrap();
        assert_eq!(dispatch(&mut controller(), &mut exchange).unwrap_err().status_code(), 400);
    }

    #[test]
    fn test_put_is_405() {
        let mut exchange = Exchange::direct("template", "PUT", None, None).unwrap();
        let resp = dispatch(&mut controller(), &mut exchange).unwrap();
        assert_eq!(resp.status_code(), 405);
        assert_eq!(resp.headers().get("Allow"), Some("POST, GET"));
    }
}
