//! Controller base
//!
//! A controller implements any subset of the four verb operations and
//! declares that subset through [`Controller::methods`]. [`dispatch`] checks
//! the verb, runs the model hook, calls the one matching operation and
//! normalizes what it returns into an [`ApiResponse`].

mod exchange;

pub use exchange::{Exchange, ExchangeSettings, Phase, DEFAULT_METHOD_OVERRIDE_HEADER};

use serde::Serialize;
use serde_json::Value;

use crate::error::Fault;
use crate::http::ApiResponse;
use crate::request::{Method, MethodSet};

/// What a verb operation may return
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A complete response; merged with the accumulated headers
    Response(ApiResponse),
    /// Any value, sent as a JSON body with status 200
    Json(Value),
    /// Deprecated: a string used verbatim as the response body
    Literal(String),
}

impl Reply {
    /// Serialize `value` into a JSON reply
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, Fault> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| Fault::internal(format!("Failed to serialize reply: {e}")))
    }
}

impl From<ApiResponse> for Reply {
    fn from(response: ApiResponse) -> Self {
        Self::Response(response)
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

pub type HandlerResult = Result<Reply, Fault>;

/// A resource handler
///
/// Only verbs listed by `methods` are ever called; the rest are answered with
/// 405 before the controller runs. Verbs listed but left at their default
/// implementation answer 501.
pub trait Controller {
    /// Verbs this controller implements
    fn methods(&self) -> MethodSet;

    /// Called right before the verb operation, e.g. to open a connection
    fn init_model(&mut self, _exchange: &Exchange) -> Result<(), Fault> {
        Ok(())
    }

    fn do_delete(&mut self, exchange: &mut Exchange) -> HandlerResult {
        Err(unimplemented_verb(exchange))
    }

    fn do_post(&mut self, exchange: &mut Exchange) -> HandlerResult {
        Err(unimplemented_verb(exchange))
    }

    fn do_get(&mut self, exchange: &mut Exchange) -> HandlerResult {
        Err(unimplemented_verb(exchange))
    }

    fn do_put(&mut self, exchange: &mut Exchange) -> HandlerResult {
        Err(unimplemented_verb(exchange))
    }
}

fn unimplemented_verb(exchange: &Exchange) -> Fault {
    Fault::not_implemented(format!(
        "{} is not implemented for {}",
        exchange.method(),
        exchange.resource()
    ))
}

/// Verbs a controller supports, recomputed on every call
pub fn allowed_methods(controller: &dyn Controller) -> MethodSet {
    controller.methods()
}

/// Run one exchange through a controller
///
/// A verb outside [`allowed_methods`] yields a 405 carrying an `Allow` header.
/// Faults from the model hook or the operation are returned as is, so a
/// [`Fault::Http`] reaches the dispatcher untouched.
pub fn dispatch(controller: &mut dyn Controller, exchange: &mut Exchange) -> Result<ApiResponse, Fault> {
    let allowed = allowed_methods(controller);
    let method = exchange.method();

    if !allowed.contains(method) {
        exchange.set_phase(Phase::Rejected);
        let rejection = ApiResponse::with_status_body(405, format!("405 Method Not Allowed: {method}"))
            .with_header("Allow", allowed.allow_header())
            .with_header("Content-Type", "text/plain");
        return Ok(exchange.normalize(Reply::Response(rejection)));
    }

    exchange.set_phase(Phase::Dispatching);
    let reply = controller
        .init_model(exchange)
        .and_then(|()| match method {
            Method::Delete => controller.do_delete(exchange),
            Method::Post => controller.do_post(exchange),
            Method::Get => controller.do_get(exchange),
            Method::Put => controller.do_put(exchange),
        });

    match reply {
        Ok(reply) => {
            exchange.set_phase(Phase::Completed);
            Ok(exchange.normalize(reply))
        }
        Err(fault) => {
            exchange.set_phase(Phase::Faulted);
            Err(fault)
        }
    }
}
