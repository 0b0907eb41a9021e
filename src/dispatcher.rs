//! Top-level request dispatcher
//!
//! Resolves the resource named by the request to a controller, runs it and
//! guarantees that every outcome, including faults and panics in controller
//! code, comes back as an [`ApiResponse`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::controller::{self, Exchange, ExchangeSettings};
use crate::error::Fault;
use crate::http::ApiResponse;
use crate::logger;
use crate::registry::{ControllerFactory, Registry};
use crate::request::{resource_name, Method, RequestContext};

/// Body of the 404 for unregistered resources
pub const RESOURCE_NOT_FOUND: &str = "Resource Not Found";

/// Routes requests to registered controllers
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    settings: ExchangeSettings,
}

impl Dispatcher {
    pub fn new(registry: Registry, settings: ExchangeSettings) -> Self {
        Self {
            registry: Arc::new(registry),
            settings,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handle one call; never fails and never panics out
    pub fn route(&self, ctx: &RequestContext) -> ApiResponse {
        let Some(raw) = ctx.request_line() else {
            logger::log_warning("Request without request parameter");
            return Fault::MissingRequest.into_response();
        };

        let resource = resource_name(raw);
        let Some(factory) = self.registry.lookup(resource) else {
            logger::log_dispatch(method_label(None, ctx), raw, 404, "not_found");
            return ApiResponse::with_status_body(404, RESOURCE_NOT_FOUND);
        };

        let mut resolved = None;
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| self.run(raw, ctx, factory, &mut resolved)));
        let method = method_label(resolved, ctx);

        match outcome {
            Ok(Ok((response, phase))) => {
                logger::log_dispatch(method, raw, response.status_code(), phase);
                response
            }
            Ok(Err(fault)) => {
                let response = fault.into_response();
                if response.status_code() >= 500 {
                    logger::log_error(&format!(
                        "{raw}: {}",
                        response.body().unwrap_or_default()
                    ));
                }
                logger::log_dispatch(method, raw, response.status_code(), "faulted");
                response
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                logger::log_error(&format!("Controller for '{resource}' panicked: {message}"));
                logger::log_dispatch(method, raw, 500, "faulted");
                ApiResponse::with_status_body(500, message)
            }
        }
    }

    /// `resolved` receives the verb as soon as the exchange is built
    fn run(
        &self,
        raw: &str,
        ctx: &RequestContext,
        factory: &ControllerFactory,
        resolved: &mut Option<Method>,
    ) -> Result<(ApiResponse, &'static str), Fault> {
        let mut controller = factory();
        let mut exchange = Exchange::from_request(raw, ctx, &self.settings)?;
        *resolved = Some(exchange.method());
        let response = controller::dispatch(controller.as_mut(), &mut exchange)?;
        Ok((response, exchange.phase().as_str()))
    }
}

/// Verb for the dispatch log: the resolved one, else what the transport sent
fn method_label(resolved: Option<Method>, ctx: &RequestContext) -> &str {
    match resolved {
        Some(method) => method.as_str(),
        None => ctx.method.as_deref().unwrap_or("-"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Controller panicked".to_string()
    }
}
