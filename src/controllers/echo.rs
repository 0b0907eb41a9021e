//! Echo resource: answers every verb with what it received

use std::sync::Arc;

use serde_json::json;

use super::backend::{Connection, ConnectionPool};
use crate::controller::{Controller, Exchange, HandlerResult, Reply};
use crate::error::Fault;
use crate::request::{Method, MethodSet};

pub struct EchoController {
    pool: Arc<ConnectionPool>,
    connection: Option<Connection>,
}

impl EchoController {
    pub const fn new(pool: Arc<ConnectionPool>) -> Self {
        Self {
            pool,
            connection: None,
        }
    }

    fn echo(&self, exchange: &mut Exchange) -> HandlerResult {
        exchange.set_response_headers([("X-Echo-Method", exchange.method().as_str())]);
        Reply::json(&json!({
            "resource": exchange.resource(),
            "args": exchange.args(),
            "method": exchange.method().as_str(),
            "body": exchange.body(),
            "connection": self.connection.map(|c| c.id),
        }))
    }
}

impl Controller for EchoController {
    fn methods(&self) -> MethodSet {
        MethodSet::of(&Method::ALL)
    }

    fn init_model(&mut self, _exchange: &Exchange) -> Result<(), Fault> {
        self.connection = Some(self.pool.connect()?);
        Ok(())
    }

    fn do_delete(&mut self, exchange: &mut Exchange) -> HandlerResult {
        self.echo(exchange)
    }

    fn do_post(&mut self, exchange: &mut Exchange) -> HandlerResult {
        self.echo(exchange)
    }

    fn do_get(&mut self, exchange: &mut Exchange) -> HandlerResult {
        self.echo(exchange)
    }

    fn do_put(&mut self, exchange: &mut Exchange) -> HandlerResult {
        self.echo(exchange)
    }
}
