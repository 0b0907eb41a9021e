//! Resource-oriented HTTP API server
//!
//! A request names a resource and its arguments as `resource/arg1/arg2` in a
//! single query parameter. The [`dispatcher::Dispatcher`] looks the resource
//! up in a [`registry::Registry`], resolves the verb (honouring the
//! `X-HTTP-Method` tunnel), decodes the body and hands an
//! [`controller::Exchange`] to the resource's [`controller::Controller`].
//! Whatever happens, the caller gets back an [`http::ApiResponse`].

pub mod config;
pub mod controller;
pub mod controllers;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod logger;
pub mod registry;
pub mod request;
pub mod server;
