// Server module entry point
// Listener setup, connection handling and the HTTP transport for the dispatcher

pub mod connection;
pub mod listener;
pub mod transport;

// `loop` is a keyword, so the module is exposed as `server_loop`
#[path = "loop.rs"]
pub mod server_loop;

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::config::Config;
use crate::dispatcher::Dispatcher;

// Re-export commonly used types
pub use listener::create_reusable_listener;
pub use server_loop::start_server_loop;

/// Startup and accept-loop failures
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid listen address: {0}")]
    Address(String),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Read-only state shared by every connection
#[derive(Debug)]
pub struct ServerState {
    pub config: Config,
    pub dispatcher: Dispatcher,
}

impl ServerState {
    pub fn new(config: Config, dispatcher: Dispatcher) -> Arc<Self> {
        Arc::new(Self { config, dispatcher })
    }
}
