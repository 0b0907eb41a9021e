// Connection handling module
// Accepts one TCP connection and serves HTTP/1.1 on it

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

use super::transport;
use super::ServerState;
use crate::logger;

/// Take a slot in the connection counter, or `None` when the limit is reached
///
/// Increments first and rolls back on rejection, so concurrent accepts
/// cannot overshoot the limit.
pub fn try_acquire(conn_counter: &AtomicUsize, max_connections: Option<u64>) -> Option<usize> {
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);
    if let Some(max_conn) = max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            return None;
        }
    }
    Some(prev_count + 1)
}

/// Accept a connection, checking limits and logging.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<ServerState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    let max_connections = state.config.performance.max_connections;
    if try_acquire(conn_counter, max_connections).is_none() {
        logger::log_warning(&format!(
            "Max connections reached ({}). Connection from {peer_addr} rejected.",
            max_connections.unwrap_or_default()
        ));
        drop(stream);
        return;
    }

    logger::log_connection_accepted(&peer_addr);
    handle_connection(stream, peer_addr, Arc::clone(state), Arc::clone(conn_counter));
}

/// Serve a single connection in a local task, releasing its slot when done
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<ServerState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let timeout_duration = Duration::from_secs(
            performance
                .read_timeout
                .max(performance.write_timeout)
                .max(performance.keep_alive_timeout),
        );

        let mut builder = http1::Builder::new();
        builder.keep_alive(performance.keep_alive_timeout > 0);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| transport::handle_request(req, Arc::clone(&service_state), peer_addr)),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => logger::log_debug(&format!(
                "Connection from {peer_addr} closed after {} seconds",
                timeout_duration.as_secs()
            )),
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_connections() {
        let counter = AtomicUsize::new(0);
        for expected in 1..=5 {
            assert_eq!(try_acquire(&counter, None), Some(expected));
        }
    }

    #[test]
    fn test_limit_rejects_and_rolls_back() {
        let counter = AtomicUsize::new(0);
        assert_eq!(try_acquire(&counter, Some(2)), Some(1));
        assert_eq!(try_acquire(&counter, Some(2)), Some(2));
        assert_eq!(try_acquire(&counter, Some(2)), None);
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        counter.fetch_sub(1, Ordering::SeqCst);
        assert_eq!(try_acquire(&counter, Some(2)), Some(2));
    }
}
