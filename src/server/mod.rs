// Server module entry point
// Binds the listener and runs one of the two scheduling modes until shutdown

pub mod connection;
pub mod listener;
pub mod multiplexer;
pub mod signal;
pub mod worker;

use tokio::net::TcpListener;

use crate::config::{Config, SchedulingMode};
use crate::error::StartupError;
use crate::handler::RequestHandler;

// Re-export commonly used types
pub use connection::{Connection, ConnectionTable, ReadOutcome};
pub use listener::create_listener;
pub use multiplexer::Multiplexer;
pub use signal::{start_signal_handler, ShutdownListener, ShutdownSignal};
pub use worker::WorkerPool;

/// What the drain released
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub closed_connections: usize,
    pub released_cache_entries: usize,
}

/// Bind the configured address with the configured backlog
///
/// Must be called from inside a Tokio runtime.
pub fn bind(config: &Config) -> Result<TcpListener, StartupError> {
    let addr = config.socket_addr()?;
    create_listener(addr, config.server.backlog)
        .map_err(|source| StartupError::Bind { addr, source })
}

/// Serve on `listener` in the configured mode until `shutdown` fires
pub async fn serve(
    config: &Config,
    listener: TcpListener,
    handler: RequestHandler,
    shutdown: ShutdownListener,
) -> ShutdownReport {
    match config.server.mode {
        SchedulingMode::Multiplexed => {
            Multiplexer::from_config(listener, config, handler)
                .run(shutdown)
                .await
        }
        SchedulingMode::WorkerPerConnection => {
            WorkerPool::from_config(listener, config, handler)
                .run(shutdown)
                .await
        }
    }
}
