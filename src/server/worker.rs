// Worker module
// Worker-per-connection scheduling: the acceptor hands every connection to
// its own task, which performs exactly one exchange and exits

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinError, JoinSet};

use super::connection::{Connection, ReadOutcome};
use super::signal::ShutdownListener;
use super::ShutdownReport;
use crate::cache::FileCache;
use crate::config::Config;
use crate::handler::RequestHandler;
use crate::logger;

/// Settings every worker receives
#[derive(Debug, Clone)]
struct WorkerSettings {
    handler: RequestHandler,
    cache_capacity: usize,
    read_buffer_size: usize,
    access_log: Option<String>,
}

enum Event {
    Shutdown,
    Accepted(io::Result<(TcpStream, SocketAddr)>),
    Finished(Result<(), JoinError>),
}

/// Acceptor plus the set of live workers
///
/// There is no cap on concurrent workers. Each worker owns a private file
/// cache that is dropped when it exits.
pub struct WorkerPool {
    listener: TcpListener,
    settings: Arc<WorkerSettings>,
    workers: JoinSet<()>,
}

impl WorkerPool {
    pub fn new(
        listener: TcpListener,
        handler: RequestHandler,
        cache_capacity: usize,
        read_buffer_size: usize,
        access_log: Option<String>,
    ) -> Self {
        Self {
            listener,
            settings: Arc::new(WorkerSettings {
                handler,
                cache_capacity,
                read_buffer_size,
                access_log,
            }),
            workers: JoinSet::new(),
        }
    }

    pub fn from_config(listener: TcpListener, config: &Config, handler: RequestHandler) -> Self {
        Self::new(
            listener,
            handler,
            config.files.cache_capacity,
            config.http.read_buffer_size,
            config
                .logging
                .access_log
                .then(|| config.logging.access_log_format.clone()),
        )
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept until shutdown, then abort whatever is still running
    pub async fn run(mut self, mut shutdown: ShutdownListener) -> ShutdownReport {
        loop {
            let reaping = !self.workers.is_empty();
            let event = tokio::select! {
                biased;
                () = shutdown.wait() => Event::Shutdown,
                Some(done) = self.workers.join_next(), if reaping => Event::Finished(done),
                accepted = self.listener.accept() => Event::Accepted(accepted),
            };

            match event {
                Event::Shutdown => break,
                Event::Finished(done) => reap(done),
                Event::Accepted(Ok((stream, peer))) => {
                    logger::log_worker_spawned(&peer);
                    let settings = Arc::clone(&self.settings);
                    self.workers.spawn(serve_once(stream, peer, settings));
                }
                Event::Accepted(Err(e)) => logger::log_transport_error("accept failed", &e),
            }
        }

        self.shutdown().await
    }

    async fn shutdown(mut self) -> ShutdownReport {
        drop(self.listener);
        self.workers.abort_all();

        let mut closed_connections = 0;
        while let Some(done) = self.workers.join_next().await {
            match done {
                Err(e) if e.is_cancelled() => closed_connections += 1,
                other => reap(other),
            }
        }

        let report = ShutdownReport {
            closed_connections,
            released_cache_entries: 0,
        };
        logger::log_shutdown(report.closed_connections, report.released_cache_entries);
        report
    }
}

fn reap(done: Result<(), JoinError>) {
    if let Err(e) = done {
        if e.is_panic() {
            logger::log_error(&format!("[Worker] Worker panicked: {e}"));
        }
    }
}

/// One read, one response, then the connection closes
async fn serve_once(stream: TcpStream, peer: SocketAddr, settings: Arc<WorkerSettings>) {
    let mut conn = Connection::new(stream, peer);

    match conn.read_request(settings.read_buffer_size).await {
        Ok(ReadOutcome::Data(_)) => {}
        Ok(ReadOutcome::Closed | ReadOutcome::WouldBlock) => return,
        Err(e) => {
            logger::log_transport_error("read failed", &e);
            return;
        }
    }

    // file lookups block, so they run off the runtime threads
    let started = Instant::now();
    let request = conn.buffer().to_vec();
    let handler = settings.handler.clone();
    let cache_capacity = settings.cache_capacity;
    let handled = tokio::task::spawn_blocking(move || {
        let mut cache = FileCache::new(cache_capacity);
        handler.handle(&request, &mut cache)
    })
    .await;

    let mut exchange = match handled {
        Ok(exchange) => exchange,
        Err(e) => {
            logger::log_error(&format!("[Worker] Request handling failed: {e}"));
            return;
        }
    };
    exchange.response.keep_alive = false;

    if let Err(e) = conn
        .send(&exchange, started, settings.access_log.as_deref())
        .await
    {
        logger::log_transport_error("write failed", &e);
    }
}
