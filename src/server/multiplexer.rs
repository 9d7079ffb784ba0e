// Multiplexer module
// Single-threaded event loop: one readiness wait covering the listener and
// every occupied slot, then each ready slot is serviced in slot order

use std::future::poll_fn;
use std::io;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::net::{TcpListener, TcpStream};

use super::connection::{ConnectionTable, ReadOutcome};
use super::signal::ShutdownListener;
use super::ShutdownReport;
use crate::cache::FileCache;
use crate::config::Config;
use crate::handler::RequestHandler;
use crate::logger;

enum Event {
    Shutdown,
    Accepted(io::Result<(TcpStream, SocketAddr)>),
    Readable(Vec<usize>),
}

/// Owns the listener, the slot table and the one shared file cache
///
/// Nothing here is shared with another task, so no locking is involved.
pub struct Multiplexer {
    listener: TcpListener,
    table: ConnectionTable,
    cache: FileCache,
    handler: RequestHandler,
    read_buffer_size: usize,
    access_log: Option<String>,
}

impl Multiplexer {
    pub fn new(
        listener: TcpListener,
        handler: RequestHandler,
        max_clients: usize,
        cache_capacity: usize,
        read_buffer_size: usize,
    ) -> Self {
        Self {
            listener,
            table: ConnectionTable::new(max_clients),
            cache: FileCache::new(cache_capacity),
            handler,
            read_buffer_size,
            access_log: None,
        }
    }

    pub fn from_config(listener: TcpListener, config: &Config, handler: RequestHandler) -> Self {
        let mut mux = Self::new(
            listener,
            handler,
            config.server.max_clients,
            config.files.cache_capacity,
            config.http.read_buffer_size,
        );
        mux.access_log = config
            .logging
            .access_log
            .then(|| config.logging.access_log_format.clone());
        mux
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until shutdown is requested, then drain
    ///
    /// The accept branch is disabled while every slot is taken; pending
    /// clients wait in the kernel backlog until a slot frees.
    pub async fn run(mut self, mut shutdown: ShutdownListener) -> ShutdownReport {
        loop {
            let accepting = !self.table.is_full();
            // one event per wakeup: an accept or a batch of ready slots, never both
            let event = tokio::select! {
                biased;
                () = shutdown.wait() => Event::Shutdown,
                accepted = self.listener.accept(), if accepting => Event::Accepted(accepted),
                ready = poll_fn(|cx| self.table.poll_ready(cx)) => Event::Readable(ready),
            };

            match event {
                Event::Shutdown => break,
                Event::Accepted(accepted) => self.admit(accepted),
                Event::Readable(ready) => {
                    for slot in ready {
                        self.service(slot).await;
                    }
                }
            }
        }

        self.shutdown()
    }

    fn admit(&mut self, accepted: io::Result<(TcpStream, SocketAddr)>) {
        let (stream, peer) = match accepted {
            Ok(pair) => pair,
            Err(e) => {
                logger::log_transport_error("accept failed", &e);
                return;
            }
        };

        match self.table.insert(stream, peer) {
            Ok(slot) => {
                logger::log_connection_accepted(&peer, slot);
                if self.table.is_full() {
                    logger::log_slot_table_full(self.table.capacity());
                }
            }
            // only reachable if accept ran while full; the stream is dropped
            Err(_stream) => logger::log_slot_table_full(self.table.capacity()),
        }
    }

    /// One read, at most one response, for a ready slot
    async fn service(&mut self, slot: usize) {
        let Some(conn) = self.table.get_mut(slot) else {
            return;
        };

        match conn.read_once(self.read_buffer_size) {
            Ok(ReadOutcome::Data(_)) => {}
            Ok(ReadOutcome::WouldBlock) => return,
            Ok(ReadOutcome::Closed) => {
                self.close(slot, "peer closed");
                return;
            }
            Err(e) => {
                logger::log_transport_error("read failed", &e);
                self.close(slot, "read error");
                return;
            }
        }

        let started = Instant::now();
        let exchange = self.handler.handle(conn.buffer(), &mut self.cache);

        let sent = conn.send(&exchange, started, self.access_log.as_deref()).await;
        match sent {
            Err(e) => {
                logger::log_transport_error("write failed", &e);
                self.close(slot, "write error");
            }
            Ok(()) if !exchange.keep_alive() => self.close(slot, "response complete"),
            Ok(()) => {}
        }
    }

    fn close(&mut self, slot: usize, reason: &str) {
        if self.table.remove(slot).is_some() {
            logger::log_connection_closed(slot, reason);
        }
    }

    fn shutdown(mut self) -> ShutdownReport {
        let report = ShutdownReport {
            closed_connections: self.table.close_all(),
            released_cache_entries: self.cache.clear(),
        };
        drop(self.listener);
        logger::log_shutdown(report.closed_connections, report.released_cache_entries);
        report
    }
}
