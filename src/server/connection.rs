// Connection module
// One accepted client stream plus the fixed-size slot table that owns them
// in multiplexed mode

use std::io;
use std::net::SocketAddr;
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::handler::Exchange;
use crate::logger;

/// Result of a single read attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// This many bytes are now in the connection buffer
    Data(usize),
    /// Orderly close by the peer
    Closed,
    /// Readiness was spurious, nothing to read yet
    WouldBlock,
}

/// An accepted client connection
///
/// The buffer holds the bytes of exactly one read and is cleared after each
/// exchange; a request split across reads is seen only partially.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: Vec<u8>,
}

impl Connection {
    pub const fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            stream,
            peer,
            buffer: Vec::new(),
        }
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Non-blocking read of at most `max` bytes into the buffer
    pub fn read_once(&mut self, max: usize) -> io::Result<ReadOutcome> {
        self.buffer.resize(max, 0);
        let result = self.stream.try_read(&mut self.buffer);
        self.settle_read(result)
    }

    /// Wait for data and read at most `max` bytes into the buffer
    pub async fn read_request(&mut self, max: usize) -> io::Result<ReadOutcome> {
        self.buffer.resize(max, 0);
        let result = self.stream.read(&mut self.buffer).await;
        self.settle_read(result)
    }

    fn settle_read(&mut self, result: io::Result<usize>) -> io::Result<ReadOutcome> {
        match result {
            Ok(0) => {
                self.buffer.clear();
                Ok(ReadOutcome::Closed)
            }
            Ok(n) => {
                self.buffer.truncate(n);
                Ok(ReadOutcome::Data(n))
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                self.buffer.clear();
                Ok(ReadOutcome::WouldBlock)
            }
            Err(e) => {
                self.buffer.clear();
                Err(e)
            }
        }
    }

    /// Write the response in full, then emit the access log line
    pub async fn send(
        &mut self,
        exchange: &Exchange,
        started: Instant,
        access_format: Option<&str>,
    ) -> io::Result<()> {
        let wire = exchange.response.to_bytes();
        self.stream.write_all(&wire).await?;
        self.stream.flush().await?;
        self.buffer.clear();

        if let Some(format) = access_format {
            let entry = exchange.access_entry(self.peer.to_string(), started.elapsed());
            logger::log_access(&entry, format);
        }
        Ok(())
    }

    fn poll_read_ready(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.stream.poll_read_ready(cx)
    }
}

/// Fixed array of connection slots
///
/// A slot is either free or owns exactly one connection. The table never
/// grows; callers stop accepting while it is full.
pub struct ConnectionTable {
    slots: Vec<Option<Connection>>,
}

impl ConnectionTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(capacity).collect(),
        }
    }

    /// Lowest free slot index
    pub fn free_slot(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Place a new connection into the lowest free slot
    ///
    /// Hands the stream back when every slot is taken.
    pub fn insert(&mut self, stream: TcpStream, peer: SocketAddr) -> Result<usize, TcpStream> {
        match self.free_slot() {
            Some(slot) => {
                self.slots[slot] = Some(Connection::new(stream, peer));
                Ok(slot)
            }
            None => Err(stream),
        }
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Connection> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Free a slot, closing its connection
    pub fn remove(&mut self, slot: usize) -> Option<Connection> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Slots whose socket is readable, in slot order
    ///
    /// Pending while none is; every occupied slot registers the waker, so the
    /// task wakes when any of them turns readable. A socket error counts as
    /// readable so the following read surfaces it.
    pub fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Vec<usize>> {
        let ready: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(slot, conn)| {
                let conn = conn.as_ref()?;
                conn.poll_read_ready(cx).is_ready().then_some(slot)
            })
            .collect();

        if ready.is_empty() {
            Poll::Pending
        } else {
            Poll::Ready(ready)
        }
    }

    /// Close every connection, returning how many were open
    pub fn close_all(&mut self) -> usize {
        let mut closed = 0;
        for (slot, conn) in self.slots.iter_mut().enumerate() {
            if conn.take().is_some() {
                logger::log_connection_closed(slot, "server shutdown");
                closed += 1;
            }
        }
        closed
    }
}
