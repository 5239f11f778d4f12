//! A client connection as seen by the rest of the server.
//!
//! The read half of the socket is owned by the connection's read loop; what
//! lives in the registry is only the write half, behind its own lock so that
//! concurrent senders never interleave frames.

use shared::codec::{FrameError, FrameWriter};
use shared::{Request, Response};
use std::fmt;
use std::net::SocketAddr;
use tokio::io::AsyncWrite;
use tokio::sync::Mutex;

/// Connection identity: the peer address plus the accept serial, so a
/// socket that reuses an old peer address never shares an identity with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId {
    addr: SocketAddr,
    serial: u64,
}

impl ConnectionId {
    pub fn new(addr: SocketAddr, serial: u64) -> Self {
        Self { addr, serial }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.addr, self.serial)
    }
}

/// A decoded request stamped with the connection it arrived on.
#[derive(Debug, Clone)]
pub struct Incoming {
    pub from: ConnectionId,
    pub request: Request,
}

/// A response or push addressed to a connection.
#[derive(Debug, Clone)]
pub struct Outgoing {
    pub to: ConnectionId,
    pub response: Response,
}

impl Outgoing {
    pub fn new(to: ConnectionId, response: Response) -> Self {
        Self { to, response }
    }
}

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

pub struct Connection {
    id: ConnectionId,
    writer: Mutex<FrameWriter<BoxedWriter>>,
}

impl Connection {
    pub fn new<W>(id: ConnectionId, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let writer: BoxedWriter = Box::new(writer);
        Self {
            id,
            writer: Mutex::new(FrameWriter::new(writer)),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Writes one response frame. Holding the lock for the whole frame keeps
    /// concurrent writers from interleaving.
    pub async fn send(&self, response: &Response) -> Result<(), FrameError> {
        self.writer.lock().await.write_frame(response).await
    }

    /// Shuts down the write half; the peer sees EOF.
    pub async fn close(&self) -> Result<(), FrameError> {
        self.writer.lock().await.shutdown().await
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").field("id", &self.id).finish()
    }
}
