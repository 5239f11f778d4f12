//! Server network layer: TCP accept loop, per-connection readers and the
//! response writer.
//!
//! Requests flow from each connection's read loop into the bounded ingress
//! queue, through the dispatcher to the handlers, and back out through the
//! bounded egress queue to a single writer task that looks the destination up
//! in the connection registry.

use crate::config::ServerConfig;
use crate::connection::{Connection, ConnectionId, Incoming, Outgoing};
use crate::context::ServerContext;
use crate::handlers;
use crate::router::Router;
use log::{debug, error, info, warn};
use shared::codec::FrameReader;
use shared::Request;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

/// A bound server, ready to run.
pub struct Server {
    listener: TcpListener,
    context: Arc<ServerContext>,
    router: Arc<Router>,

    // Communication channels
    ingress_tx: mpsc::Sender<Incoming>,
    ingress_rx: mpsc::Receiver<Incoming>,
    egress_rx: mpsc::Receiver<Outgoing>,
}

impl Server {
    /// Binds the listener and wires up the standard handlers.
    pub async fn bind(config: &ServerConfig) -> io::Result<Self> {
        Self::with_router(config, handlers::router()).await
    }

    pub async fn with_router(config: &ServerConfig, router: Router) -> io::Result<Self> {
        let listener = TcpListener::bind(config.address()).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (ingress_tx, ingress_rx) = mpsc::channel(config.ingress_capacity());
        let (egress_tx, egress_rx) = mpsc::channel(config.egress_capacity());

        Ok(Server {
            listener,
            context: Arc::new(ServerContext::new(config, egress_tx)),
            router: Arc::new(router),
            ingress_tx,
            ingress_rx,
            egress_rx,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn context(&self) -> Arc<ServerContext> {
        Arc::clone(&self.context)
    }

    /// Serves until the process is killed.
    pub async fn run(self) {
        self.run_until(std::future::pending()).await
    }

    /// Serves until `shutdown` completes, then stops every task and closes
    /// all connections.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let Server {
            listener,
            context,
            router,
            ingress_tx,
            ingress_rx,
            egress_rx,
        } = self;

        // Initialize concurrent tasks
        let dispatcher = Self::spawn_dispatcher(router, Arc::clone(&context), ingress_rx);
        let writer = Self::spawn_writer(Arc::clone(&context), egress_rx);
        let mut readers = JoinSet::new();
        let mut accepted: u64 = 0;

        info!("Server started successfully");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Server shutting down");
                    break;
                },

                res = listener.accept() => match res {
                    Ok((stream, addr)) => {
                        accepted += 1;
                        let id = ConnectionId::new(addr, accepted);
                        Self::accept_connection(&context, &ingress_tx, &mut readers, stream, id).await;
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                },

                // Reap finished read loops
                Some(_) = readers.join_next(), if !readers.is_empty() => {},
            }
        }

        readers.abort_all();
        dispatcher.abort();
        writer.abort();
        context.close_all().await;
    }

    async fn accept_connection(
        context: &Arc<ServerContext>,
        ingress: &mpsc::Sender<Incoming>,
        readers: &mut JoinSet<()>,
        stream: TcpStream,
        id: ConnectionId,
    ) {
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY for {}: {}", id, e);
        }

        let (read_half, write_half) = stream.into_split();
        context
            .connect(Arc::new(Connection::new(id, write_half)))
            .await;

        readers.spawn(Self::read_loop(
            id,
            read_half,
            ingress.clone(),
            Arc::clone(context),
        ));
    }

    /// Decodes requests until the connection fails, then tears it down.
    async fn read_loop(
        id: ConnectionId,
        read_half: OwnedReadHalf,
        ingress: mpsc::Sender<Incoming>,
        context: Arc<ServerContext>,
    ) {
        let mut reader = FrameReader::new(read_half);

        loop {
            match reader.read_frame::<Request>().await {
                Ok(request) => {
                    debug!("{} requested {}", id, request.method);
                    if let Err(e) = ingress.send(Incoming { from: id, request }).await {
                        error!("Failed to send request to dispatcher: {}", e);
                        break;
                    }
                }
                Err(e) if e.is_closed() => {
                    debug!("Connection {} closed by peer", id);
                    break;
                }
                Err(e) => {
                    warn!("Dropping connection {}: {}", id, e);
                    break;
                }
            }
        }

        context.disconnect(id).await;
    }

    /// Spawns task that feeds the ingress queue to the router
    fn spawn_dispatcher(
        router: Arc<Router>,
        context: Arc<ServerContext>,
        ingress_rx: mpsc::Receiver<Incoming>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            router.run(context, ingress_rx).await;
        })
    }

    /// Spawns task that processes the outgoing response queue
    fn spawn_writer(
        context: Arc<ServerContext>,
        mut egress_rx: mpsc::Receiver<Outgoing>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(outgoing) = egress_rx.recv().await {
                let connection = context.registry().read().await.lookup(&outgoing.to);

                match connection {
                    Some(connection) => {
                        if let Err(e) = connection.send(&outgoing.response).await {
                            error!("Failed to send to {}: {}", outgoing.to, e);
                        }
                    }
                    None => {
                        debug!(
                            "Dropping {} for {}: connection is gone",
                            outgoing.response.method, outgoing.to
                        );
                    }
                }
            }
        })
    }
}
