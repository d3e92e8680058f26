//! Server network layer: UDP intake loop feeding the outbound dispatcher

use crate::config::ServerConfig;
use crate::directory::SessionDirectory;
use crate::dispatcher::{DispatchStats, Dispatcher};
use crate::routing::{BroadcastStrategy, Delivery, Router};
use log::{debug, error, info, warn};
use shared::{ChatError, WireFormat, MAX_DATAGRAM_SIZE};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep, MissedTickBehavior};

/// How often idle sessions are looked for when a timeout is configured
const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Chat relay server
///
/// The intake loop is the only writer of the session directory: it reads a
/// datagram, decodes it, routes it and queues the result, strictly in arrival
/// order. Network writes happen on the dispatcher task.
pub struct Server {
    socket: Arc<UdpSocket>,
    directory: SessionDirectory,
    router: Router,
    wire: WireFormat,
    idle_timeout: Option<Duration>,

    outbound_tx: mpsc::Sender<Delivery>,
    dispatcher: Dispatcher,
}

impl Server {
    /// Binds the listen socket; the only failure that stops the relay
    pub async fn new(config: ServerConfig) -> Result<Self, ChatError> {
        let socket = UdpSocket::bind(&config.bind_addr).await?;
        if let BroadcastStrategy::Rendezvous(addr) = config.broadcast {
            socket.set_broadcast(true)?;
            info!("Broadcasting through rendezvous address {}", addr);
        }
        let socket = Arc::new(socket);
        info!(
            "Server listening on {} ({} wire format)",
            socket.local_addr()?,
            config.wire
        );

        let (dispatcher, outbound_tx) =
            Dispatcher::new(Arc::clone(&socket), config.wire, config.queue_capacity);

        Ok(Server {
            socket,
            directory: SessionDirectory::new(),
            router: Router::new(config.broadcast),
            wire: config.wire,
            idle_timeout: config.idle_timeout,
            outbound_tx,
            dispatcher,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ChatError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn directory(&self) -> &SessionDirectory {
        &self.directory
    }

    /// Runs until Ctrl+C
    pub async fn run(self) -> Result<DispatchStats, ChatError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Runs until `shutdown` completes, then lets the dispatcher drain
    pub async fn run_until<F>(self, shutdown: F) -> Result<DispatchStats, ChatError>
    where
        F: Future<Output = ()>,
    {
        let Server {
            socket,
            mut directory,
            router,
            wire,
            idle_timeout,
            outbound_tx,
            dispatcher,
        } = self;

        let dispatcher_handle = dispatcher.spawn();
        let mut intake = Intake {
            directory: &mut directory,
            router: &router,
            wire,
            outbound_tx,
        };

        let mut idle_interval = interval(IDLE_CHECK_INTERVAL);
        idle_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // One spare byte so a truncated datagram decodes as oversized
        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE + 1];

        tokio::pin!(shutdown);
        info!("Server started successfully");

        loop {
            tokio::select! {
                received = socket.recv_from(&mut buffer) => {
                    match received {
                        Ok((len, addr)) => intake.handle_datagram(&buffer[..len], addr).await,
                        Err(e) => {
                            // One bad read must not stop the loop
                            error!("Error receiving datagram: {}", e);
                            sleep(Duration::from_millis(10)).await;
                        }
                    }
                },

                _ = idle_interval.tick(), if idle_timeout.is_some() => {
                    if let Some(timeout) = idle_timeout {
                        intake.expire_idle(timeout).await;
                    }
                },

                _ = &mut shutdown => {
                    info!("Server shutting down");
                    break;
                }
            }
        }

        // Closing the queue lets the dispatcher finish what is already queued
        drop(intake);
        match dispatcher_handle.await {
            Ok(stats) => Ok(stats),
            Err(e) => {
                error!("Dispatcher task panicked: {}", e);
                Ok(DispatchStats::default())
            }
        }
    }
}

/// Per-datagram processing state borrowed by the intake loop
struct Intake<'a> {
    directory: &'a mut SessionDirectory,
    router: &'a Router,
    wire: WireFormat,
    outbound_tx: mpsc::Sender<Delivery>,
}

impl Intake<'_> {
    async fn handle_datagram(&mut self, bytes: &[u8], addr: SocketAddr) {
        let message = match self.wire.decode(bytes) {
            Ok(message) => message,
            Err(e) => {
                warn!(
                    "Dropping datagram from {}: {}",
                    addr,
                    ChatError::MalformedMessage(e)
                );
                return;
            }
        };

        debug!(
            "Received {} from {} ({}) at {}",
            message.kind, message.sender_id, message.sender_name, addr
        );

        match self.router.route(self.directory, message, addr) {
            Ok(delivery) if delivery.is_empty() => {}
            Ok(delivery) => self.enqueue(delivery).await,
            Err(e) => warn!("Dropping message from {}: {}", addr, e),
        }
    }

    async fn expire_idle(&mut self, timeout: Duration) {
        let expired = self.directory.expire_idle(timeout);
        if expired.is_empty() {
            return;
        }

        info!("Expired {} idle session(s): {}", expired.len(), expired.join(", "));
        let roster = self.router.roster_update(self.directory);
        if !roster.is_empty() {
            self.enqueue(roster).await;
        }
    }

    /// Waits for queue space when the dispatcher is behind
    async fn enqueue(&self, delivery: Delivery) {
        if let Err(e) = self.outbound_tx.send(delivery).await {
            error!("Failed to queue delivery: {}", e);
        }
    }
}
