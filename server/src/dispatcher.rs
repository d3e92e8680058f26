//! Outbound dispatcher: the single writer task behind a bounded queue
//!
//! The inbound worker pushes [`Delivery`] items; this task encodes each
//! message once and writes one datagram per destination. A full queue makes
//! the producer wait, which is the relay's only backpressure. Because there
//! is one consumer, every recipient sees messages in the order they were
//! routed.

use crate::routing::{Delivery, Destination};
use log::{debug, error, info};
use shared::WireFormat;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Running totals reported when the dispatcher drains
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub deliveries: u64,
    pub datagrams_sent: u64,
    pub send_failures: u64,
    pub encode_failures: u64,
}

pub struct Dispatcher {
    socket: Arc<UdpSocket>,
    wire: WireFormat,
    queue: mpsc::Receiver<Delivery>,
    stats: DispatchStats,
}

impl Dispatcher {
    /// Creates the dispatcher and the sending half of its bounded queue
    pub fn new(
        socket: Arc<UdpSocket>,
        wire: WireFormat,
        capacity: usize,
    ) -> (Self, mpsc::Sender<Delivery>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let dispatcher = Self {
            socket,
            wire,
            queue: rx,
            stats: DispatchStats::default(),
        };
        (dispatcher, tx)
    }

    pub fn spawn(self) -> JoinHandle<DispatchStats> {
        tokio::spawn(self.run())
    }

    /// Drains the queue until every sender is dropped
    pub async fn run(mut self) -> DispatchStats {
        while let Some(delivery) = self.queue.recv().await {
            self.deliver(delivery).await;
        }

        info!(
            "Dispatcher drained: {} deliveries, {} datagrams, {} send failures",
            self.stats.deliveries, self.stats.datagrams_sent, self.stats.send_failures
        );
        self.stats
    }

    async fn deliver(&mut self, delivery: Delivery) {
        self.stats.deliveries += 1;

        let payload = match self.wire.encode(&delivery.message) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to encode {} message: {}", delivery.message.kind, e);
                self.stats.encode_failures += 1;
                return;
            }
        };

        for destination in &delivery.destinations {
            // A failed write is logged and never holds up the remaining sends
            match self.socket.send_to(&payload, destination.addr()).await {
                Ok(_) => self.stats.datagrams_sent += 1,
                Err(e) => {
                    self.stats.send_failures += 1;
                    match destination {
                        Destination::Session { id, addr } => {
                            error!("Failed to send to client {} at {}: {}", id, addr, e)
                        }
                        Destination::Rendezvous(addr) => {
                            error!("Failed to send to rendezvous {}: {}", addr, e)
                        }
                    }
                }
            }
        }

        debug!(
            "Delivered {} from {} to {} destination(s)",
            delivery.message.kind,
            delivery.message.sender_id,
            delivery.destinations.len()
        );
    }
}
