use crate::routing::BroadcastStrategy;
use shared::WireFormat;
use std::time::Duration;

/// Runtime settings for [`crate::network::Server`]
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listen socket binds to
    pub bind_addr: String,
    pub wire: WireFormat,
    pub broadcast: BroadcastStrategy,
    /// Capacity of the bounded outbound queue
    pub queue_capacity: usize,
    /// Sessions silent for longer than this are marked left; `None` disables
    pub idle_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            wire: WireFormat::Delimited,
            broadcast: BroadcastStrategy::Directory,
            queue_capacity: 256,
            idle_timeout: None,
        }
    }
}

impl ServerConfig {
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.wire, WireFormat::Delimited);
        assert_eq!(config.broadcast, BroadcastStrategy::Directory);
        assert!(config.queue_capacity > 0);
        assert!(config.idle_timeout.is_none());
    }

    #[test]
    fn test_with_bind_addr() {
        let config = ServerConfig::default().with_bind_addr("127.0.0.1:0");
        assert_eq!(config.bind_addr, "127.0.0.1:0");
    }
}
