//! Command-line configuration for the server binary.

use clap::Parser;

use crate::mailbox::MAX_MAILBOX_CAPACITY;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;
pub const DEFAULT_MAILBOX_CAPACITY: usize = 16;

/// Server settings, parsed from the command line by the binary.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(author, version, about = "Card room session server", long_about = None)]
pub struct ServerConfig {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Capacity of the queue between connection readers and the dispatcher
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub ingress_capacity: usize,

    /// Capacity of the queue between handlers and the writer
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub egress_capacity: usize,

    /// Chat messages kept per room member before the oldest is dropped
    #[arg(long, default_value_t = DEFAULT_MAILBOX_CAPACITY)]
    pub mailbox_capacity: usize,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Channel capacities must be non-zero.
    pub fn ingress_capacity(&self) -> usize {
        self.ingress_capacity.max(1)
    }

    pub fn egress_capacity(&self) -> usize {
        self.egress_capacity.max(1)
    }

    pub fn mailbox_capacity(&self) -> usize {
        self.mailbox_capacity.clamp(1, MAX_MAILBOX_CAPACITY)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            ingress_capacity: DEFAULT_QUEUE_CAPACITY,
            egress_capacity: DEFAULT_QUEUE_CAPACITY,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}
