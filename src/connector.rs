//! Startup connection loop.
//!
//! The broker is usually still booting when the relay starts, so a failed
//! dial is never fatal here: the connector keeps cycling between
//! `Connecting` and `Disconnected`, pausing for a fixed delay, until a
//! connection is established. There is no attempt cap and no backoff growth.

use std::time::Duration;

use async_trait::async_trait;
use log::{info, warn};
use tokio::time::sleep;

use crate::Result;

/// Opens a connection to the broker.
#[async_trait]
pub trait Dial: Send + Sync {
    type Connection: Send;

    async fn dial(&self, url: &str) -> Result<Self::Connection>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

pub struct Connector<D> {
    dialer: D,
    url: String,
    retry_delay: Duration,
    state: ConnectionState,
    attempts: u64,
}

impl<D: Dial> Connector<D> {
    pub fn new(dialer: D, url: &str, retry_delay: Duration) -> Self {
        Self {
            dialer,
            url: url.to_string(),
            retry_delay,
            state: ConnectionState::Disconnected,
            attempts: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Number of dial attempts made so far, successful one included.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Dials until the broker accepts the connection.
    pub async fn connect(&mut self) -> D::Connection {
        loop {
            self.state = ConnectionState::Connecting;
            self.attempts += 1;

            match self.dialer.dial(&self.url).await {
                Ok(connection) => {
                    self.state = ConnectionState::Connected;
                    info!("✅ Connected to broker (attempt {})", self.attempts);
                    return connection;
                }
                Err(e) => {
                    self.state = ConnectionState::Disconnected;
                    warn!(
                        "⏳ Broker unavailable, retrying in {:?}... (error: {e})",
                        self.retry_delay
                    );
                    sleep(self.retry_delay).await;
                }
            }
        }
    }
}
