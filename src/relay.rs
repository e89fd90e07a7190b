//! Consume-then-forward pipeline.
//!
//! Deliveries are handled strictly one after another: the next message is
//! not pulled from the stream until the current one has been decoded,
//! forwarded and settled. Nothing is retried by the relay itself.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use log::{error, info, warn};
use tokio::time::timeout;

use crate::{
    forwarder::Forwarder,
    weather::{WeatherReading, WeatherRecord},
    Error, Result,
};

/// Settles a delivery with the broker when acknowledgements are manual.
#[async_trait]
pub trait Settle: Send + Sync {
    async fn ack(&self) -> Result<()>;

    async fn reject(&self, requeue: bool) -> Result<()>;
}

/// One message body taken off the queue.
pub struct Inbound {
    pub body: Vec<u8>,
    settle: Option<Box<dyn Settle>>,
}

impl Inbound {
    /// A delivery the broker already considers handled.
    pub fn auto_acked(body: Vec<u8>) -> Self {
        Self { body, settle: None }
    }

    /// A delivery that has to be acked or rejected once processed.
    pub fn manual(body: Vec<u8>, settle: Box<dyn Settle>) -> Self {
        Self {
            body,
            settle: Some(settle),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The API answered 200 or 201.
    Stored(u16),
    /// The API answered with any other status.
    Rejected(u16),
    /// The body was not a valid reading and was skipped.
    Malformed,
    /// The request could not be completed.
    Failed,
}

impl Outcome {
    fn settlement(self) -> Settlement {
        match self {
            Outcome::Stored(_) => Settlement::Ack,
            Outcome::Rejected(_) | Outcome::Malformed => Settlement::Reject { requeue: false },
            Outcome::Failed => Settlement::Reject { requeue: true },
        }
    }
}

enum Settlement {
    Ack,
    Reject { requeue: bool },
}

fn is_stored(status: u16) -> bool {
    status == 200 || status == 201
}

pub struct Relay<F> {
    forwarder: F,
    api_timeout: Option<Duration>,
}

impl<F: Forwarder> Relay<F> {
    pub fn new(forwarder: F, api_timeout: Option<Duration>) -> Self {
        Self {
            forwarder,
            api_timeout,
        }
    }

    /// Processes deliveries in order until the stream ends or fails.
    pub async fn run<S>(&self, mut deliveries: S) -> Result<()>
    where
        S: Stream<Item = Result<Inbound>> + Unpin,
    {
        while let Some(delivery) = deliveries.next().await {
            let inbound = delivery?;
            let outcome = self.handle(&inbound.body).await;

            if let Some(settle) = inbound.settle {
                let settled = match outcome.settlement() {
                    Settlement::Ack => settle.ack().await,
                    Settlement::Reject { requeue } => settle.reject(requeue).await,
                };
                if let Err(e) = settled {
                    error!("❌ Could not settle message: {e}");
                }
            }
        }
        Ok(())
    }

    /// Decodes one message body and forwards it to the storage API.
    pub async fn handle(&self, body: &[u8]) -> Outcome {
        let reading = match WeatherReading::decode(body) {
            Ok(reading) => reading,
            Err(e) => {
                warn!("⚠️ Could not read JSON: {e}");
                return Outcome::Malformed;
            }
        };

        info!(
            "📥 Received: {:.1}°C. Sending to API...",
            reading.temperature
        );

        match self.forward(&WeatherRecord::from(&reading)).await {
            Ok(status) if is_stored(status) => {
                info!("🚀 Success! Reading stored via API.");
                Outcome::Stored(status)
            }
            Ok(status) => {
                warn!("⚠️ API returned error: {status}");
                Outcome::Rejected(status)
            }
            Err(e) => {
                error!("❌ Error calling API: {e}");
                Outcome::Failed
            }
        }
    }

    async fn forward(&self, record: &WeatherRecord) -> Result<u16> {
        match self.api_timeout {
            Some(limit) => timeout(limit, self.forwarder.forward(record))
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => self.forwarder.forward(record).await,
        }
    }
}
