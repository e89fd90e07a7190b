//! Relays weather readings from an AMQP queue to the storage API.
//!
//! The [`Connector`] waits for the broker to come up, [`Session::open`]
//! declares the queue and starts a consumer, and the [`Relay`] decodes each
//! delivery and POSTs it downstream, one message at a time.

pub mod broker;
pub mod config;
pub mod connector;
mod error;
pub mod forwarder;
pub mod relay;
pub mod weather;

pub use broker::{AmqpDialer, Deliveries, Session};
pub use config::{AckMode, RelayConfig};
pub use connector::{ConnectionState, Connector, Dial};
pub use error::{Error, Result};
pub use forwarder::{Forwarder, HttpForwarder};
pub use relay::{Inbound, Outcome, Relay, Settle};
pub use weather::{WeatherReading, WeatherRecord};
