//! AMQP plumbing on top of `lapin`.
//!
//! [`AmqpDialer`] is what the [`Connector`](crate::Connector) retries. Once a
//! connection exists, [`Session::open`] declares the queue and registers the
//! consumer; errors from that point on are returned to the caller and are
//! not retried.

use async_trait::async_trait;
use futures_util::{stream::BoxStream, StreamExt};
use lapin::{
    acker::Acker,
    options::{
        //
        BasicAckOptions,
        BasicConsumeOptions,
        BasicNackOptions,
        BasicQosOptions,
        QueueDeclareOptions,
    },
    types::FieldTable,
    Channel,
    Connection,
    ConnectionProperties,
};
use log::info;

use crate::{
    config::AckMode,
    connector::Dial,
    relay::{Inbound, Settle},
    Error, Result,
};

pub type Deliveries = BoxStream<'static, Result<Inbound>>;

#[derive(Debug, Default, Clone, Copy)]
pub struct AmqpDialer;

#[async_trait]
impl Dial for AmqpDialer {
    type Connection = Connection;

    async fn dial(&self, url: &str) -> Result<Connection> {
        Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(|e| Error::Broker(format!("connection failed: {e}")))
    }
}

/// Broker connection and channel, owned for the lifetime of the relay.
pub struct Session {
    connection: Connection,
    channel: Channel,
}

impl Session {
    /// Opens a channel, declares `queue` and starts consuming it.
    pub async fn open(
        connection: Connection,
        queue: &str,
        ack_mode: AckMode,
    ) -> Result<(Session, Deliveries)> {
        let channel = connection
            .create_channel()
            .await
            .map_err(|e| Error::Broker(format!("failed to open channel: {e}")))?;

        let queue_opts = QueueDeclareOptions {
            passive: false,
            durable: true,
            exclusive: false,
            auto_delete: false,
            nowait: false,
        };
        let queue = channel
            .queue_declare(queue, queue_opts, FieldTable::default())
            .await
            .map_err(|e| Error::Broker(format!("failed to declare queue: {e}")))?;
        info!(
            "Declared queue {} ({} messages waiting)",
            queue.name().as_str(),
            queue.message_count()
        );

        if ack_mode == AckMode::Manual {
            channel
                .basic_qos(1, BasicQosOptions::default())
                .await
                .map_err(|e| Error::Broker(format!("failed to set prefetch: {e}")))?;
        }

        let consume_opts = BasicConsumeOptions {
            no_local: false,
            no_ack: ack_mode == AckMode::Auto,
            exclusive: false,
            nowait: false,
        };
        let consumer = channel
            .basic_consume(
                queue.name().as_str(),
                "",
                consume_opts,
                FieldTable::default(),
            )
            .await
            .map_err(|e| Error::Broker(format!("failed to register consumer: {e}")))?;

        let deliveries = consumer
            .map(move |delivery| {
                let delivery =
                    delivery.map_err(|e| Error::Broker(format!("consumer failed: {e}")))?;
                Ok(match ack_mode {
                    AckMode::Auto => Inbound::auto_acked(delivery.data),
                    AckMode::Manual => {
                        Inbound::manual(delivery.data, Box::new(AmqpSettle(delivery.acker)))
                    }
                })
            })
            .boxed();

        Ok((
            Session {
                connection,
                channel,
            },
            deliveries,
        ))
    }

    /// Closes the channel, then the connection.
    pub async fn close(self) -> Result<()> {
        self.channel
            .close(200, "Normal shutdown")
            .await
            .map_err(|e| Error::Broker(format!("failed to close channel: {e}")))?;
        self.connection
            .close(200, "Normal shutdown")
            .await
            .map_err(|e| Error::Broker(format!("failed to close connection: {e}")))?;
        info!("Broker session closed");
        Ok(())
    }
}

struct AmqpSettle(Acker);

#[async_trait]
impl Settle for AmqpSettle {
    async fn ack(&self) -> Result<()> {
        self.0
            .ack(BasicAckOptions::default())
            .await
            .map_err(|e| Error::Broker(format!("ack failed: {e}")))?;
        Ok(())
    }

    async fn reject(&self, requeue: bool) -> Result<()> {
        let opts = BasicNackOptions {
            multiple: false,
            requeue,
        };
        self.0
            .nack(opts)
            .await
            .map_err(|e| Error::Broker(format!("nack failed: {e}")))?;
        Ok(())
    }
}
