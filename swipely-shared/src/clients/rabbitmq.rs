use lapin::{
    options::*, types::FieldTable, Channel, Connection, ConnectionProperties, Consumer,
};

use crate::types::routing_keys::DATASTORE_EXCHANGE;

/// Consumer side of the managed backend's change feed.
#[derive(Clone)]
pub struct RabbitMQClient {
    channel: Channel,
}

impl RabbitMQClient {
    pub async fn connect(url: &str) -> Result<Self, lapin::Error> {
        let conn = Connection::connect(url, ConnectionProperties::default()).await?;
        let channel = conn.create_channel().await?;

        channel
            .exchange_declare(
                DATASTORE_EXCHANGE,
                lapin::ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        tracing::info!("connected to change feed");
        Ok(Self { channel })
    }

    /// Declare a private queue bound to `patterns` and start consuming it.
    ///
    /// The queue is exclusive and auto-deleted, so it disappears with the
    /// consumer; every subscriber sees every change.
    pub async fn subscribe(&self, patterns: &[&str]) -> Result<Consumer, lapin::Error> {
        let queue = self
            .channel
            .queue_declare(
                "",
                QueueDeclareOptions {
                    exclusive: true,
                    auto_delete: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        let queue_name = queue.name().as_str().to_string();

        for pattern in patterns {
            self.channel
                .queue_bind(
                    &queue_name,
                    DATASTORE_EXCHANGE,
                    pattern,
                    QueueBindOptions::default(),
                    FieldTable::default(),
                )
                .await?;
        }

        let consumer = self
            .channel
            .basic_consume(
                &queue_name,
                &format!("{queue_name}-consumer"),
                BasicConsumeOptions {
                    no_ack: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        tracing::debug!(queue = %queue_name, bindings = ?patterns, "subscribed to change feed");

        Ok(consumer)
    }
}
