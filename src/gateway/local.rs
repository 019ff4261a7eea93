use std::sync::{Mutex, MutexGuard};

use time::OffsetDateTime;
use tokio::sync::broadcast;

use crate::{
    message::{ChannelId, NewMessage, RemoteMessage, ServerId},
    store::{Broadcaster, Connection, MessageSent},
};

use super::{Gateway, GatewayError};

/// An in-process gateway backed directly by the message store.
pub struct LocalGateway {
    conn: Mutex<Connection>,
    broadcaster: Broadcaster,
}

impl LocalGateway {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            broadcaster: Broadcaster::default(),
        }
    }

    pub fn in_memory() -> Result<Self, GatewayError> {
        Ok(Self::new(Connection::in_memory()?))
    }

    pub fn subscribe(&self, channel: ChannelId) -> broadcast::Receiver<MessageSent> {
        self.broadcaster.subscribe(channel)
    }

    /// Stores a message with an explicit creation time without broadcasting it.
    pub fn seed(
        &self,
        message: &NewMessage,
        created_at: OffsetDateTime,
    ) -> Result<RemoteMessage, GatewayError> {
        Ok(self.conn().messages().insert(message, created_at)?)
    }

    pub fn get(&self, id: ServerId) -> Result<Option<RemoteMessage>, GatewayError> {
        Ok(self.conn().messages().get(id)?)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|err| err.into_inner())
    }
}

#[async_trait::async_trait]
impl Gateway for LocalGateway {
    async fn list_recent(
        &self,
        channel: ChannelId,
        limit: usize,
    ) -> Result<Vec<RemoteMessage>, GatewayError> {
        Ok(self.conn().messages().list_recent(channel, limit)?)
    }

    async fn list_since(
        &self,
        channel: ChannelId,
        since: OffsetDateTime,
    ) -> Result<Vec<RemoteMessage>, GatewayError> {
        Ok(self.conn().messages().list_since(channel, since)?)
    }

    async fn create(&self, message: NewMessage) -> Result<RemoteMessage, GatewayError> {
        if message.body.trim().is_empty() {
            return Err(GatewayError::rejected("message cannot be empty"));
        }

        let stored = self
            .conn()
            .messages()
            .insert(&message, OffsetDateTime::now_utc())?;

        self.broadcaster.publish(MessageSent {
            channel: stored.channel,
            message: stored.clone(),
        });
        Ok(stored)
    }

    async fn update(&self, id: ServerId, body: String) -> Result<(), GatewayError> {
        if body.trim().is_empty() {
            return Err(GatewayError::rejected("message cannot be empty"));
        }

        match self.conn().messages().update_body(id, &body)? {
            true => Ok(()),
            false => Err(GatewayError::NotFound(id)),
        }
    }

    async fn delete(&self, id: ServerId) -> Result<(), GatewayError> {
        match self.conn().messages().delete(id)? {
            true => Ok(()),
            false => Err(GatewayError::NotFound(id)),
        }
    }
}
