use time::OffsetDateTime;

use crate::message::{ChannelId, NewMessage, RemoteMessage, ServerId};

mod envelope;
pub use envelope::Envelope;

mod error;
pub use error::GatewayError;

mod http;
pub use http::HttpGateway;

mod local;
pub use local::LocalGateway;

/// The server side of a class chat, as seen by a channel view.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync + 'static {
    /// The most recent `limit` messages, oldest first.
    async fn list_recent(
        &self,
        channel: ChannelId,
        limit: usize,
    ) -> Result<Vec<RemoteMessage>, GatewayError>;

    /// Messages created strictly after `since`, oldest first.
    async fn list_since(
        &self,
        channel: ChannelId,
        since: OffsetDateTime,
    ) -> Result<Vec<RemoteMessage>, GatewayError>;

    async fn create(&self, message: NewMessage) -> Result<RemoteMessage, GatewayError>;

    async fn update(&self, id: ServerId, body: String) -> Result<(), GatewayError>;

    async fn delete(&self, id: ServerId) -> Result<(), GatewayError>;
}
