use time::OffsetDateTime;

use super::{ChannelId, Sender, ServerId};

/// A message as the server stores and serves it.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RemoteMessage {
    pub id: ServerId,
    #[serde(rename = "class_id")]
    pub channel: ChannelId,
    pub user: Sender,
    #[serde(rename = "message")]
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewMessage {
    pub channel: ChannelId,
    pub body: String,
    pub sender: Sender,
}
