use time::OffsetDateTime;

use super::{ChannelId, LocalId, MessageKey, RemoteMessage, Sender, ServerId};

/// An entry of a channel's local view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub key: MessageKey,
    pub channel: ChannelId,
    pub sender: Sender,
    pub body: String,
    pub created_at: OffsetDateTime,
}

impl Message {
    pub fn pending(local: LocalId, channel: ChannelId, sender: Sender, body: String) -> Self {
        Self {
            key: MessageKey::Pending(local),
            channel,
            sender,
            body,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub const fn is_pending(&self) -> bool {
        self.key.is_pending()
    }

    pub const fn server_id(&self) -> Option<ServerId> {
        self.key.server_id()
    }
}

impl From<RemoteMessage> for Message {
    fn from(msg: RemoteMessage) -> Self {
        Self {
            key: MessageKey::Confirmed(msg.id),
            channel: msg.channel,
            sender: msg.user,
            body: msg.body,
            created_at: msg.created_at,
        }
    }
}
