use std::sync::Mutex;

use hashbrown::HashMap;
use tokio::sync::broadcast;

use crate::message::{ChannelId, RemoteMessage};

#[derive(Clone, Debug)]
pub struct MessageSent {
    pub channel: ChannelId,
    pub message: RemoteMessage,
}

impl MessageSent {
    pub const NAME: &str = "message.sent";
}

/// Per-channel fan-out of [`MessageSent`] events.
pub struct Broadcaster {
    channels: Mutex<HashMap<ChannelId, broadcast::Sender<MessageSent>>>,
    capacity: usize,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

impl Broadcaster {
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity cannot be zero");
        Self {
            channels: Mutex::default(),
            capacity,
        }
    }

    pub fn subscribe(&self, channel: ChannelId) -> broadcast::Receiver<MessageSent> {
        let mut channels = self.channels.lock().unwrap_or_else(|err| err.into_inner());
        channels
            .entry(channel)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Returns how many subscribers saw the event.
    pub fn publish(&self, event: MessageSent) -> usize {
        let mut channels = self.channels.lock().unwrap_or_else(|err| err.into_inner());
        let channel = event.channel;
        let Some(sender) = channels.get(&channel) else { return 0 };

        match sender.send(event) {
            Ok(seen) => {
                log::debug!("{} on channel {channel}: {seen} subscriber(s)", MessageSent::NAME);
                seen
            }
            Err(..) => {
                channels.remove(&channel);
                0
            }
        }
    }
}
