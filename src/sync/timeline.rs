use hashbrown::HashSet;
use time::OffsetDateTime;

use crate::message::{LocalId, Message, MessageKey, RemoteMessage, ServerId};

/// The ordered local view of one channel, plus its delta cursor.
///
/// New entries are only ever appended. A confirmation takes over the slot of
/// its pending entry, edits and deletes work in place. A confirmed id is
/// never present twice.
#[derive(Debug, Default)]
pub struct Timeline {
    messages: Vec<Message>,
    confirmed: HashSet<ServerId>,
    failed: HashSet<LocalId>,
    cursor: Option<OffsetDateTime>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> + ExactSizeIterator {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub const fn cursor(&self) -> Option<OffsetDateTime> {
        self.cursor
    }

    pub fn contains(&self, id: ServerId) -> bool {
        self.confirmed.contains(&id)
    }

    pub fn position(&self, key: MessageKey) -> Option<usize> {
        self.messages.iter().position(|msg| msg.key == key)
    }

    pub fn get(&self, key: MessageKey) -> Option<&Message> {
        self.position(key).map(|pos| &self.messages[pos])
    }

    /// Whether a pending entry's send has failed and it is waiting to be dropped.
    pub fn is_failed(&self, local: LocalId) -> bool {
        self.failed.contains(&local)
    }

    /// Replaces the confirmed contents with `snapshot` and resets the cursor to `stamp`.
    ///
    /// Entries that are still pending stay, after the snapshot, so their
    /// completions keep a slot to land in.
    pub fn reset(
        &mut self,
        snapshot: impl IntoIterator<Item = RemoteMessage>,
        stamp: OffsetDateTime,
    ) {
        let pending = std::mem::take(&mut self.messages)
            .into_iter()
            .filter(Message::is_pending)
            .collect::<Vec<_>>();

        self.confirmed.clear();
        for msg in snapshot {
            if self.confirmed.insert(msg.id) {
                self.messages.push(msg.into());
            }
        }

        self.messages.extend(pending);
        self.cursor.replace(stamp);
    }

    /// Appends every message whose id is not already present.
    ///
    /// Returns how many were appended.
    pub fn merge(&mut self, delta: impl IntoIterator<Item = RemoteMessage>) -> usize {
        let before = self.messages.len();
        for msg in delta {
            if !self.confirmed.insert(msg.id) {
                log::trace!("skipping duplicate message {}", msg.id);
                continue;
            }
            self.messages.push(msg.into());
        }
        self.messages.len() - before
    }

    /// Moves the cursor forward to `stamp`, never backwards.
    pub fn advance(&mut self, stamp: OffsetDateTime) {
        match &mut self.cursor {
            Some(cursor) if *cursor >= stamp => {}
            cursor => {
                cursor.replace(stamp);
            }
        }
    }

    pub fn push_pending(&mut self, message: Message) {
        debug_assert!(message.is_pending(), "only pending messages can be pushed");
        self.messages.push(message)
    }

    /// Swaps the pending entry `local` for its confirmed form, in the same slot.
    ///
    /// If the confirmed id already arrived through a delta or a snapshot, that
    /// other copy is dropped. If the pending entry is gone the confirmed message is
    /// appended unless already present. Returns `false` only in that last
    /// case when nothing changed.
    pub fn confirm(&mut self, local: LocalId, remote: RemoteMessage) -> bool {
        self.failed.remove(&local);
        let id = remote.id;

        let Some(mut pos) = self.position(MessageKey::Pending(local)) else {
            return self.merge(std::iter::once(remote)) == 1;
        };

        if !self.confirmed.insert(id) {
            if let Some(dupe) = self.position(MessageKey::Confirmed(id)) {
                log::debug!("{local} was already delivered as {id}, dropping the other copy");
                self.messages.remove(dupe);
                if dupe < pos {
                    pos -= 1;
                }
            }
        }

        self.messages[pos] = remote.into();
        true
    }

    pub fn mark_failed(&mut self, local: LocalId) -> bool {
        self.position(MessageKey::Pending(local)).is_some() && self.failed.insert(local)
    }

    pub fn discard_pending(&mut self, local: LocalId) -> bool {
        self.failed.remove(&local);
        match self.position(MessageKey::Pending(local)) {
            Some(pos) => {
                self.messages.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn apply_edit(&mut self, id: ServerId, body: impl Into<String>) -> bool {
        let Some(pos) = self.position(MessageKey::Confirmed(id)) else { return false };
        self.messages[pos].body = body.into();
        true
    }

    pub fn remove(&mut self, id: ServerId) -> bool {
        let Some(pos) = self.position(MessageKey::Confirmed(id)) else { return false };
        self.messages.remove(pos);
        self.confirmed.remove(&id);
        true
    }
}
