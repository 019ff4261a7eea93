use std::{fmt, num::ParseIntError, str::FromStr};

use uuid::Uuid;

macro_rules! numeric_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
            #[derive(serde::Serialize, serde::Deserialize)]
            #[serde(transparent)]
            pub struct $name(pub u64);

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    self.0.fmt(f)
                }
            }

            impl FromStr for $name {
                type Err = ParseIntError;
                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    s.trim().parse().map(Self)
                }
            }
        )*
    };
}

numeric_id! {
    /// A class chat channel.
    ChannelId,
    /// Identifier assigned by the server to a stored message.
    ServerId,
    UserId,
}

/// Temporary identity of a message that the server has not confirmed yet.
///
/// Rendered as `tmp-<uuid>`, which can never be mistaken for a [`ServerId`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LocalId(Uuid);

impl LocalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LocalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tmp-{}", self.0.simple())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Pending(LocalId),
    Confirmed(ServerId),
}

impl MessageKey {
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    pub const fn server_id(&self) -> Option<ServerId> {
        match self {
            Self::Confirmed(id) => Some(*id),
            Self::Pending(..) => None,
        }
    }

    pub const fn local_id(&self) -> Option<LocalId> {
        match self {
            Self::Pending(id) => Some(*id),
            Self::Confirmed(..) => None,
        }
    }
}

impl From<ServerId> for MessageKey {
    fn from(id: ServerId) -> Self {
        Self::Confirmed(id)
    }
}

impl From<LocalId> for MessageKey {
    fn from(id: LocalId) -> Self {
        Self::Pending(id)
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending(id) => id.fmt(f),
            Self::Confirmed(id) => id.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_ids_are_disjoint_from_server_ids() {
        let local = LocalId::new();
        let rendered = local.to_string();
        assert!(rendered.starts_with("tmp-"));
        assert!(rendered.parse::<ServerId>().is_err());
        assert_ne!(local, LocalId::new());
    }

    #[test]
    fn key_accessors() {
        let key = MessageKey::from(ServerId(7));
        assert!(!key.is_pending());
        assert_eq!(key.server_id(), Some(ServerId(7)));
        assert_eq!(key.local_id(), None);

        let local = LocalId::new();
        let key = MessageKey::from(local);
        assert!(key.is_pending());
        assert_eq!(key.local_id(), Some(local));
        assert_eq!(key.server_id(), None);
    }
}
