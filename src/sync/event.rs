use time::OffsetDateTime;

use crate::{
    gateway::GatewayError,
    message::{LocalId, RemoteMessage, ServerId},
};

/// Something a channel view's background work changed, for the caller to react to.
#[derive(Debug)]
pub enum Event {
    Appended { count: usize },
    Confirmed { local: LocalId, id: ServerId },
    SendFailed { local: LocalId, error: GatewayError },
    RolledBack { local: LocalId },
    PollFailed { error: GatewayError },
}

pub(crate) enum Completion {
    Tick {
        epoch: u64,
    },
    Delta {
        generation: u64,
        stamp: OffsetDateTime,
        result: Result<Vec<RemoteMessage>, GatewayError>,
    },
    Sent {
        local: LocalId,
        result: Result<RemoteMessage, GatewayError>,
    },
    Expired {
        local: LocalId,
    },
}
