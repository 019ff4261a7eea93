use crate::{
    gateway::GatewayError,
    message::{LocalId, ServerId},
};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("{0} has not been confirmed by the server yet")]
    NotConfirmed(LocalId),

    #[error("message {0} is not in this channel view")]
    UnknownMessage(ServerId),

    #[error("message body is empty")]
    EmptyBody,

    #[error("the channel view is closed")]
    Closed,
}
