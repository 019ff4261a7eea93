use crate::message::ServerId;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("request rejected: {reason}")]
    Rejected { reason: String },

    #[error("message {0} not found")]
    NotFound(ServerId),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn rejected(reason: impl ToString) -> Self {
        Self::Rejected {
            reason: reason.to_string(),
        }
    }

    /// The reason a user would be shown.
    pub fn reason(&self) -> String {
        match self {
            Self::Status { reason, .. } | Self::Rejected { reason } => reason.clone(),
            err => err.to_string(),
        }
    }
}
