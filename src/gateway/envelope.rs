use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::GatewayError;

/// The `{success, ...}` reply of the chat endpoints, decoded to a tagged result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Envelope<T> {
    Ok(T),
    Rejected { reason: String },
}

impl<T> Envelope<T>
where
    T: DeserializeOwned,
{
    const DEFAULT_REASON: &'static str = "the request was rejected";

    /// Decodes a reply whose payload, if any, lives under `field`.
    ///
    /// A missing or non-boolean `success` counts as a rejection.
    pub fn decode(bytes: &[u8], field: Option<&str>) -> Result<Self, serde_json::Error> {
        let mut map: Map<String, Value> = serde_json::from_slice(bytes)?;

        let success = map.get("success").and_then(Value::as_bool).unwrap_or(false);
        if !success {
            let reason = ["message", "error"]
                .into_iter()
                .find_map(|key| map.get(key).and_then(Value::as_str))
                .unwrap_or(Self::DEFAULT_REASON);

            return Ok(Self::Rejected {
                reason: reason.to_string(),
            });
        }

        let payload = field
            .and_then(|field| map.remove(field))
            .unwrap_or(Value::Null);
        serde_json::from_value(payload).map(Self::Ok)
    }
}

impl<T> Envelope<T> {
    pub fn into_result(self) -> Result<T, GatewayError> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Rejected { reason } => Err(GatewayError::Rejected { reason }),
        }
    }

    pub fn rejection(self) -> Option<String> {
        match self {
            Self::Rejected { reason } => Some(reason),
            Self::Ok(..) => None,
        }
    }
}
