use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{
    gateway::{Gateway, GatewayError},
    message::{ChannelId, NewMessage, Sender, ServerId},
};

type Shared = Arc<dyn Gateway>;

const DEFAULT_LIMIT: usize = 100;

/// The chat endpoints, answering with `{success, ...}` envelopes.
pub fn router(gateway: Shared) -> Router {
    Router::new()
        .route("/chat/class/:channel/messages", get(list_messages))
        .route("/chat/class/:channel/send", post(send_message))
        .route(
            "/chat/message/:id",
            put(update_message).delete(delete_message),
        )
        .with_state(gateway)
}

/// A failed request, rendered as `{success: false, message}`.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    reason: String,
}

impl Failure {
    fn bad_request(reason: impl ToString) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            reason: reason.to_string(),
        }
    }
}

impl From<GatewayError> for Failure {
    fn from(err: GatewayError) -> Self {
        let status = match &err {
            GatewayError::NotFound(..) => StatusCode::NOT_FOUND,
            GatewayError::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            err => {
                log::error!("chat request failed: {err}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            reason: err.reason(),
        }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = json!({ "success": false, "message": self.reason });
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Default, serde::Deserialize)]
struct ListQuery {
    limit: Option<usize>,
    since: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct SendBody {
    message: String,
    user: Sender,
}

#[derive(Debug, serde::Deserialize)]
struct EditBody {
    message: String,
}

async fn list_messages(
    State(gateway): State<Shared>,
    Path(channel): Path<ChannelId>,
    Query(query): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, Failure> {
    let messages = match query.since.as_deref() {
        Some(since) => {
            let since = OffsetDateTime::parse(since, &Rfc3339)
                .map_err(|err| Failure::bad_request(format!("invalid 'since': {err}")))?;
            gateway.list_since(channel, since).await?
        }
        None => {
            let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
            gateway.list_recent(channel, limit).await?
        }
    };

    Ok(Json(json!({ "success": true, "messages": messages })))
}

async fn send_message(
    State(gateway): State<Shared>,
    Path(channel): Path<ChannelId>,
    Json(body): Json<SendBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), Failure> {
    let message = gateway
        .create(NewMessage {
            channel,
            body: body.message,
            sender: body.user,
        })
        .await?;

    log::debug!("class {channel}: {} sent message {}", message.user.name, message.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": message })),
    ))
}

async fn update_message(
    State(gateway): State<Shared>,
    Path(id): Path<ServerId>,
    Json(body): Json<EditBody>,
) -> Result<Json<serde_json::Value>, Failure> {
    gateway.update(id, body.message).await?;
    Ok(Json(json!({ "success": true })))
}

async fn delete_message(
    State(gateway): State<Shared>,
    Path(id): Path<ServerId>,
) -> Result<Json<serde_json::Value>, Failure> {
    gateway.delete(id).await?;
    Ok(Json(json!({ "success": true })))
}
