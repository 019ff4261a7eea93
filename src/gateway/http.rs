use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName};
use serde::de::DeserializeOwned;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use url::Url;

use crate::{
    config::ClientConfig,
    message::{ChannelId, NewMessage, RemoteMessage, Sender, ServerId},
};

use super::{Envelope, Gateway, GatewayError};

/// Talks to the chat endpoints of the learning platform over HTTP.
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base: Url,
    token: Option<Arc<str>>,
}

impl HttpGateway {
    pub fn create(config: &ClientConfig) -> anyhow::Result<Self> {
        let mut base = Url::parse(&config.base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let headers: HeaderMap = [
            ("user-agent", crate::USER_AGENT),
            ("accept", "application/json"),
        ]
        .into_iter()
        .map(|(k, v)| {
            (
                HeaderName::from_static(k),
                v.parse().expect("valid header value"),
            )
        })
        .collect();

        let client = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base,
            token: config.token.as_deref().map(Arc::from),
        })
    }

    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        self.base
            .join(path)
            .map_err(|err| GatewayError::rejected(format!("invalid endpoint '{path}': {err}")))
    }

    async fn get_response<T>(
        &self,
        req: reqwest::RequestBuilder,
        field: Option<&str>,
    ) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
    {
        let req = match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };

        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            let reason = <Envelope<serde_json::Value>>::decode(&body, None)
                .ok()
                .and_then(Envelope::rejection)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unexpected status")
                        .to_string()
                });

            log::debug!("chat endpoint returned {status}: {reason}");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                reason,
            });
        }

        <Envelope<T>>::decode(&body, field)?.into_result()
    }
}

#[derive(serde::Serialize)]
struct SendBody<'a> {
    message: &'a str,
    user: &'a Sender,
}

#[derive(serde::Serialize)]
struct EditBody<'a> {
    message: &'a str,
}

#[async_trait::async_trait]
impl Gateway for HttpGateway {
    async fn list_recent(
        &self,
        channel: ChannelId,
        limit: usize,
    ) -> Result<Vec<RemoteMessage>, GatewayError> {
        let url = self.endpoint(&format!("chat/class/{channel}/messages"))?;
        let req = self.client.get(url).query(&[("limit", limit)]);
        self.get_response(req, Some("messages")).await
    }

    async fn list_since(
        &self,
        channel: ChannelId,
        since: OffsetDateTime,
    ) -> Result<Vec<RemoteMessage>, GatewayError> {
        let since = since
            .format(&Rfc3339)
            .map_err(|err| GatewayError::rejected(format!("cannot format cursor: {err}")))?;

        let url = self.endpoint(&format!("chat/class/{channel}/messages"))?;
        let req = self.client.get(url).query(&[("since", since)]);
        self.get_response(req, Some("messages")).await
    }

    async fn create(&self, message: NewMessage) -> Result<RemoteMessage, GatewayError> {
        let url = self.endpoint(&format!("chat/class/{}/send", message.channel))?;
        let req = self.client.post(url).json(&SendBody {
            message: &message.body,
            user: &message.sender,
        });
        self.get_response(req, Some("message")).await
    }

    async fn update(&self, id: ServerId, body: String) -> Result<(), GatewayError> {
        let url = self.endpoint(&format!("chat/message/{id}"))?;
        let req = self.client.put(url).json(&EditBody { message: &body });
        self.get_response(req, None).await
    }

    async fn delete(&self, id: ServerId) -> Result<(), GatewayError> {
        let url = self.endpoint(&format!("chat/message/{id}"))?;
        self.get_response(self.client.delete(url), None).await
    }
}
