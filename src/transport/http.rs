use super::{Catalog, ChatRequest, ChatResponse, ChatTransport, ModelCatalog, TemplateCatalog};
use crate::core::{AetherError, ChatMessage, Role};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Thin JSON-over-HTTP client rooted at a base URL.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AetherError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, String), AetherError> {
        let url = self.url(path);
        tracing::debug!(%url, "GET");
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        Ok((status, response.text().await?))
    }

    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<(StatusCode, String), AetherError> {
        let url = self.url(path);
        tracing::debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        Ok((status, response.text().await?))
    }
}

/// Talks to a remote responder exposing `chat`, `models` and `templates`.
#[derive(Clone)]
pub struct HttpBackend {
    client: HttpClient,
}

impl HttpBackend {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, AetherError> {
        Ok(Self {
            client: HttpClient::new(endpoint)?,
        })
    }
}

#[async_trait]
impl ChatTransport for HttpBackend {
    async fn send(&self, request: &ChatRequest) -> Result<ChatMessage, AetherError> {
        let (status, body) = self.client.post("chat", request).await?;
        let reply = decode_chat_response(status, &body)?;
        if !echoes_model(&reply, &request.model) {
            tracing::warn!(
                requested = %request.model,
                replied = reply.model.as_deref().unwrap_or("<none>"),
                "reply names a different model"
            );
        }
        Ok(reply)
    }
}

#[async_trait]
impl Catalog for HttpBackend {
    async fn models(&self) -> Result<ModelCatalog, AetherError> {
        let (status, body) = self.client.get("models").await?;
        decode_json(status, &body)
    }

    async fn templates(&self) -> Result<TemplateCatalog, AetherError> {
        let (status, body) = self.client.get("templates").await?;
        decode_json(status, &body)
    }
}

/// Any non-success status or undecodable body is a failure.
pub fn decode_json<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, AetherError> {
    if !status.is_success() {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string));
        return Err(match detail {
            Some(detail) => AetherError::Api(format!("{}: {}", status, detail)),
            None => AetherError::Api(status.to_string()),
        });
    }
    serde_json::from_str(body)
        .map_err(|e| AetherError::Api(format!("Malformed response body: {}", e)))
}

pub fn decode_chat_response(status: StatusCode, body: &str) -> Result<ChatMessage, AetherError> {
    let ChatResponse { message } = decode_json(status, body)?;
    if message.role != Role::Assistant {
        return Err(AetherError::Api(format!(
            "Expected an assistant message, got {}",
            message.role
        )));
    }
    Ok(message)
}

/// Whether the reply is tagged with the model that was asked for.
pub fn echoes_model(reply: &ChatMessage, requested: &str) -> bool {
    reply.model.as_deref() == Some(requested)
}
