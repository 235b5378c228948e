use async_trait::async_trait;
use reqwest::{ Client as HttpClient, StatusCode };
use std::time::Duration;
use serde::Serialize;
use thiserror::Error;

use crate::models::chat::{ ChatResponse, Message };

/// Client-side bound on one round trip. Expiry aborts the in-flight request
/// only; the server keeps talking to the provider on its own.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("la solicitud excedió el tiempo límite")]
    Timeout,
    #[error("fallo de red: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("respuesta del servidor no OK: {0}")]
    Status(StatusCode),
    #[error("respuesta malformada: {0}")]
    Malformed(#[source] reqwest::Error),
}

/// One send → await → text round trip against the completion gateway.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, history: &[Message]) -> Result<String, GatewayError>;
}

pub struct HttpGateway {
    http: HttpClient,
    endpoint: String,
}

#[derive(Serialize)]
struct HistoryPayload<'a> {
    history: &'a [Message],
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        let http = HttpClient::builder()
            .build()
            .map_err(GatewayError::Transport)?;

        Ok(Self {
            http,
            endpoint: format!("{}/api/chat", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl CompletionGateway for HttpGateway {
    async fn complete(&self, history: &[Message]) -> Result<String, GatewayError> {
        let resp = self.http
            .post(&self.endpoint)
            .timeout(REQUEST_TIMEOUT)
            .json(&HistoryPayload { history })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() { GatewayError::Timeout } else { GatewayError::Transport(e) }
            })?;

        if !resp.status().is_success() {
            return Err(GatewayError::Status(resp.status()));
        }

        let body = resp.json::<ChatResponse>().await.map_err(GatewayError::Malformed)?;
        Ok(body.response)
    }
}
