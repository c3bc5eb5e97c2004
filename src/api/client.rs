use super::logging::{debug_log_enabled, log_chat_request};
use crate::config::Config;
use crate::types::{ChatRequest, TagsResponse, Turn};
use crate::util::is_local_endpoint_url;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;
#[cfg(test)]
use std::sync::Arc;
use thiserror::Error;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ApiError>> + Send>>;

const CHAT_PATH: &str = "/api/chat";
const TAGS_PATH: &str = "/api/tags";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("cannot reach model server '{url}': {source}. {hint}")]
    Unreachable {
        url: String,
        hint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to '{url}' timed out: {source}")]
    Timeout {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("'{url}' returned HTTP {status}: {detail}")]
    Status {
        url: String,
        status: u16,
        detail: String,
    },
    #[error("request to '{url}' failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("model server error: {0}")]
    Server(String),
}

#[cfg(test)]
pub trait MockStreamProducer: Send + Sync {
    fn create_mock_stream(&self, messages: &[Turn]) -> Result<ByteStream, ApiError>;

    fn mock_models(&self) -> Vec<String> {
        vec!["mock-model".to_string()]
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    #[cfg(test)]
    mock_stream_producer: Option<Arc<dyn MockStreamProducer>>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            model: config.model.clone().unwrap_or_default(),
            #[cfg(test)]
            mock_stream_producer: None,
        }
    }

    #[cfg(test)]
    pub fn new_mock(mock_producer: Arc<dyn MockStreamProducer>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "http://localhost:11434".to_string(),
            model: "mock-model".to_string(),
            mock_stream_producer: Some(mock_producer),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    /// Installed model identifiers, in the order the server lists them.
    pub async fn list_models(&self) -> Result<Vec<String>, ApiError> {
        #[cfg(test)]
        {
            if let Some(producer) = &self.mock_stream_producer {
                return Ok(producer.mock_models());
            }
        }

        let request_url = format!("{}{TAGS_PATH}", self.base_url);
        let response = self
            .http
            .get(&request_url)
            .send()
            .await
            .map_err(|error| map_request_error(error, &request_url))?;
        let response = ensure_success(response, &request_url).await?;
        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|error| map_request_error(error, &request_url))?;

        Ok(tags.models.into_iter().map(|model| model.name).collect())
    }

    pub async fn create_stream(&self, messages: &[Turn]) -> Result<ByteStream, ApiError> {
        #[cfg(test)]
        {
            if let Some(producer) = &self.mock_stream_producer {
                return producer.create_mock_stream(messages);
            }
        }

        let request_url = format!("{}{CHAT_PATH}", self.base_url);
        let payload = ChatRequest {
            model: &self.model,
            messages,
            stream: true,
        };

        if debug_log_enabled() {
            if let Ok(value) = serde_json::to_value(&payload) {
                log_chat_request(&request_url, &value);
            }
        }

        let response = self
            .http
            .post(&request_url)
            .header("content-type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|error| map_request_error(error, &request_url))?;
        let response = ensure_success(response, &request_url).await?;

        let request_url_for_stream = request_url.clone();
        let stream = response.bytes_stream().map(move |item| {
            item.map_err(|error| map_request_error(error, &request_url_for_stream))
        });
        Ok(Box::pin(stream))
    }
}

async fn ensure_success(
    response: reqwest::Response,
    request_url: &str,
) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        url: request_url.to_string(),
        status: status.as_u16(),
        detail: error_detail(&body),
    })
}

/// Prefers the server's `{"error": "..."}` message over the raw body.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("error")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

fn map_request_error(error: reqwest::Error, request_url: &str) -> ApiError {
    let url = request_url.to_string();
    if error.is_connect() {
        let hint = if is_local_endpoint_url(request_url) {
            "Start it with `ollama serve`."
        } else {
            "Check TERMAI_API_URL."
        };
        return ApiError::Unreachable {
            url,
            hint,
            source: error,
        };
    }
    if error.is_timeout() {
        return ApiError::Timeout { url, source: error };
    }
    if let Some(status) = error.status() {
        return ApiError::Status {
            url,
            status: status.as_u16(),
            detail: error.to_string(),
        };
    }
    ApiError::Request { url, source: error }
}
