use crate::api::client::{ApiError, ByteStream, MockStreamProducer};
use crate::types::Turn;
use bytes::Bytes;
use futures::stream;
use std::sync::{Arc, Mutex};

/// Replays scripted replies; each reply is a list of raw transport chunks.
#[derive(Clone)]
pub struct MockApiClient {
    responses: Arc<Mutex<Vec<Vec<String>>>>,
    requests: Arc<Mutex<Vec<Vec<Turn>>>>,
    models: Vec<String>,
}

impl MockApiClient {
    pub fn new(responses: Vec<Vec<String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
            models: vec!["mock-model".to_string()],
        }
    }

    pub fn with_models(mut self, models: &[&str]) -> Self {
        self.models = models.iter().map(|m| m.to_string()).collect();
        self
    }

    /// Histories submitted so far, oldest first.
    pub fn requests(&self) -> Vec<Vec<Turn>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn record_line(content: &str, done: bool) -> String {
        format!(
            "{}\n",
            serde_json::json!({
                "model": "mock-model",
                "message": {"role": "assistant", "content": content},
                "done": done,
            })
        )
    }

    /// One record per token followed by the terminating `done` record.
    pub fn reply(tokens: &[&str]) -> Vec<String> {
        let mut chunks: Vec<String> = tokens
            .iter()
            .map(|token| Self::record_line(token, false))
            .collect();
        chunks.push(Self::record_line("", true));
        chunks
    }
}

impl MockStreamProducer for MockApiClient {
    fn create_mock_stream(&self, messages: &[Turn]) -> Result<ByteStream, ApiError> {
        self.requests.lock().unwrap().push(messages.to_vec());

        let mut responses_guard = self.responses.lock().unwrap();
        if responses_guard.is_empty() {
            return Err(ApiError::Server(
                "MockApiClient: No more responses configured".to_string(),
            ));
        }
        let chunks = responses_guard.remove(0);

        let byte_chunks: Vec<Result<Bytes, ApiError>> =
            chunks.into_iter().map(|s| Ok(Bytes::from(s))).collect();

        Ok(Box::pin(stream::iter(byte_chunks)))
    }

    fn mock_models(&self) -> Vec<String> {
        self.models.clone()
    }
}
