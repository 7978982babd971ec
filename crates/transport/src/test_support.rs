//! Scripted transport that replays queued responses and keeps a request history.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{HttpRequest, HttpResponse, HttpTransport, TransportError};

#[derive(Debug, Default)]
pub struct RecordingTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    history: Mutex<Vec<HttpRequest>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_response(&self, response: HttpResponse) {
        self.responses.lock().await.push_back(Ok(response));
    }

    pub async fn push_json(&self, body: impl Into<String>) {
        self.push_response(HttpResponse::ok(body)).await;
    }

    pub async fn push_failure(&self, message: impl Into<String>) {
        self.responses
            .lock()
            .await
            .push_back(Err(TransportError::Other(message.into())));
    }

    /// Every request sent so far, in order.
    pub async fn requests(&self) -> Vec<HttpRequest> {
        self.history.lock().await.clone()
    }

    pub async fn pending_responses(&self) -> usize {
        self.responses.lock().await.len()
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.history.lock().await.push(request);

        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no response queued".to_string())))
    }
}
