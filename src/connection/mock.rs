//! Scripted in-memory transport for tests and examples.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::connection::auth::Credentials;
use crate::connection::Transport;
use crate::core::{Bindings, DbError, Result};

/// A [`Transport`] that records everything sent and serves scripted
/// responses in FIFO order.
///
/// With no scripted response queued, `send` answers with an empty response,
/// which decodes to zero envelopes.
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Vec<Value>>>>,
    sent: Mutex<Vec<(String, Bindings)>>,
    version: String,
    signin_failure: Option<String>,
    send_delay: Option<Duration>,
    selected: Mutex<Option<(String, String)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            version: "flexstore-mock-1.0".to_string(),
            signin_failure: None,
            send_delay: None,
            selected: Mutex::new(None),
        }
    }

    /// Queue a successful response for the next unanswered `send`.
    pub fn respond_with(&self, response: Vec<Value>) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue a failure for the next unanswered `send`.
    pub fn fail_with(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(DbError::Query(message.to_string())));
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn with_signin_failure(mut self, message: &str) -> Self {
        self.signin_failure = Some(message.to_string());
        self
    }

    /// Delay every `send`, for exercising query timeouts.
    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = Some(delay);
        self
    }

    /// Everything sent so far, in order.
    pub fn sent(&self) -> Vec<(String, Bindings)> {
        self.sent.lock().unwrap().clone()
    }

    /// The namespace/database pair selected via `use_ns`, if any.
    pub fn selected(&self) -> Option<(String, String)> {
        self.selected.lock().unwrap().clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn signin(&self, _credentials: &Credentials) -> Result<()> {
        match &self.signin_failure {
            Some(message) => Err(DbError::Connection(message.clone())),
            None => Ok(()),
        }
    }

    async fn use_ns(&self, namespace: &str, database: &str) -> Result<()> {
        *self.selected.lock().unwrap() = Some((namespace.to_string(), database.to_string()));
        Ok(())
    }

    async fn send(&self, query: &str, bindings: &Bindings) -> Result<Vec<Value>> {
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        self.sent
            .lock()
            .unwrap()
            .push((query.to_string(), bindings.clone()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn version(&self) -> Result<String> {
        Ok(self.version.clone())
    }
}
