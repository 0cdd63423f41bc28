//! Mock model client for testing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{ModelCallError, ModelClient};

/// A configurable mock response for [`MockModel`].
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Return this text as the generated response.
    Text(String),
    /// Fail the call.
    Error(ModelCallError),
}

impl MockResponse {
    pub fn text(content: impl Into<String>) -> Self {
        MockResponse::Text(content.into())
    }

    /// A well-formed initial answer with the given label.
    pub fn answer(evaluation: &str) -> Self {
        MockResponse::Text(format!(
            "{{\"question\": \"q\", \"evaluation\": \"{evaluation}\", \"reasoning\": \"mock reasoning\"}}"
        ))
    }

    pub fn unreachable() -> Self {
        MockResponse::Error(ModelCallError::Transport("connection refused".into()))
    }
}

/// A hand-rolled mock implementing [`ModelClient`] for tests.
///
/// Supports:
/// - A fixed response (used for every call), **or**
/// - A sequence of responses (one per call, falling back to the last one).
/// - Optional per-call latency.
/// - Call counting and capture of every prompt received.
pub struct MockModel {
    name: String,
    responses: Mutex<Vec<MockResponse>>,
    fallback: MockResponse,
    delay: Option<Duration>,
    call_count: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockModel {
    /// Create a mock that always returns `response`.
    pub fn new(response: MockResponse) -> Self {
        Self {
            name: "mock-model".to_string(),
            responses: Mutex::new(Vec::new()),
            fallback: response,
            delay: None,
            call_count: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that returns responses in order, repeating the last one.
    pub fn with_sequence(mut responses: Vec<MockResponse>) -> Self {
        assert!(
            !responses.is_empty(),
            "sequence must have at least one response"
        );
        // Reverse so we can pop() the next response cheaply.
        responses.reverse();
        let fallback = responses[0].clone();
        Self {
            responses: Mutex::new(responses),
            ..Self::new(fallback)
        }
    }

    /// Set simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `generate()` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every prompt received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn next_response(&self) -> MockResponse {
        let mut seq = self.responses.lock().unwrap();
        seq.pop().unwrap_or_else(|| self.fallback.clone())
    }
}

impl ModelClient for MockModel {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ModelCallError>> + Send + 'a>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let response = self.next_response();
        let delay = self.delay;

        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            match response {
                MockResponse::Text(text) => Ok(text),
                MockResponse::Error(e) => Err(e),
            }
        })
    }
}
