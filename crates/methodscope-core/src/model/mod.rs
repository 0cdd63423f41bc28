//! Text-generation clients.

pub mod mock;
pub mod ollama;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

pub use ollama::{ModelSettings, OllamaClient};

/// Stored in place of a response when the model call itself failed.
pub const MODEL_ERROR_MARKER: &str = "Error: no response from the model";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelCallError {
    /// The request never produced an HTTP response (connect failure, timeout).
    #[error("model request failed: {0}")]
    Transport(String),
    /// The service answered with a non-success status.
    #[error("model service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The service answered 2xx but the body was not the expected JSON.
    #[error("could not decode model response: {0}")]
    Decode(String),
}

/// A service that turns a prompt into generated text.
pub trait ModelClient: Send + Sync {
    /// Model identifier, for logs and the run summary.
    fn model_name(&self) -> &str;

    /// Send `prompt` and return the raw generated text.
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ModelCallError>> + Send + 'a>>;
}
