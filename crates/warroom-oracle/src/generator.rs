use crate::error::Result;
use std::future::Future;

/// The one thing the backend can do: turn a prompt into text, or fail.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

