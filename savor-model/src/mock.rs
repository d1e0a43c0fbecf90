//! A scripted [`LanguageModel`] for tests and offline runs.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::{ModelError, Result};
use crate::model::LanguageModel;
use crate::turn::Turn;

/// One recorded call to [`MockLlm::complete`].
#[derive(Debug, Clone)]
pub struct MockCall {
    pub context: Vec<Turn>,
    pub prompt: String,
}

/// Replays queued replies in order.
///
/// Once the queue is exhausted the mock answers with its fallback reply, or
/// echoes the first line of the prompt when no fallback is set. Every call
/// is recorded and can be inspected with [`calls`](Self::calls).
#[derive(Debug)]
pub struct MockLlm {
    name: String,
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    fallback: Option<String>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockLlm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replies: Mutex::new(VecDeque::new()),
            fallback: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.replies.lock().unwrap_or_else(PoisonError::into_inner).push_back(Ok(text.into()));
        self
    }

    /// Queue a failing call.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.replies.lock().unwrap_or_else(PoisonError::into_inner).push_back(Err(message.into()));
        self
    }

    /// Reply used once the queue is empty.
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(text.into());
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new("mock")
    }
}

#[async_trait]
impl LanguageModel for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, context: &[Turn], prompt: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(MockCall { context: context.to_vec(), prompt: prompt.to_string() });

        let next = self.replies.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => {
                Err(ModelError::Downstream { provider: self.name.clone(), message })
            }
            None => Ok(self.fallback.clone().unwrap_or_else(|| {
                format!("[{}] {}", self.name, prompt.lines().next().unwrap_or_default())
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_queue_then_falls_back() {
        let llm = MockLlm::new("mock")
            .with_response("first")
            .with_failure("boom")
            .with_fallback("later");

        assert_eq!(llm.complete(&[], "a").await.unwrap(), "first");
        assert!(matches!(
            llm.complete(&[], "b").await.unwrap_err(),
            ModelError::Downstream { message, .. } if message == "boom"
        ));
        assert_eq!(llm.complete(&[], "c").await.unwrap(), "later");
        assert_eq!(llm.call_count(), 3);
        assert_eq!(llm.calls()[2].prompt, "c");
    }

    #[tokio::test]
    async fn echoes_first_prompt_line_without_fallback() {
        let llm = MockLlm::default();
        let reply = llm.complete(&[Turn::system("be brief")], "Where to eat?\nmore").await.unwrap();
        assert_eq!(reply, "[mock] Where to eat?");
        assert_eq!(llm.calls()[0].context.len(), 1);
    }
}
