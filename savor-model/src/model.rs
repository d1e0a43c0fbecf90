//! The language model seam.

use async_trait::async_trait;

use crate::error::Result;
use crate::turn::Turn;

/// A chat-style language model.
///
/// `context` holds the system instruction and prior turns in chronological
/// order; `prompt` is the new user message. Implementations return the
/// assistant's reply text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// The model identifier, used in logs and error messages.
    fn name(&self) -> &str;

    /// Produce a reply to `prompt` given `context`.
    async fn complete(&self, context: &[Turn], prompt: &str) -> Result<String>;
}
