//! The generation client: system instruction + memory + prompt -> reply.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use tracing::{error, info};

use crate::error::Result;
use crate::memory::ConversationMemory;
use crate::model::LanguageModel;
use crate::output::{JsonConverter, OutputConverter};
use crate::turn::Turn;

/// Settings applied to every call made through a [`GenerationClient`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationConfig {
    /// Placed first in every model context when set.
    pub system_instruction: Option<String>,
}

impl GenerationConfig {
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}

/// Wraps a [`LanguageModel`] with a default system instruction, optional
/// conversation memory and output conversion.
#[derive(Clone)]
pub struct GenerationClient {
    model: Arc<dyn LanguageModel>,
    config: GenerationConfig,
}

impl GenerationClient {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model, config: GenerationConfig::default() }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// Generate a reply under the configured system instruction.
    ///
    /// With `memory`, prior turns are placed between the system instruction
    /// and the prompt, and the new user/assistant pair is appended once the
    /// model has answered. A failed call leaves `memory` untouched.
    pub async fn generate(
        &self,
        prompt: &str,
        memory: Option<&mut ConversationMemory>,
    ) -> Result<String> {
        self.complete(self.config.system_instruction.as_deref(), prompt, memory).await
    }

    /// [`generate`](Self::generate) with `instruction` in place of the
    /// configured system instruction for this call only.
    pub async fn generate_with_instruction(
        &self,
        instruction: &str,
        prompt: &str,
        memory: Option<&mut ConversationMemory>,
    ) -> Result<String> {
        self.complete(Some(instruction), prompt, memory).await
    }

    /// Append the converter's format instructions, generate, and convert the reply.
    pub async fn generate_with_converter<C>(&self, prompt: &str, converter: &C) -> Result<C::Output>
    where
        C: OutputConverter,
    {
        let prompt = format!("{prompt}\n\n{}", converter.format_instructions());
        let reply = self.generate(&prompt, None).await?;
        converter.convert(&reply).map_err(|e| {
            error!(model = %self.model.name(), error = %e, "model output did not convert");
            e
        })
    }

    /// Generate a `T`, instructing the model with `T`'s JSON schema.
    pub async fn generate_structured<T>(&self, prompt: &str) -> Result<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        self.generate_with_converter(prompt, &JsonConverter::<T>::new()).await
    }

    async fn complete(
        &self,
        instruction: Option<&str>,
        prompt: &str,
        memory: Option<&mut ConversationMemory>,
    ) -> Result<String> {
        let mut context = Vec::new();
        if let Some(instruction) = instruction {
            context.push(Turn::system(instruction));
        }
        if let Some(memory) = memory.as_deref() {
            context.extend(memory.window().iter().cloned());
        }

        let reply = self.model.complete(&context, prompt).await.map_err(|e| {
            error!(model = %self.model.name(), error = %e, "generation failed");
            e
        })?;

        if let Some(memory) = memory {
            memory.append(Turn::user(prompt));
            memory.append(Turn::assistant(reply.clone()));
        }
        info!(
            model = %self.model.name(),
            prompt_len = prompt.len(),
            reply_len = reply.len(),
            context_turns = context.len(),
            "generation completed"
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::mock::MockLlm;
    use crate::turn::Role;

    fn client(llm: MockLlm) -> (GenerationClient, Arc<MockLlm>) {
        let llm = Arc::new(llm);
        let client = GenerationClient::new(llm.clone()).with_config(
            GenerationConfig::default().with_system_instruction("You recommend restaurants."),
        );
        (client, llm)
    }

    #[tokio::test]
    async fn context_is_system_then_memory_then_prompt() {
        let (client, llm) = client(MockLlm::default().with_response("a1").with_response("a2"));
        let mut memory = ConversationMemory::new(10);

        client.generate("q1", Some(&mut memory)).await.unwrap();
        client.generate("q2", Some(&mut memory)).await.unwrap();

        let second = &llm.calls()[1];
        let roles: Vec<Role> = second.context.iter().map(|t| t.role).collect();
        assert_eq!(roles, [Role::System, Role::User, Role::Assistant]);
        assert_eq!(second.context[1].text, "q1");
        assert_eq!(second.prompt, "q2");
        assert_eq!(memory.len(), 4);
    }

    #[tokio::test]
    async fn failed_generation_leaves_memory_unchanged() {
        let (client, _) = client(MockLlm::default().with_response("ok").with_failure("timeout"));
        let mut memory = ConversationMemory::new(10);
        client.generate("first", Some(&mut memory)).await.unwrap();
        let before: Vec<String> = memory.window().iter().map(|t| t.text.clone()).collect();

        let err = client.generate("second", Some(&mut memory)).await.unwrap_err();
        assert!(matches!(err, ModelError::Downstream { .. }));
        let after: Vec<String> = memory.window().iter().map(|t| t.text.clone()).collect();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn instruction_override_replaces_system_turn() {
        let (client, llm) = client(MockLlm::default());
        client.generate_with_instruction("Answer in English.", "hi", None).await.unwrap();
        let call = &llm.calls()[0];
        assert_eq!(call.context.len(), 1);
        assert_eq!(call.context[0].text, "Answer in English.");
    }

    #[tokio::test]
    async fn converter_instructions_follow_the_prompt() {
        let (client, llm) = client(MockLlm::default().with_response("a, b"));
        let items = client
            .generate_with_converter("List dishes", &crate::output::ListConverter)
            .await
            .unwrap();
        assert_eq!(items, ["a", "b"]);
        assert!(llm.calls()[0].prompt.starts_with("List dishes\n\n"));
        assert!(llm.calls()[0].prompt.contains("comma-separated"));
    }

    #[tokio::test]
    async fn unparseable_structured_reply_is_a_parse_error() {
        let (client, _) = client(MockLlm::default().with_response("sorry, no JSON today"));
        let err = client.generate_structured::<Vec<String>>("dishes").await.unwrap_err();
        assert!(matches!(err, ModelError::Parse(_)));
    }
}
