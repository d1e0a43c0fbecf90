//! # savor-model
//!
//! Everything between a handler and the language model.
//!
//! ## Overview
//!
//! - [`LanguageModel`] is the model seam; [`MockLlm`] is a scripted
//!   implementation and `openai::OpenAIChatModel` talks to any
//!   OpenAI-compatible `/chat/completions` endpoint.
//! - [`PromptTemplate`] renders `{slot}` templates; [`assemble_context`] and
//!   [`assemble_within_budget`] join retrieved chunks for RAG prompts.
//! - [`ConversationMemory`] / [`MemoryStore`] keep a bounded window of turns
//!   per conversation.
//! - [`GenerationClient`] builds the model context and applies
//!   [`OutputConverter`]s ([`JsonConverter`], [`ListConverter`],
//!   [`MapConverter`]).
//!
//! ## Example
//!
//! ```rust,ignore
//! use savor_model::{GenerationClient, GenerationConfig, MockLlm};
//! use std::sync::Arc;
//!
//! let client = GenerationClient::new(Arc::new(MockLlm::default()))
//!     .with_config(GenerationConfig::default().with_system_instruction("Be brief."));
//! let reply = client.generate("Where should I eat tonight?", None).await?;
//! ```
//!
//! ## Features
//!
//! - `openai`: `openai::OpenAIChatModel` over `reqwest`.

pub mod error;
pub mod generation;
pub mod memory;
pub mod mock;
pub mod model;
#[cfg(feature = "openai")]
pub mod openai;
pub mod output;
pub mod prompt;
pub mod turn;

pub use error::{ModelError, Result};
pub use generation::{GenerationClient, GenerationConfig};
pub use memory::{
    ConversationMemory, DEFAULT_CONVERSATION_ID, DEFAULT_MAX_SESSIONS, DEFAULT_MAX_TURNS,
    MemoryStore, SharedMemory,
};
pub use mock::{MockCall, MockLlm};
pub use model::LanguageModel;
#[cfg(feature = "openai")]
pub use openai::{OpenAIChatModel, OpenAIConfig};
pub use output::{JsonConverter, ListConverter, MapConverter, OutputConverter, strip_code_fence};
pub use prompt::{PromptTemplate, assemble_context, assemble_within_budget, render};
pub use turn::{Role, Turn};
