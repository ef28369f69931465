//! LLM Provider Selection
//!
//! Builds the chat agent for the configured provider using Rig.

use rig::providers::{anthropic, openai};
use std::sync::Arc;
use tracing::info;

use super::behavior::ChatAgent;
use super::chatbot::RigChatbot;
use super::mock::MockChatbot;
use super::tools::ToolRegistry;
use crate::config::{LlmConfig, LlmProvider};
use crate::{Error, Result};

/// Map a short model name to Anthropic's API identifier.
///
/// Unrecognized names are passed through unchanged.
pub fn anthropic_model_id(model: &str) -> &str {
    match model {
        "claude-3-5-sonnet" | "claude-3-5-sonnet-20241022" => anthropic::CLAUDE_3_5_SONNET,
        "claude-3-7-sonnet" => anthropic::CLAUDE_3_7_SONNET,
        "claude-3-haiku" | "claude-3-haiku-20240307" => anthropic::CLAUDE_3_HAIKU,
        "claude-3-opus" | "claude-3-opus-20240229" => anthropic::CLAUDE_3_OPUS,
        other => other,
    }
}

fn api_key(config: &LlmConfig) -> Result<&str> {
    config
        .api_key
        .as_deref()
        .ok_or_else(|| Error::Config("no API key configured for the language model".to_string()))
}

/// Create the chat agent for `config`, wired to every tool in `registry`.
pub fn create_chat_agent(
    config: &LlmConfig,
    registry: Arc<ToolRegistry>,
) -> Result<Arc<dyn ChatAgent>> {
    info!("Using {:?} provider with model {}", config.provider, config.model);

    match config.provider {
        LlmProvider::OpenAI => {
            let client = openai::Client::new(api_key(config)?);
            let builder = RigChatbot::configure(client.agent(&config.model), config, &registry);
            Ok(Arc::new(RigChatbot::new(builder.build(), config)))
        }
        LlmProvider::Anthropic => {
            let client = anthropic::Client::new(
                api_key(config)?,
                "https://api.anthropic.com",
                None,
                anthropic::ANTHROPIC_VERSION_LATEST,
            );
            let builder = RigChatbot::configure(
                client.agent(anthropic_model_id(&config.model)),
                config,
                &registry,
            );
            Ok(Arc::new(RigChatbot::new(builder.build(), config)))
        }
        LlmProvider::Mock => Ok(Arc::new(MockChatbot::new(registry))),
    }
}
