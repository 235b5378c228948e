pub mod openai;

use async_trait::async_trait;
use std::error::Error as StdError;
use std::sync::Arc;

use crate::cli::Args;
use crate::models::chat::Message;
use self::openai::OpenAIChatClient;

/// Connection settings for the completion provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
    pub max_output_tokens: u32,
}

impl LlmConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            api_key: Some(args.chat_api_key.clone()).filter(|k| !k.is_empty()),
            completion_model: Some(args.chat_model.clone()),
            base_url: args.chat_base_url.clone(),
            max_output_tokens: args.chat_max_tokens,
        }
    }
}

/// One blocking completion call against the provider.
///
/// Returns the first choice's message content, or `None` when the provider
/// answers without a usable choice. The caller decides the fallback text.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        history: &[Message]
    ) -> Result<Option<String>, Box<dyn StdError + Send + Sync>>;
}

pub fn new_client(
    config: &LlmConfig
) -> Result<Arc<dyn ChatClient>, Box<dyn StdError + Send + Sync>> {
    let client = OpenAIChatClient::from_config(config)?;
    Ok(Arc::new(client))
}
