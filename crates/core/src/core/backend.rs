use std::time::Duration;

use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt};
use tracing::debug;
use txplain_common::resources::openai::{ApiType, ChatClient, ChatSettings};
use txplain_config::Configuration;

use crate::error::Error;

/// A stream of completion text chunks
pub type CompletionStream = BoxStream<'static, Result<String, Error>>;

/// The HTTP timeout of a single completion
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(90);

/// Anything that can complete a prompt, chunk by chunk.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Starts completing `prompt`.
    async fn stream(&self, prompt: &str) -> Result<CompletionStream, Error>;
}

/// A [CompletionBackend] talking to OpenAI or an Azure OpenAI deployment.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    client: ChatClient,
    model: String,
}

impl OpenAiBackend {
    /// Creates a backend from explicit settings.
    pub fn new(settings: &ChatSettings) -> Result<Self, Error> {
        let client = ChatClient::new(settings).map_err(|e| Error::LlmError(e.to_string()))?;
        Ok(Self { client, model: settings.model.clone() })
    }

    /// Creates a backend from the `openai_*` settings of a configuration.
    pub fn from_config(configuration: &Configuration) -> Result<Self, Error> {
        let settings = chat_settings(
            &configuration.openai_api_key,
            &configuration.openai_api_base,
            &configuration.openai_api_version,
            &configuration.openai_api_type,
            &configuration.openai_model,
        )?;
        Self::new(&settings)
    }

    /// The model, or Azure deployment, completions are requested from
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn stream(&self, prompt: &str) -> Result<CompletionStream, Error> {
        debug!("requesting completion from '{}' ({} chars) .", self.model, prompt.len());

        let stream = self
            .client
            .stream_chat(&self.model, prompt)
            .await
            .map_err(|e| Error::LlmError(e.to_string()))?;

        Ok(stream.map(|chunk| chunk.map_err(|e| Error::LlmError(e.to_string()))).boxed())
    }
}

/// Builds chat settings from raw string values, treating empty strings as absent.
pub(crate) fn chat_settings(
    api_key: &str,
    api_base: &str,
    api_version: &str,
    api_type: &str,
    model: &str,
) -> Result<ChatSettings, Error> {
    if api_key.is_empty() {
        return Err(Error::InvalidArgument(
            "no OpenAI api key given, set openai_api_key or OPENAI_CHAT_API_KEY".to_string(),
        ));
    }
    if model.is_empty() {
        return Err(Error::InvalidArgument("no model given".to_string()));
    }

    let api_type: ApiType = api_type.parse().map_err(|e| Error::InvalidArgument(format!("{e}")))?;
    let non_empty = |value: &str| (!value.is_empty()).then(|| value.to_string());

    Ok(ChatSettings {
        api_key: api_key.to_string(),
        api_base: non_empty(api_base),
        api_version: non_empty(api_version),
        api_type,
        model: model.to_string(),
        timeout: COMPLETION_TIMEOUT,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_settings() {
        let settings = chat_settings("key", "", "", "", "gpt-4o-mini").expect("valid settings");
        assert_eq!(settings.api_type, ApiType::OpenAi);
        assert_eq!(settings.api_base, None);

        let settings = chat_settings(
            "key",
            "https://example.openai.azure.com",
            "2023-05-15",
            "azure",
            "gpt-35-turbo",
        )
        .expect("valid settings");
        assert_eq!(settings.api_type, ApiType::Azure);
        assert_eq!(settings.api_version.as_deref(), Some("2023-05-15"));
    }

    #[test]
    fn test_chat_settings_require_a_key() {
        assert!(matches!(
            chat_settings("", "", "", "openai", "gpt-4o-mini"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(chat_settings("key", "", "", "bard", "gpt-4o-mini").is_err());
    }

    #[test]
    fn test_backend_from_config() {
        let configuration =
            Configuration { openai_api_key: "key".to_string(), ..Configuration::default() };
        let backend = OpenAiBackend::from_config(&configuration).expect("valid backend");
        assert_eq!(backend.model(), "gpt-4o-mini");
    }
}
