use std::{fmt::Display, str::FromStr, time::Duration};

use async_openai::{
    config::{AzureConfig, Config, OpenAIConfig},
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use futures::{stream::BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::Error;

/// The flavor of chat completion API to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiType {
    /// api.openai.com, or any OpenAI compatible endpoint
    #[default]
    OpenAi,
    /// An Azure OpenAI deployment
    Azure,
}

impl FromStr for ApiType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "openai" | "open_ai" => Ok(ApiType::OpenAi),
            "azure" | "azure_ad" => Ok(ApiType::Azure),
            other => Err(Error::ParseError(format!("unknown api type '{other}'"))),
        }
    }
}

impl Display for ApiType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiType::OpenAi => write!(f, "openai"),
            ApiType::Azure => write!(f, "azure"),
        }
    }
}

/// Everything needed to reach a chat completion endpoint.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// The API key
    pub api_key: String,
    /// The API base url. Required for Azure.
    pub api_base: Option<String>,
    /// The API version. Only used by Azure.
    pub api_version: Option<String>,
    /// Which API flavor to use
    pub api_type: ApiType,
    /// The model, or the deployment name on Azure
    pub model: String,
    /// The HTTP timeout for a single completion
    pub timeout: Duration,
}

/// A chat completion client for either API flavor.
#[derive(Debug, Clone)]
pub enum ChatClient {
    /// An OpenAI (or compatible) client
    OpenAi(Client<OpenAIConfig>),
    /// An Azure OpenAI client bound to one deployment
    Azure(Client<AzureConfig>),
}

impl ChatClient {
    /// Builds a client from the given settings.
    ///
    /// ```
    /// use std::time::Duration;
    /// use txplain_common::resources::openai::{ApiType, ChatClient, ChatSettings};
    ///
    /// let settings = ChatSettings {
    ///     api_key: "your-api-key".to_string(),
    ///     api_base: None,
    ///     api_version: None,
    ///     api_type: ApiType::OpenAi,
    ///     model: "gpt-4o-mini".to_string(),
    ///     timeout: Duration::from_secs(90),
    /// };
    /// assert!(ChatClient::new(&settings).is_ok());
    /// ```
    pub fn new(settings: &ChatSettings) -> Result<Self, Error> {
        let http_client = reqwest::Client::builder().timeout(settings.timeout).build()?;

        match settings.api_type {
            ApiType::OpenAi => {
                let mut config = OpenAIConfig::new().with_api_key(&settings.api_key);
                if let Some(base) = &settings.api_base {
                    config = config.with_api_base(base);
                }
                Ok(ChatClient::OpenAi(Client::with_config(config).with_http_client(http_client)))
            }
            ApiType::Azure => {
                let base = settings.api_base.as_deref().ok_or_else(|| {
                    Error::LlmError("an api base is required for azure deployments".to_string())
                })?;
                let mut config = AzureConfig::new()
                    .with_api_base(base)
                    .with_api_key(&settings.api_key)
                    .with_deployment_id(&settings.model);
                if let Some(version) = &settings.api_version {
                    config = config.with_api_version(version);
                }
                Ok(ChatClient::Azure(Client::with_config(config).with_http_client(http_client)))
            }
        }
    }

    /// Sends `prompt` as a single user message and streams the completion back as text
    /// chunks. The completion is deterministic (temperature 0).
    pub async fn stream_chat(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<BoxStream<'static, Result<String, Error>>, Error> {
        let request = build_request(model, prompt)?;

        match self {
            ChatClient::OpenAi(client) => open_stream(client, request).await,
            ChatClient::Azure(client) => open_stream(client, request).await,
        }
    }
}

fn build_request(model: &str, prompt: &str) -> Result<CreateChatCompletionRequest, Error> {
    CreateChatCompletionRequestArgs::default()
        .model(model)
        .temperature(0.0)
        .stream(true)
        .messages(vec![ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            name: Some("user".to_string()),
            content: ChatCompletionRequestUserMessageContent::Text(prompt.to_string()),
        })])
        .build()
        .map_err(|e| {
            error!("failed to create completion request: {}", e);
            Error::LlmError(e.to_string())
        })
}

async fn open_stream<C: Config + Send + Sync + 'static>(
    client: &Client<C>,
    request: CreateChatCompletionRequest,
) -> Result<BoxStream<'static, Result<String, Error>>, Error> {
    let stream = client.chat().create_stream(request).await.map_err(|e| {
        error!("failed to create completion stream: {}", e);
        Error::LlmError(e.to_string())
    })?;
    debug!("opened completion stream .");

    Ok(stream
        .filter_map(|chunk| async move {
            match chunk {
                Ok(response) => {
                    let text: String = response
                        .choices
                        .into_iter()
                        .filter_map(|choice| choice.delta.content)
                        .collect();
                    (!text.is_empty()).then_some(Ok(text))
                }
                Err(e) => Some(Err(Error::LlmError(e.to_string()))),
            }
        })
        .boxed())
}
