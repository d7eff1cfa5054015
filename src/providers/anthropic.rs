use async_trait::async_trait;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{Endpoint, ProviderAdapter, TextOutput};
use crate::catalog::RawModel;
use crate::error::Error;
use crate::request::GenerationResult;
use crate::Provider;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Clone, Serialize)]
struct MessagesRequest<'a>
{   model: &'a str
  , max_tokens: u32
  , messages: Vec<Message<'a>>
}

#[derive(Debug, Clone, Serialize)]
struct Message<'a>
{   role: &'a str
  , content: &'a str
}

#[derive(Debug, Clone, Deserialize)]
struct MessagesResponse
{   content: Vec<ContentBlock>
  , #[serde(default)]
    usage: Option<Usage>
}

#[derive(Debug, Clone, Deserialize)]
struct ContentBlock
{   #[serde(rename = "type")]
    kind: String
  , #[serde(default)]
    text: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
struct Usage
{   #[serde(default)]
    input_tokens: u64
  , #[serde(default)]
    output_tokens: u64
}

#[derive(Debug, Clone, Deserialize)]
struct ModelsResponse
{   data: Vec<ModelData>
}

#[derive(Debug, Clone, Deserialize)]
struct ModelData
{   id: String
  , #[serde(default)]
    display_name: Option<String>
}

/// Messages API client; authenticates with `x-api-key`
pub struct AnthropicClient
{   endpoint: Endpoint
}

impl AnthropicClient
{   pub fn new(endpoint: Endpoint) -> Self
    {   debug!("Creating AnthropicClient");
        AnthropicClient { endpoint }
    }

    fn headers(
      &self
    , builder: reqwest::RequestBuilder
    , api_key: &str
    ) -> reqwest::RequestBuilder
    {   builder
          .header("x-api-key", api_key)
          .header("anthropic-version", ANTHROPIC_VERSION)
    }

    async fn messages(
      &self
    , model: &str
    , prompt: &str
    , api_key: &str
    ) -> Result<TextOutput, Error>
    {   super::require_key(Provider::Anthropic, api_key)?;
        let request = MessagesRequest
        {   model
          , max_tokens: MAX_TOKENS
          , messages: vec![Message { role: "user", content: prompt }]
        };
        trace!("Anthropic request for {}", model);
        let builder = self.headers(
          self.endpoint.http_client
            .post(self.endpoint.url("messages"))
            .json(&request),
          api_key
        );
        let response: MessagesResponse = self.endpoint
          .send(builder, self.endpoint.timeout)
          .await?;

        let content = response.content
          .into_iter()
          .filter(|block| block.kind == "text")
          .filter_map(|block| block.text)
          .collect::<Vec<_>>()
          .join("");
        let tokens = response.usage.map(|u| u.input_tokens + u.output_tokens);
        Ok(TextOutput { content, tokens })
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicClient
{   fn provider(&self) -> Provider
    {   Provider::Anthropic
    }

    async fn generate_text(
      &self
    , native_model: &str
    , prompt: &str
    , api_key: &str
    ) -> GenerationResult
    {   let started = Instant::now();
        super::text_result(
          started,
          self.messages(native_model, prompt, api_key).await
        )
    }

    async fn list_models(&self, api_key: &str)
      -> Result<Vec<RawModel>, Error>
    {   super::require_key(Provider::Anthropic, api_key)?;
        let builder = self.headers(
          self.endpoint.http_client.get(self.endpoint.url("models")),
          api_key
        );
        let response: ModelsResponse = self.endpoint
          .send(builder, self.endpoint.validation_timeout)
          .await?;
        Ok(response.data
          .into_iter()
          .map(|m| RawModel
          {   id: m.id
            , name: m.display_name
            , provider: Provider::Anthropic.listing_name().to_string()
            , model_type: Some("chat".to_string())
          })
          .collect())
    }
}
