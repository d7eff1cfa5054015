use async_trait::async_trait;
use log::{debug, error, trace};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{Endpoint, ImageOutput, ProviderAdapter, TextOutput};
use crate::catalog::RawModel;
use crate::error::Error;
use crate::request::{GenerationResult, ImageParams};
use crate::Provider;

// ===== Message Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: String
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>
  , pub stream: bool
}

impl ChatRequest
{   pub fn user(model: &str, prompt: &str) -> Self
    {   ChatRequest
        {   model: model.to_string()
          , messages: vec![
              ChatMessage
              {   role: "user".to_string()
                , content: prompt.to_string()
              }
            ]
          , modalities: None
          , stream: false
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse
{   pub choices: Vec<Choice>
  , #[serde(default)]
    pub usage: Option<Usage>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: ResponseMessage
  , #[serde(default)]
    pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage
{   #[serde(default)]
    pub content: Option<String>
  , #[serde(default)]
    pub images: Vec<ResponseImage>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseImage
{   pub image_url: ImageUrl
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageUrl
{   pub url: String
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage
{   #[serde(default)]
    pub total_tokens: Option<u64>
}

#[derive(Debug, Clone, Serialize)]
struct ImagesRequest<'a>
{   model: &'a str
  , prompt: &'a str
  , n: u32
  , #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<&'a str>
  , #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<&'a str>
  , #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>
}

#[derive(Debug, Clone, Deserialize)]
struct ImagesResponse
{   data: Vec<ImageData>
}

#[derive(Debug, Clone, Deserialize)]
struct ImageData
{   #[serde(default)]
    url: Option<String>
  , #[serde(default)]
    b64_json: Option<String>
  , #[serde(default)]
    revised_prompt: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelsResponse
{   pub data: Vec<ModelData>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelData
{   pub id: String
  , #[serde(default)]
    pub name: Option<String>
}

// ===== Client =====

/// OpenAI-compatible chat completions client.
/// Serves OpenAI itself and LM Studio (no key, no image route).
pub struct OpenAiClient
{   endpoint: Endpoint
}

impl OpenAiClient
{   pub fn new(endpoint: Endpoint) -> Self
    {   debug!("Creating OpenAiClient for {}", endpoint.provider);
        OpenAiClient { endpoint }
    }

    fn authorized(
      &self
    , builder: reqwest::RequestBuilder
    , api_key: &str
    ) -> reqwest::RequestBuilder
    {   if api_key.is_empty()
        {   builder
        } else
        {   builder.bearer_auth(api_key)
        }
    }

    pub async fn chat_completion(
      &self
    , request: &ChatRequest
    , api_key: &str
    ) -> Result<ChatResponse, Error>
    {   super::require_key(self.endpoint.provider, api_key)?;
        trace!("{} chat request for {}", self.endpoint.provider, request.model);
        let builder = self.authorized(
          self.endpoint.http_client
            .post(self.endpoint.url("chat/completions"))
            .json(request),
          api_key
        );
        self.endpoint.send(builder, self.endpoint.timeout).await
    }

    async fn chat_text(
      &self
    , model: &str
    , prompt: &str
    , api_key: &str
    ) -> Result<TextOutput, Error>
    {   let response = self
          .chat_completion(&ChatRequest::user(model, prompt), api_key)
          .await?;
        let tokens = response.usage.as_ref().and_then(|u| u.total_tokens);
        let content = response.choices
          .into_iter()
          .next()
          .and_then(|c| c.message.content)
          .ok_or_else(|| {
            error!("No choices in response");
            Error::ParseError(format!(
              "{} response contained no message",
              self.endpoint.provider.display_name()
            ))
          })?;
        Ok(TextOutput { content, tokens })
    }

    async fn images(
      &self
    , model: &str
    , prompt: &str
    , api_key: &str
    , params: &ImageParams
    ) -> Result<ImageOutput, Error>
    {   super::require_key(self.endpoint.provider, api_key)?;
        let request = ImagesRequest
        {   model
          , prompt
          , n: 1
          , size: params.size.as_deref()
          , quality: params.quality.as_deref()
          , style: params.style.as_deref()
        };
        let builder = self.authorized(
          self.endpoint.http_client
            .post(self.endpoint.url("images/generations"))
            .json(&request),
          api_key
        );
        let response: ImagesResponse = self.endpoint
          .send(builder, self.endpoint.timeout)
          .await?;
        let first = response.data.into_iter().next().ok_or_else(|| {
          Error::ParseError("OpenAI returned no image".to_string())
        })?;
        let image_url = match (first.url, first.b64_json)
        {   (Some(url), _) => url
          , (None, Some(b64)) => super::data_url("image/png", &b64)
          , (None, None) => return Err(Error::ParseError(
              "OpenAI image had neither url nor b64_json".to_string()
            ))
        };
        Ok(ImageOutput
        {   image_url
          , revised_prompt: first.revised_prompt
        })
    }

    pub async fn fetch_models(&self, api_key: &str)
      -> Result<Vec<RawModel>, Error>
    {   super::require_key(self.endpoint.provider, api_key)?;
        let builder = self.authorized(
          self.endpoint.http_client.get(self.endpoint.url("models")),
          api_key
        );
        let response: ModelsResponse = self.endpoint
          .send(builder, self.endpoint.validation_timeout)
          .await?;
        debug!(
          "{} listed {} models",
          self.endpoint.provider, response.data.len()
        );
        let owner = self.endpoint.provider.listing_name();
        Ok(response.data
          .into_iter()
          .map(|m| RawModel
          {   id: m.id
            , name: m.name
            , provider: owner.to_string()
            , model_type: None
          })
          .collect())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiClient
{   fn provider(&self) -> Provider
    {   self.endpoint.provider
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
          self.chat_text(native_model, prompt, api_key).await
        )
    }

    async fn generate_image(
      &self
    , native_model: &str
    , prompt: &str
    , api_key: &str
    , params: &ImageParams
    ) -> GenerationResult
    {   if !self.endpoint.provider.supports(crate::Modality::Image)
        {   return Error::Unsupported
            {   provider: self.endpoint.provider
              , modality: crate::Modality::Image
            }.into();
        }
        let started = Instant::now();
        super::image_result(
          started,
          self.images(native_model, prompt, api_key, params).await
        )
    }

    async fn list_models(&self, api_key: &str)
      -> Result<Vec<RawModel>, Error>
    {   self.fetch_models(api_key).await
    }
}
