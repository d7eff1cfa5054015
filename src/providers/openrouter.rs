use async_trait::async_trait;
use log::debug;
use std::time::Instant;

use super::openai::{ChatRequest, OpenAiClient};
use super::{Endpoint, ImageOutput, ProviderAdapter};
use crate::catalog::RawModel;
use crate::error::Error;
use crate::request::{GenerationResult, ImageParams};
use crate::Provider;

/// OpenRouter speaks the OpenAI chat dialect; images come back as
/// message attachments when `modalities` asks for them.
pub struct OpenRouterClient
{   chat: OpenAiClient
}

impl OpenRouterClient
{   pub fn new(endpoint: Endpoint) -> Self
    {   debug!("Creating OpenRouterClient");
        OpenRouterClient
        {   chat: OpenAiClient::new(endpoint)
        }
    }

    async fn image_via_chat(
      &self
    , model: &str
    , prompt: &str
    , api_key: &str
    ) -> Result<ImageOutput, Error>
    {   let mut request = ChatRequest::user(model, prompt);
        request.modalities = Some(vec!["image".to_string(), "text".to_string()]);
        let response = self.chat.chat_completion(&request, api_key).await?;
        let message = response.choices
          .into_iter()
          .next()
          .map(|c| c.message)
          .ok_or_else(|| {
            Error::ParseError("OpenRouter response contained no message".to_string())
          })?;
        let image_url = message.images
          .into_iter()
          .next()
          .map(|img| img.image_url.url)
          .ok_or_else(|| {
            Error::ParseError(format!("{} returned no image", model))
          })?;
        Ok(ImageOutput
        {   image_url
          , revised_prompt: message.content.filter(|c| !c.trim().is_empty())
        })
    }
}

#[async_trait]
impl ProviderAdapter for OpenRouterClient
{   fn provider(&self) -> Provider
    {   Provider::OpenRouter
    }

    async fn generate_text(
      &self
    , native_model: &str
    , prompt: &str
    , api_key: &str
    ) -> GenerationResult
    {   self.chat.generate_text(native_model, prompt, api_key).await
    }

    // size/quality/style have no OpenRouter equivalent
    async fn generate_image(
      &self
    , native_model: &str
    , prompt: &str
    , api_key: &str
    , _params: &ImageParams
    ) -> GenerationResult
    {   let started = Instant::now();
        super::image_result(
          started,
          self.image_via_chat(native_model, prompt, api_key).await
        )
    }

    async fn list_models(&self, api_key: &str)
      -> Result<Vec<RawModel>, Error>
    {   self.chat.fetch_models(api_key).await
    }
}
