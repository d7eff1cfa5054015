//! Provider adapters: one per upstream API

pub mod anthropic;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod openrouter;

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use openrouter::OpenRouterClient;

use async_trait::async_trait;
use log::{error, trace};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};

use crate::catalog::RawModel;
use crate::config::EvvlConfig;
use crate::error::Error;
use crate::request::{GenerationResult, ImageParams};
use crate::{Modality, Provider};

/// Translates the shared contract into one provider's HTTP API.
///
/// `native_model` has already been through [`crate::transform`].
/// Implementations never return an error past this boundary for
/// generation: every failure becomes [`GenerationResult::Failure`].
#[async_trait]
pub trait ProviderAdapter: Send + Sync
{   fn provider(&self) -> Provider;

    async fn generate_text(
      &self
    , native_model: &str
    , prompt: &str
    , api_key: &str
    ) -> GenerationResult;

    async fn generate_image(
      &self
    , _native_model: &str
    , _prompt: &str
    , _api_key: &str
    , _params: &ImageParams
    ) -> GenerationResult
    {   Error::Unsupported
        {   provider: self.provider()
          , modality: Modality::Image
        }.into()
    }

    /// Provider's own discovery listing
    async fn list_models(&self, api_key: &str)
      -> Result<Vec<RawModel>, Error>;
}

/// Connection settings shared by every adapter
#[derive(Debug, Clone)]
pub struct Endpoint
{   pub provider: Provider
  , pub base: String
  , pub http_client: reqwest::Client
  , pub timeout: Duration
  , pub validation_timeout: Duration
}

impl Endpoint
{   pub fn from_config(provider: Provider, config: &EvvlConfig)
      -> Result<Self, Error>
    {   let timeout = config.generation_timeout(provider);
        let http_client = reqwest::Client::builder()
          .timeout(timeout)
          .build()
          .map_err(|e| {
            error!("Failed to build HTTP client: {}", e);
            Error::InvalidConfiguration(e.to_string())
          })?;
        Ok(Endpoint
        {   provider
          , base: config.api_base(provider)
          , http_client
          , timeout
          , validation_timeout: config.validation_timeout()
        })
    }

    pub fn url(&self, path: &str) -> String
    {   format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// Send and decode, reducing non-2xx bodies to one message
    pub async fn send<T: DeserializeOwned>(
      &self
    , request: reqwest::RequestBuilder
    , budget: Duration
    ) -> Result<T, Error>
    {   let response = request
          .timeout(budget)
          .send()
          .await
          .map_err(|e| {
            error!("{} HTTP error: {}", self.provider, e);
            Error::from_reqwest(e, budget.as_secs())
          })?;

        let status = response.status();
        trace!("{} response status: {}", self.provider, status);

        let body = response.text().await.map_err(|e| {
          Error::from_reqwest(e, budget.as_secs())
        })?;

        if !status.is_success()
        {   error!("{} API error {}: {}", self.provider, status, body);
            return Err(api_error(self.provider, status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| {
          error!("{} parse error: {}", self.provider, e);
          Error::ParseError(format!(
            "unexpected {} response: {}",
            self.provider.display_name(), e
          ))
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorEnvelope
{   Nested
    {   error: NestedError
    }
  , Flat
    {   error: String
    }
  , Message
    {   message: String
    }
}

#[derive(Deserialize)]
struct NestedError
{   message: String
}

/// Reduce any provider's error envelope to `"<Provider> API error (<status>): <msg>"`
pub fn api_error(provider: Provider, status: u16, body: &str) -> Error
{   let message = match serde_json::from_str::<ErrorEnvelope>(body)
    {   Ok(ErrorEnvelope::Nested { error }) => error.message
      , Ok(ErrorEnvelope::Flat { error }) => error
      , Ok(ErrorEnvelope::Message { message }) => message
      , Err(_) if body.trim().is_empty() => "no response body".to_string()
      , Err(_) => body.trim().to_string()
    };
    Error::ApiError(format!(
      "{} API error ({}): {}",
      provider.display_name(), status, message
    ))
}

/// Cloud providers refuse to run without a key
pub fn require_key(provider: Provider, api_key: &str) -> Result<(), Error>
{   if provider.is_local() || !api_key.trim().is_empty()
    {   Ok(())
    } else
    {   Err(Error::MissingApiKey(provider.display_name().to_string()))
    }
}

/// Successful text payload before timing is attached
#[derive(Debug, Clone)]
pub struct TextOutput
{   pub content: String
  , pub tokens: Option<u64>
}

/// Successful image payload before timing is attached
#[derive(Debug, Clone)]
pub struct ImageOutput
{   pub image_url: String
  , pub revised_prompt: Option<String>
}

fn elapsed_ms(started: Instant) -> u64
{   started.elapsed().as_millis() as u64
}

pub fn text_result(started: Instant, res: Result<TextOutput, Error>)
  -> GenerationResult
{   match res
    {   Ok(out) => GenerationResult::Text
        {   content: out.content
          , tokens: out.tokens
          , latency: elapsed_ms(started)
        }
      , Err(e) => e.into()
    }
}

pub fn image_result(started: Instant, res: Result<ImageOutput, Error>)
  -> GenerationResult
{   match res
    {   Ok(out) => GenerationResult::Image
        {   image_url: out.image_url
          , revised_prompt: out.revised_prompt
          , latency: elapsed_ms(started)
        }
      , Err(e) => e.into()
    }
}

/// Inline base64 image data as a URL the UI can render directly
pub fn data_url(mime_type: &str, b64: &str) -> String
{   format!("data:{};base64,{}", mime_type, b64)
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn nested_envelope()
    {   let err = api_error(
          Provider::OpenAI, 401,
          r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#
        );
        assert_eq!(
          err.to_string(),
          "OpenAI API error (401): Incorrect API key provided"
        );
    }

    #[test]
    fn anthropic_envelope()
    {   let err = api_error(
          Provider::Anthropic, 404,
          r#"{"type":"error","error":{"type":"not_found_error","message":"model: claude-x"}}"#
        );
        assert_eq!(err.to_string(), "Anthropic API error (404): model: claude-x");
    }

    #[test]
    fn flat_envelope_and_raw_text()
    {   assert_eq!(
          api_error(Provider::Ollama, 404, r#"{"error":"model not found"}"#).to_string(),
          "Ollama API error (404): model not found"
        );
        assert_eq!(
          api_error(Provider::Gemini, 503, "upstream overloaded").to_string(),
          "Gemini API error (503): upstream overloaded"
        );
    }

    #[test]
    fn local_providers_need_no_key()
    {   assert!(require_key(Provider::Ollama, "").is_ok());
        assert!(matches!(
          require_key(Provider::OpenAI, " "),
          Err(Error::MissingApiKey(_))
        ));
    }
}
