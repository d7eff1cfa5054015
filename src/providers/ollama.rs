use async_trait::async_trait;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{Endpoint, ProviderAdapter, TextOutput};
use crate::catalog::RawModel;
use crate::error::Error;
use crate::request::GenerationResult;
use crate::Provider;

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest<'a>
{   model: &'a str
  , prompt: &'a str
  , stream: bool
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse
{   response: String
  , #[serde(default)]
    prompt_eval_count: Option<u64>
  , #[serde(default)]
    eval_count: Option<u64>
}

#[derive(Debug, Clone, Deserialize)]
struct TagsResponse
{   #[serde(default)]
    models: Vec<Tag>
}

#[derive(Debug, Clone, Deserialize)]
struct Tag
{   name: String
}

/// Local Ollama server, no authentication
pub struct OllamaClient
{   endpoint: Endpoint
}

impl OllamaClient
{   pub fn new(endpoint: Endpoint) -> Self
    {   debug!("Creating OllamaClient");
        OllamaClient { endpoint }
    }

    async fn generate(&self, model: &str, prompt: &str)
      -> Result<TextOutput, Error>
    {   let request = GenerateRequest { model, prompt, stream: false };
        trace!("Ollama generate for {}", model);
        let builder = self.endpoint.http_client
          .post(self.endpoint.url("api/generate"))
          .json(&request);
        let response: GenerateResponse = self.endpoint
          .send(builder, self.endpoint.timeout)
          .await?;
        let tokens = match (response.prompt_eval_count, response.eval_count)
        {   (None, None) => None
          , (p, e) => Some(p.unwrap_or(0) + e.unwrap_or(0))
        };
        Ok(TextOutput
        {   content: response.response
          , tokens
        })
    }
}

#[async_trait]
impl ProviderAdapter for OllamaClient
{   fn provider(&self) -> Provider
    {   Provider::Ollama
    }

    async fn generate_text(
      &self
    , native_model: &str
    , prompt: &str
    , _api_key: &str
    ) -> GenerationResult
    {   let started = Instant::now();
        super::text_result(started, self.generate(native_model, prompt).await)
    }

    async fn list_models(&self, _api_key: &str)
      -> Result<Vec<RawModel>, Error>
    {   let builder = self.endpoint.http_client.get(self.endpoint.url("api/tags"));
        let response: TagsResponse = self.endpoint
          .send(builder, self.endpoint.validation_timeout)
          .await?;
        Ok(response.models
          .into_iter()
          .map(|m| RawModel
          {   id: m.name
            , name: None
            , provider: Provider::Ollama.listing_name().to_string()
            , model_type: Some("chat".to_string())
          })
          .collect())
    }
}
