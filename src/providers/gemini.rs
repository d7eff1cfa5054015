use async_trait::async_trait;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{Endpoint, ImageOutput, ProviderAdapter, TextOutput};
use crate::catalog::RawModel;
use crate::error::Error;
use crate::request::{GenerationResult, ImageParams};
use crate::Provider;

// ===== generateContent =====

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a>
{   contents: Vec<Content<'a>>
  , #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>
}

#[derive(Debug, Clone, Serialize)]
struct Content<'a>
{   role: &'a str
  , parts: Vec<Part<'a>>
}

#[derive(Debug, Clone, Serialize)]
struct Part<'a>
{   text: &'a str
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig
{   response_modalities: Vec<&'static str>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse
{   #[serde(default)]
    candidates: Vec<Candidate>
  , #[serde(default)]
    usage_metadata: Option<UsageMetadata>
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate
{   #[serde(default)]
    content: Option<CandidateContent>
}

#[derive(Debug, Clone, Deserialize)]
struct CandidateContent
{   #[serde(default)]
    parts: Vec<ResponsePart>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart
{   #[serde(default)]
    text: Option<String>
  , #[serde(default)]
    inline_data: Option<InlineData>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData
{   mime_type: String
  , data: String
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata
{   #[serde(default)]
    total_token_count: Option<u64>
}

// ===== predict (Imagen) =====

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictRequest<'a>
{   instances: Vec<PredictInstance<'a>>
  , parameters: PredictParameters
}

#[derive(Debug, Clone, Serialize)]
struct PredictInstance<'a>
{   prompt: &'a str
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters
{   sample_count: u32
}

#[derive(Debug, Clone, Deserialize)]
struct PredictResponse
{   #[serde(default)]
    predictions: Vec<Prediction>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction
{   bytes_base64_encoded: String
  , #[serde(default)]
    mime_type: Option<String>
}

// ===== listing =====

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelsResponse
{   #[serde(default)]
    models: Vec<ModelData>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelData
{   name: String
  , #[serde(default)]
    display_name: Option<String>
  , #[serde(default)]
    supported_generation_methods: Vec<String>
}

/// Google AI Studio client; the key travels as a query parameter
pub struct GeminiClient
{   endpoint: Endpoint
}

impl GeminiClient
{   pub fn new(endpoint: Endpoint) -> Self
    {   debug!("Creating GeminiClient");
        GeminiClient { endpoint }
    }

    fn model_url(&self, model: &str, method: &str) -> String
    {   let bare = model.trim_start_matches("models/");
        self.endpoint.url(&format!("models/{}:{}", bare, method))
    }

    async fn generate_content(
      &self
    , model: &str
    , prompt: &str
    , api_key: &str
    , generation_config: Option<GenerationConfig>
    ) -> Result<GenerateResponse, Error>
    {   super::require_key(Provider::Gemini, api_key)?;
        let request = GenerateRequest
        {   contents: vec![Content
            {   role: "user"
              , parts: vec![Part { text: prompt }]
            }]
          , generation_config
        };
        trace!("Gemini generateContent for {}", model);
        let builder = self.endpoint.http_client
          .post(self.model_url(model, "generateContent"))
          .query(&[("key", api_key)])
          .json(&request);
        self.endpoint.send(builder, self.endpoint.timeout).await
    }

    fn first_parts(response: GenerateResponse) -> Result<Vec<ResponsePart>, Error>
    {   response.candidates
          .into_iter()
          .next()
          .and_then(|c| c.content)
          .map(|c| c.parts)
          .ok_or_else(|| {
            Error::ParseError("Gemini returned no candidates".to_string())
          })
    }

    async fn text(
      &self
    , model: &str
    , prompt: &str
    , api_key: &str
    ) -> Result<TextOutput, Error>
    {   let response = self.generate_content(model, prompt, api_key, None).await?;
        let tokens = response.usage_metadata
          .as_ref()
          .and_then(|u| u.total_token_count);
        let content = Self::first_parts(response)?
          .into_iter()
          .filter_map(|p| p.text)
          .collect::<Vec<_>>()
          .join("");
        Ok(TextOutput { content, tokens })
    }

    async fn native_image(
      &self
    , model: &str
    , prompt: &str
    , api_key: &str
    ) -> Result<ImageOutput, Error>
    {   let config = GenerationConfig
        {   response_modalities: vec!["TEXT", "IMAGE"]
        };
        let response = self
          .generate_content(model, prompt, api_key, Some(config))
          .await?;
        let mut image_url = None;
        let mut commentary = Vec::new();
        for part in Self::first_parts(response)?
        {   if image_url.is_none()
            {   image_url = part.inline_data
                  .map(|inline| super::data_url(&inline.mime_type, &inline.data));
            }
            if let Some(text) = part.text
            {   commentary.push(text);
            }
        }
        let image_url = image_url.ok_or_else(|| {
          Error::ParseError(format!("{} returned no image", model))
        })?;
        let revised = commentary.join("");
        Ok(ImageOutput
        {   image_url
          , revised_prompt: Some(revised).filter(|t| !t.trim().is_empty())
        })
    }

    async fn imagen(
      &self
    , model: &str
    , prompt: &str
    , api_key: &str
    ) -> Result<ImageOutput, Error>
    {   super::require_key(Provider::Gemini, api_key)?;
        let request = PredictRequest
        {   instances: vec![PredictInstance { prompt }]
          , parameters: PredictParameters { sample_count: 1 }
        };
        let builder = self.endpoint.http_client
          .post(self.model_url(model, "predict"))
          .query(&[("key", api_key)])
          .json(&request);
        let response: PredictResponse = self.endpoint
          .send(builder, self.endpoint.timeout)
          .await?;
        let prediction = response.predictions.into_iter().next().ok_or_else(|| {
          Error::ParseError(format!("{} returned no image", model))
        })?;
        let mime = prediction.mime_type.as_deref().unwrap_or("image/png");
        Ok(ImageOutput
        {   image_url: super::data_url(mime, &prediction.bytes_base64_encoded)
          , revised_prompt: None
        })
    }
}

#[async_trait]
impl ProviderAdapter for GeminiClient
{   fn provider(&self) -> Provider
    {   Provider::Gemini
    }

    async fn generate_text(
      &self
    , native_model: &str
    , prompt: &str
    , api_key: &str
    ) -> GenerationResult
    {   let started = Instant::now();
        super::text_result(started, self.text(native_model, prompt, api_key).await)
    }

    // Imagen has no size/quality/style knobs on this endpoint
    async fn generate_image(
      &self
    , native_model: &str
    , prompt: &str
    , api_key: &str
    , _params: &ImageParams
    ) -> GenerationResult
    {   let started = Instant::now();
        let res = if native_model.to_ascii_lowercase().starts_with("imagen")
        {   self.imagen(native_model, prompt, api_key).await
        } else
        {   self.native_image(native_model, prompt, api_key).await
        };
        super::image_result(started, res)
    }

    async fn list_models(&self, api_key: &str)
      -> Result<Vec<RawModel>, Error>
    {   super::require_key(Provider::Gemini, api_key)?;
        let builder = self.endpoint.http_client
          .get(self.endpoint.url("models"))
          .query(&[("key", api_key)]);
        let response: ModelsResponse = self.endpoint
          .send(builder, self.endpoint.validation_timeout)
          .await?;
        Ok(response.models
          .into_iter()
          .filter(|m| {
            m.supported_generation_methods
              .iter()
              .any(|g| g == "generateContent" || g == "predict")
          })
          .map(|m| RawModel
          {   id: m.name.trim_start_matches("models/").to_string()
            , name: m.display_name
            , provider: Provider::Gemini.listing_name().to_string()
            , model_type: None
          })
          .collect())
    }
}
