//! Unified request and result types shared by both dispatch paths

use serde::{Deserialize, Serialize};
use std::fmt;

/// Image parameters passed through to the provider untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageParams
{   #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>
}

/// One generation call. Built per run (or per dataset item) and
/// dropped once its result arrives; the key lives only here.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest
{   /// The prompt text
    pub prompt: String
  , /// Provider to use
    pub provider: crate::Provider
  , /// Model slug, aggregator form allowed
    pub model: String
  , /// Secret for the provider; empty for local providers
    #[serde(default)]
    pub api_key: String
  , /// Only read by image generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_params: Option<ImageParams>
}

impl GenerationRequest
{   pub fn new(
      provider: crate::Provider
    , model: impl Into<String>
    , prompt: impl Into<String>
    , api_key: impl Into<String>
    ) -> Self
    {   GenerationRequest
        {   prompt: prompt.into()
          , provider
          , model: model.into()
          , api_key: api_key.into()
          , image_params: None
        }
    }

    pub fn with_image_params(mut self, params: ImageParams) -> Self
    {   self.image_params = Some(params);
        self
    }
}

impl fmt::Debug for GenerationRequest
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.debug_struct("GenerationRequest")
          .field("prompt", &self.prompt)
          .field("provider", &self.provider)
          .field("model", &self.model)
          .field("api_key", &"<redacted>")
          .field("image_params", &self.image_params)
          .finish()
    }
}

/// Outcome of one generation call.
///
/// Serialized untagged so the JSON boundary carries exactly the
/// success fields or a single `error` string. Branch on
/// [`GenerationResult::is_failure`] rather than on optional fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerationResult
{   Failure
    {   error: String
    }
  , Image
    {   #[serde(rename = "imageUrl")]
        image_url: String
      , #[serde(rename = "revisedPrompt", default
              , skip_serializing_if = "Option::is_none")]
        revised_prompt: Option<String>
      , #[serde(default)]
        latency: u64
    }
  , Text
    {   content: String
      , #[serde(default, skip_serializing_if = "Option::is_none")]
        tokens: Option<u64>
      , #[serde(default)]
        latency: u64
    }
}

impl GenerationResult
{   pub fn failure(error: impl Into<String>) -> Self
    {   GenerationResult::Failure { error: error.into() }
    }

    pub fn is_failure(&self) -> bool
    {   matches!(self, GenerationResult::Failure { .. })
    }

    pub fn is_success(&self) -> bool
    {   !self.is_failure()
    }

    pub fn error(&self) -> Option<&str>
    {   match self
        {   GenerationResult::Failure { error } => Some(error)
          , _ => None
        }
    }

    /// Text content, if this is a text success
    pub fn content(&self) -> Option<&str>
    {   match self
        {   GenerationResult::Text { content, .. } => Some(content)
          , _ => None
        }
    }

    pub fn latency_ms(&self) -> Option<u64>
    {   match self
        {   GenerationResult::Text { latency, .. }
          | GenerationResult::Image { latency, .. } => Some(*latency)
          , GenerationResult::Failure { .. } => None
        }
    }
}

impl From<crate::error::Error> for GenerationResult
{   fn from(err: crate::error::Error) -> Self
    {   GenerationResult::failure(err.to_string())
    }
}

impl From<Result<GenerationResult, crate::error::Error>> for GenerationResult
{   fn from(res: Result<GenerationResult, crate::error::Error>) -> Self
    {   res.unwrap_or_else(GenerationResult::from)
    }
}

/// Body of `POST /api/models`
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelListRequest
{   pub provider: crate::Provider
  , #[serde(default)]
    pub api_key: String
}

impl fmt::Debug for ModelListRequest
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.debug_struct("ModelListRequest")
          .field("provider", &self.provider)
          .field("api_key", &"<redacted>")
          .finish()
    }
}

/// Reply of `POST /api/models`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelListResponse
{   Failure
    {   error: String
    }
  , Models
    {   models: Vec<crate::catalog::RawModel>
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::json;

    #[test]
    fn failure_serializes_to_single_error_field()
    {   let value = serde_json::to_value(
          GenerationResult::failure("boom")
        ).unwrap();
        assert_eq!(value, json!({ "error": "boom" }));
    }

    #[test]
    fn error_field_wins_when_present()
    {   let parsed: GenerationResult = serde_json::from_value(
          json!({ "error": "bad key", "content": "ignored" })
        ).unwrap();
        assert!(parsed.is_failure());
        assert_eq!(parsed.error(), Some("bad key"));
    }

    #[test]
    fn text_without_tokens_is_still_success()
    {   let parsed: GenerationResult = serde_json::from_value(
          json!({ "content": "hi", "latency": 12 })
        ).unwrap();
        assert!(parsed.is_success());
        assert_eq!(parsed.content(), Some("hi"));
        assert_eq!(parsed.latency_ms(), Some(12));
    }

    #[test]
    fn image_uses_camel_case_fields()
    {   let result = GenerationResult::Image
        {   image_url: "https://img/1.png".into()
          , revised_prompt: Some("a cat".into())
          , latency: 5
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["imageUrl"], "https://img/1.png");
        assert_eq!(value["revisedPrompt"], "a cat");
        let back: GenerationResult = serde_json::from_value(value).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn debug_never_prints_key()
    {   let req = GenerationRequest::new(
          crate::Provider::OpenAI, "gpt-4o", "hi", "sk-secret"
        );
        let shown = format!("{:?}", req);
        assert!(!shown.contains("sk-secret"));
    }

    #[test]
    fn request_uses_camel_case_key()
    {   let req: GenerationRequest = serde_json::from_value(json!({
          "prompt": "p",
          "provider": "openrouter",
          "model": "openai/gpt-4o",
          "apiKey": "k",
          "imageParams": { "size": "1024x1024" }
        })).unwrap();
        assert_eq!(req.api_key, "k");
        assert_eq!(req.provider, crate::Provider::OpenRouter);
        assert_eq!(
          req.image_params.and_then(|p| p.size).as_deref(),
          Some("1024x1024")
        );
    }
}
