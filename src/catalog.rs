//! Raw model listings -> callable catalog entries

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Modality, Provider};

/// Modalities no request path can call. Shared by every provider
/// and evaluated before provider rules.
static GLOBALLY_EXCLUDED: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r"(?i)(audio|speech|realtime|moderation|transcribe|whisper|tts|embedding)"
  ).expect("static pattern")
});

/// One row of a raw listing, from an aggregator directory or a
/// provider's own discovery endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawModel
{   pub id: String
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>
  , /// Owner as written by the listing, e.g. `"Google"`
    pub provider: String
  , #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType
{   Chat
  , Completion
  , Responses
  , Image
}

impl ModelType
{   fn parse(raw: &str) -> Option<Self>
    {   match raw.trim().to_ascii_lowercase().as_str()
        {   "chat" => Some(ModelType::Chat)
          , "completion" => Some(ModelType::Completion)
          , "responses" => Some(ModelType::Responses)
          , "image" => Some(ModelType::Image)
          , _ => None
        }
    }

    pub fn modality(&self) -> Modality
    {   match self
        {   ModelType::Image => Modality::Image
          , ModelType::Chat
          | ModelType::Completion
          | ModelType::Responses => Modality::Text
        }
    }
}

/// What the UI shows. `value` is passed back as the request model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry
{   pub value: String
  , pub label: String
  , #[serde(rename = "type")]
    pub model_type: ModelType
}

/// Substrings marking open-weight variants the commercial API does not serve
fn open_weight_markers(provider: Provider) -> &'static [&'static str]
{   match provider
    {   Provider::OpenAI => &["gpt-oss"]
      , Provider::Gemini => &["gemma"]
      , Provider::Anthropic
      | Provider::OpenRouter
      | Provider::Ollama
      | Provider::LmStudio => &[]
    }
}

/// Aggregator and local listings keep their breadth
fn is_permissive(provider: Provider) -> bool
{   match provider
    {   Provider::OpenRouter
      | Provider::Ollama
      | Provider::LmStudio => true
      , Provider::OpenAI
      | Provider::Anthropic
      | Provider::Gemini => false
    }
}

fn resolve_type(provider: Provider, model: &RawModel) -> Option<ModelType>
{   match model.model_type.as_deref()
    {   Some(raw) => ModelType::parse(raw)
      , None => Some(match crate::classify::modality_of(provider, &model.id)
        {   Modality::Image => ModelType::Image
          , Modality::Text => ModelType::Chat
        })
    }
}

fn is_globally_excluded(model: &RawModel) -> bool
{   GLOBALLY_EXCLUDED.is_match(&model.id)
      || model
        .model_type
        .as_deref()
        .map(|t| GLOBALLY_EXCLUDED.is_match(t))
        .unwrap_or(false)
}

fn passes_provider_rules(provider: Provider, model: &RawModel) -> bool
{   if is_permissive(provider)
    {   return true;
    }
    let id = model.id.to_ascii_lowercase();
    if open_weight_markers(provider).iter().any(|m| id.contains(m))
    {   return false;
    }
    !crate::transform::is_retired(provider, &id)
}

/// Filter a raw listing down to what `provider` can actually serve,
/// sorted by label descending so newer families come first.
pub fn filter_for_provider(raw: &[RawModel], provider: Provider) -> Vec<CatalogEntry>
{   let owner = provider.listing_name();
    let mut entries: Vec<CatalogEntry> = raw
      .iter()
      .filter(|m| m.provider == owner)
      .filter(|m| !is_globally_excluded(m))
      .filter(|m| passes_provider_rules(provider, m))
      .filter_map(|m| {
        let model_type = resolve_type(provider, m)?;
        if !provider.supports(model_type.modality())
        {   return None;
        }
        Some(CatalogEntry
        {   value: m.id.clone()
          , label: m.name.clone().unwrap_or_else(|| m.id.clone())
          , model_type
        })
      })
      .collect();
    entries.sort_by(|a, b| b.label.cmp(&a.label));
    debug!(
      "Catalog for {}: {} of {} raw models kept",
      provider, entries.len(), raw.len()
    );
    entries
}
