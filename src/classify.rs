//! Image vs. text model classification

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Modality, Provider};

/// Each pattern must cover a whole path segment, so `image` only
/// counts as a dash-delimited token of a known family.
static OPENAI_IMAGE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r"^(dall-e(-\d+)?|(chat)?gpt-image(-[a-z0-9.]+)*|gpt-\d+(\.\d+)?[a-z]?-image(-[a-z0-9.]+)*)(:[a-z0-9-]+)?$"
  ).expect("static pattern")
});

static GEMINI_IMAGE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r"^(imagen(-[a-z0-9.]+)*|gemini(-[a-z0-9.]+)*-image(-[a-z0-9.]+)*)(:[a-z0-9-]+)?$"
  ).expect("static pattern")
});

/// True when `model_id` names an image-generation model for `provider`.
/// Accepts provider prefixes and trailing path segments.
pub fn is_image_model(provider: Provider, model_id: &str) -> bool
{   let lowered = model_id.trim().to_ascii_lowercase();
    let (openai, gemini) = match provider
    {   Provider::OpenAI => (true, false)
      , Provider::Gemini => (false, true)
      , Provider::OpenRouter => (true, true)
      , Provider::Anthropic
      | Provider::Ollama
      | Provider::LmStudio => return false
    };
    lowered.split('/').any(|segment| {
      (openai && OPENAI_IMAGE.is_match(segment))
        || (gemini && GEMINI_IMAGE.is_match(segment))
    })
}

pub fn modality_of(provider: Provider, model_id: &str) -> Modality
{   if is_image_model(provider, model_id)
    {   Modality::Image
    } else
    {   Modality::Text
    }
}
