pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod transform;
pub mod catalog;
pub mod classify;
pub mod environment;
pub mod client;
pub mod batch;
pub mod proxy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/*

evvl: submit one prompt to several AI providers and compare the
outputs side by side.

evvl/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Provider / Modality and re-exports
│   ├── error.rs        # Crate error type
│   ├── config.rs       # Base URLs, timeouts, env api keys
│   ├── request.rs      # GenerationRequest / GenerationResult
│   ├── transform/      # aggregator slug -> native slug, tables
│   ├── catalog.rs      # raw model listings -> CatalogEntry
│   ├── classify.rs     # image vs text model predicate
│   ├── environment.rs  # desktop vs web runtime probe
│   ├── client.rs       # DispatchRouter + dispatch strategies
│   ├── batch.rs        # ordered fan-out over dataset items
│   ├── proxy.rs        # same-origin proxy routes (axum)
│   ├── providers/      # One adapter per upstream API
│   └── bin/evvl-proxy.rs
└── tests/

*/

pub use client::{DirectDispatch, Dispatcher, DispatchRouter, ProxyDispatch};
pub use error::Error;
pub use request::{GenerationRequest, GenerationResult, ImageParams};

/// Enum representing all supported providers.
/// Every table and dispatch site matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Provider
{
  // ===== CLOUD PROVIDERS =====
  /// OpenAI (GPT, DALL-E, gpt-image)
  OpenAI
  ,
  /// Anthropic (Claude models, dated identifiers)
  Anthropic
  ,
  /// OpenRouter (aggregator, slugs used as-is)
  OpenRouter
  ,
  /// Google AI Studio (Gemini, Imagen)
  Gemini
  ,
  // ===== SELF-HOSTED/LOCAL =====
  /// Ollama local server
  Ollama
  ,
  /// LM Studio local server (OpenAI-compatible)
  LmStudio
}

impl Provider
{   pub const ALL: [Provider; 6] = [
      Provider::OpenAI
    , Provider::Anthropic
    , Provider::OpenRouter
    , Provider::Gemini
    , Provider::Ollama
    , Provider::LmStudio
    ];

    /// Wire identifier, matching the serde form
    pub fn as_str(&self) -> &'static str
    {   match self
        {   Provider::OpenAI => "openai"
          , Provider::Anthropic => "anthropic"
          , Provider::OpenRouter => "openrouter"
          , Provider::Gemini => "gemini"
          , Provider::Ollama => "ollama"
          , Provider::LmStudio => "lmstudio"
        }
    }

    /// Human-readable name used in error messages
    pub fn display_name(&self) -> &'static str
    {   match self
        {   Provider::OpenAI => "OpenAI"
          , Provider::Anthropic => "Anthropic"
          , Provider::OpenRouter => "OpenRouter"
          , Provider::Gemini => "Gemini"
          , Provider::Ollama => "Ollama"
          , Provider::LmStudio => "LM Studio"
        }
    }

    /// Owner string as it appears in raw model listings.
    /// Matched literally; it does not follow the enum's casing.
    pub fn listing_name(&self) -> &'static str
    {   match self
        {   Provider::OpenAI => "OpenAI"
          , Provider::Anthropic => "Anthropic"
          , Provider::OpenRouter => "OpenRouter"
          , Provider::Gemini => "Google"
          , Provider::Ollama => "Ollama"
          , Provider::LmStudio => "LM Studio"
        }
    }

    /// Aggregator prefix segment stripped before a native call
    pub fn aggregator_prefix(&self) -> Option<&'static str>
    {   match self
        {   Provider::OpenAI => Some("openai/")
          , Provider::Anthropic => Some("anthropic/")
          , Provider::Gemini => Some("google/")
          , Provider::OpenRouter
          | Provider::Ollama
          | Provider::LmStudio => None
        }
    }

    pub fn default_api_base(&self) -> &'static str
    {   match self
        {   Provider::OpenAI => "https://api.openai.com/v1"
          , Provider::Anthropic => "https://api.anthropic.com/v1"
          , Provider::OpenRouter => "https://openrouter.ai/api/v1"
          , Provider::Gemini
              => "https://generativelanguage.googleapis.com/v1beta"
          , Provider::Ollama => "http://localhost:11434"
          , Provider::LmStudio => "http://localhost:1234/v1"
        }
    }

    /// Local providers run without an API key
    pub fn is_local(&self) -> bool
    {   matches!(self, Provider::Ollama | Provider::LmStudio)
    }

    /// Whether the provider's API can serve this modality
    pub fn supports(&self, modality: Modality) -> bool
    {   match modality
        {   Modality::Text => true
          , Modality::Image => matches!(
              self,
              Provider::OpenAI | Provider::Gemini | Provider::OpenRouter
            )
        }
    }
}

impl fmt::Display for Provider
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(self.as_str())
    }
}

impl FromStr for Provider
{   type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   Provider::ALL
          .iter()
          .copied()
          .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
          .ok_or_else(|| Error::InvalidConfiguration(
            format!("unknown provider '{}'", s)
          ))
    }
}

/// Output modality of a generation call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Modality
{   Text
  , Image
}

impl fmt::Display for Modality
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   match self
        {   Modality::Text => f.write_str("text")
          , Modality::Image => f.write_str("image")
        }
    }
}
