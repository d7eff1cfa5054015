//! Configuration for providers, timeouts and the proxy path

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_VALIDATION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PROXY_BASE: &str = "http://127.0.0.1:3000";

/// Per-provider overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig
{   /// Provider these overrides apply to
    pub provider: crate::Provider
  , /// API base URL (if custom)
    #[serde(default)]
    pub api_base: Option<String>
  , /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>
}

/// Same-origin proxy settings used on the web path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig
{   /// Origin serving the `/api/...` routes
    pub base_url: String
}

impl Default for ProxyConfig
{   fn default() -> Self
    {   ProxyConfig
        {   base_url: DEFAULT_PROXY_BASE.to_string()
        }
    }
}

/// evvl configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvvlConfig
{   /// Provider overrides
    pub providers: Vec<ProviderConfig>
  , /// Proxy endpoint
    pub proxy: ProxyConfig
  , /// Upper bound for a generation call
    pub generation_timeout_secs: u64
  , /// Upper bound for key validation / model listing
    pub validation_timeout_secs: u64
  , /// Skip the runtime probe and force an environment
    pub runtime: Option<crate::environment::RuntimeEnvironment>
}

impl Default for EvvlConfig
{   fn default() -> Self
    {   EvvlConfig
        {   providers: vec![]
          , proxy: ProxyConfig::default()
          , generation_timeout_secs: DEFAULT_GENERATION_TIMEOUT_SECS
          , validation_timeout_secs: DEFAULT_VALIDATION_TIMEOUT_SECS
          , runtime: None
        }
    }
}

impl EvvlConfig
{   /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>)
      -> Result<Self, crate::error::Error>
    {   let path = path.as_ref();
        debug!("Loading config from {}", path.display());
        let raw = std::fs::read_to_string(path).map_err(|e| {
          crate::error::Error::InvalidConfiguration(
            format!("cannot read {}: {}", path.display(), e)
          )
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, crate::error::Error>
    {   serde_json::from_str(raw).map_err(|e| {
          crate::error::Error::InvalidConfiguration(e.to_string())
        })
    }

    fn overrides(&self, provider: crate::Provider)
      -> Option<&ProviderConfig>
    {   self.providers.iter().find(|p| p.provider == provider)
    }

    /// API base for a provider, without a trailing slash
    pub fn api_base(&self, provider: crate::Provider) -> String
    {   self.overrides(provider)
          .and_then(|p| p.api_base.as_deref())
          .unwrap_or(provider.default_api_base())
          .trim_end_matches('/')
          .to_string()
    }

    pub fn generation_timeout(&self, provider: crate::Provider) -> Duration
    {   Duration::from_secs(
          self.overrides(provider)
            .and_then(|p| p.timeout_secs)
            .unwrap_or(self.generation_timeout_secs)
        )
    }

    pub fn validation_timeout(&self) -> Duration
    {   Duration::from_secs(self.validation_timeout_secs)
    }

    /// Builder-style override, mostly for pointing at local servers
    pub fn with_api_base(
      mut self
    , provider: crate::Provider
    , api_base: impl Into<String>
    ) -> Self
    {   let api_base = Some(api_base.into());
        match self.providers.iter_mut().find(|p| p.provider == provider)
        {   Some(existing) => existing.api_base = api_base
          , None => self.providers.push(ProviderConfig
            {   provider
              , api_base
              , timeout_secs: None
            })
        }
        self
    }
}

/// API keys picked up from the standard environment variables
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys
{   pub openai: Option<String>
  , pub anthropic: Option<String>
  , pub openrouter: Option<String>
  , pub gemini: Option<String>
}

impl ApiKeys
{   pub fn from_env() -> Self
    {   let read = |name: &str| {
          std::env::var(name).ok().filter(|v| !v.trim().is_empty())
        };
        ApiKeys
        {   openai: read("OPENAI_API_KEY")
          , anthropic: read("ANTHROPIC_API_KEY")
          , openrouter: read("OPENROUTER_API_KEY")
          , gemini: read("GOOGLE_API_KEY")
              .or_else(|| read("GEMINI_API_KEY"))
        }
    }

    /// Key for a provider; local providers never need one
    pub fn get(&self, provider: crate::Provider) -> Option<&str>
    {   match provider
        {   crate::Provider::OpenAI => self.openai.as_deref()
          , crate::Provider::Anthropic => self.anthropic.as_deref()
          , crate::Provider::OpenRouter => self.openrouter.as_deref()
          , crate::Provider::Gemini => self.gemini.as_deref()
          , crate::Provider::Ollama
          | crate::Provider::LmStudio => None
        }
    }
}

impl fmt::Debug for ApiKeys
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   let shown = |k: &Option<String>| k.as_ref().map(|_| "<redacted>");
        f.debug_struct("ApiKeys")
          .field("openai", &shown(&self.openai))
          .field("anthropic", &shown(&self.anthropic))
          .field("openrouter", &shown(&self.openrouter))
          .field("gemini", &shown(&self.gemini))
          .finish()
    }
}
