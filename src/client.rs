//! Dispatch router: one call surface, two interchangeable paths.
//!
//! On the desktop path adapters are called in-process; on the web path
//! the request is posted to the same-origin proxy, which runs the very
//! same [`DirectDispatch`] server-side. Both return the same
//! [`GenerationResult`] shape.
//!
//! No cancellation: once dispatched, a call runs until it completes or
//! hits its timeout. Callers that lose interest drop the result.

use async_trait::async_trait;
use log::{debug, error, trace};
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::{CatalogEntry, RawModel};
use crate::config::{ApiKeys, EvvlConfig};
use crate::environment::RuntimeEnvironment;
use crate::error::Error;
use crate::providers::{
  AnthropicClient, Endpoint, GeminiClient, OllamaClient,
  OpenAiClient, OpenRouterClient, ProviderAdapter,
};
use crate::request::{
  GenerationRequest, GenerationResult, ModelListRequest, ModelListResponse,
};
use crate::{Modality, Provider};

/// Extra time the proxy client waits past the server-side budget, so
/// the server's own timeout message wins the race.
const PROXY_GRACE: Duration = Duration::from_secs(5);

/// Strategy behind the router
#[async_trait]
pub trait Dispatcher: Send + Sync
{   async fn generate_text(&self, request: &GenerationRequest)
      -> GenerationResult;

    async fn generate_image(&self, request: &GenerationRequest)
      -> GenerationResult;

    async fn list_models(&self, provider: Provider, api_key: &str)
      -> Result<Vec<RawModel>, Error>;
}

/// Configuration checks that run before any network call:
/// unsupported modality, then slug translation. Keys are checked by
/// whichever side holds the fallback keys.
pub fn prepare(request: &GenerationRequest, modality: Modality)
  -> Result<String, Error>
{   if !request.provider.supports(modality)
    {   return Err(Error::Unsupported
        {   provider: request.provider
          , modality
        });
    }
    crate::transform::transform(request.provider, &request.model)
}

// ===== Desktop path =====

/// Calls provider APIs directly from this process
pub struct DirectDispatch
{   openai: OpenAiClient
  , anthropic: AnthropicClient
  , openrouter: OpenRouterClient
  , gemini: GeminiClient
  , ollama: OllamaClient
  , lmstudio: OpenAiClient
  , keys: ApiKeys
}

impl DirectDispatch
{   pub fn new(config: &EvvlConfig) -> Result<Self, Error>
    {   debug!("Creating DirectDispatch");
        let endpoint = |p| Endpoint::from_config(p, config);
        Ok(DirectDispatch
        {   openai: OpenAiClient::new(endpoint(Provider::OpenAI)?)
          , anthropic: AnthropicClient::new(endpoint(Provider::Anthropic)?)
          , openrouter: OpenRouterClient::new(endpoint(Provider::OpenRouter)?)
          , gemini: GeminiClient::new(endpoint(Provider::Gemini)?)
          , ollama: OllamaClient::new(endpoint(Provider::Ollama)?)
          , lmstudio: OpenAiClient::new(endpoint(Provider::LmStudio)?)
          , keys: ApiKeys::default()
        })
    }

    /// Keys used when a request arrives with an empty `api_key`
    pub fn with_keys(mut self, keys: ApiKeys) -> Self
    {   self.keys = keys;
        self
    }

    fn key_for<'a>(&'a self, provider: Provider, given: &'a str) -> &'a str
    {   if given.trim().is_empty()
        {   self.keys.get(provider).unwrap_or(given)
        } else
        {   given
        }
    }

    /// Native slug and effective key, or the configuration error
    pub fn resolve<'a>(&'a self, request: &'a GenerationRequest, modality: Modality)
      -> Result<(String, &'a str), Error>
    {   let native = prepare(request, modality)?;
        let key = self.key_for(request.provider, &request.api_key);
        crate::providers::require_key(request.provider, key)?;
        Ok((native, key))
    }

    pub fn adapter(&self, provider: Provider) -> &dyn ProviderAdapter
    {   match provider
        {   Provider::OpenAI => &self.openai
          , Provider::Anthropic => &self.anthropic
          , Provider::OpenRouter => &self.openrouter
          , Provider::Gemini => &self.gemini
          , Provider::Ollama => &self.ollama
          , Provider::LmStudio => &self.lmstudio
        }
    }
}

#[async_trait]
impl Dispatcher for DirectDispatch
{   async fn generate_text(&self, request: &GenerationRequest)
      -> GenerationResult
    {   let (native, key) = match self.resolve(request, Modality::Text)
        {   Ok(resolved) => resolved
          , Err(e) => return e.into()
        };
        debug!("Direct text call: {} {}", request.provider, native);
        self.adapter(request.provider)
          .generate_text(&native, &request.prompt, key)
          .await
    }

    async fn generate_image(&self, request: &GenerationRequest)
      -> GenerationResult
    {   let (native, key) = match self.resolve(request, Modality::Image)
        {   Ok(resolved) => resolved
          , Err(e) => return e.into()
        };
        debug!("Direct image call: {} {}", request.provider, native);
        let params = request.image_params.clone().unwrap_or_default();
        self.adapter(request.provider)
          .generate_image(&native, &request.prompt, key, &params)
          .await
    }

    async fn list_models(&self, provider: Provider, api_key: &str)
      -> Result<Vec<RawModel>, Error>
    {   let key = self.key_for(provider, api_key);
        crate::providers::require_key(provider, key)?;
        self.adapter(provider).list_models(key).await
    }
}

// ===== Web path =====

/// Relays requests to the same-origin proxy routes
pub struct ProxyDispatch
{   http_client: reqwest::Client
  , base_url: String
  , config: EvvlConfig
}

impl ProxyDispatch
{   pub fn new(config: &EvvlConfig) -> Result<Self, Error>
    {   let http_client = reqwest::Client::builder()
          .build()
          .map_err(|e| Error::InvalidConfiguration(e.to_string()))?;
        debug!("Creating ProxyDispatch against {}", config.proxy.base_url);
        Ok(ProxyDispatch
        {   http_client
          , base_url: config.proxy.base_url.trim_end_matches('/').to_string()
          , config: config.clone()
        })
    }

    /// Same per-provider budget the server applies, plus the grace
    fn generation_budget(&self, provider: Provider) -> Duration
    {   self.config.generation_timeout(provider) + PROXY_GRACE
    }

    fn validation_budget(&self) -> Duration
    {   self.config.validation_timeout() + PROXY_GRACE
    }

    /// POST json, then read whatever JSON comes back regardless of
    /// status: the proxy always answers in the shared shape.
    async fn post<B, T>(&self, path: &str, body: &B, budget: Duration)
      -> Result<T, Error>
    where
      B: serde::Serialize + Sync
    , T: serde::de::DeserializeOwned
    {   let url = format!("{}{}", self.base_url, path);
        trace!("Proxy POST {} (budget {:?})", url, budget);
        let response = self.http_client
          .post(&url)
          .timeout(budget)
          .json(body)
          .send()
          .await
          .map_err(|e| {
            error!("Proxy HTTP error: {}", e);
            Error::from_reqwest(e, budget.as_secs())
          })?;
        let status = response.status();
        let text = response.text().await
          .map_err(|e| Error::from_reqwest(e, budget.as_secs()))?;
        serde_json::from_str(&text).map_err(|e| {
          error!("Unreadable proxy reply ({}): {}", status, e);
          Error::ApiError(format!("Proxy error ({}): {}", status.as_u16(), text.trim()))
        })
    }

    async fn relay(&self, path: &str, request: &GenerationRequest)
      -> GenerationResult
    {   let budget = self.generation_budget(request.provider);
        self.post::<_, GenerationResult>(path, request, budget).await.into()
    }
}

#[async_trait]
impl Dispatcher for ProxyDispatch
{   async fn generate_text(&self, request: &GenerationRequest)
      -> GenerationResult
    {   self.relay(crate::proxy::TEXT_PATH, request).await
    }

    async fn generate_image(&self, request: &GenerationRequest)
      -> GenerationResult
    {   self.relay(crate::proxy::IMAGE_PATH, request).await
    }

    async fn list_models(&self, provider: Provider, api_key: &str)
      -> Result<Vec<RawModel>, Error>
    {   let body = ModelListRequest
        {   provider
          , api_key: api_key.to_string()
        };
        match self.post(crate::proxy::MODELS_PATH, &body, self.validation_budget()).await?
        {   ModelListResponse::Models { models } => Ok(models)
          , ModelListResponse::Failure { error } => Err(Error::ApiError(error))
        }
    }
}

// ===== Router =====

/// Public entry point. The strategy is injected once; nothing here
/// re-reads the environment per call.
#[derive(Clone)]
pub struct DispatchRouter
{   environment: RuntimeEnvironment
  , dispatch: Arc<dyn Dispatcher>
}

impl DispatchRouter
{   pub fn new(
      environment: RuntimeEnvironment
    , dispatch: Arc<dyn Dispatcher>
    ) -> Self
    {   DispatchRouter { environment, dispatch }
    }

    /// Resolve the environment (or read the override) and wire the
    /// matching strategy. The desktop path falls back to env keys.
    pub fn from_config(config: &EvvlConfig) -> Result<Self, Error>
    {   let environment = config.runtime.unwrap_or_else(RuntimeEnvironment::detect);
        let dispatch: Arc<dyn Dispatcher> = match environment
        {   RuntimeEnvironment::Desktop => Arc::new(
              DirectDispatch::new(config)?.with_keys(ApiKeys::from_env())
            )
          , RuntimeEnvironment::Web => Arc::new(ProxyDispatch::new(config)?)
        };
        debug!("DispatchRouter using {:?} path", environment);
        Ok(DispatchRouter::new(environment, dispatch))
    }

    pub fn environment(&self) -> RuntimeEnvironment
    {   self.environment
    }

    pub async fn generate(&self, request: &GenerationRequest, modality: Modality)
      -> GenerationResult
    {   if let Err(e) = prepare(request, modality)
        {   debug!("Rejected before dispatch: {}", e);
            return e.into();
        }
        match modality
        {   Modality::Text => self.dispatch.generate_text(request).await
          , Modality::Image => self.dispatch.generate_image(request).await
        }
    }

    pub async fn generate_text(&self, request: &GenerationRequest)
      -> GenerationResult
    {   self.generate(request, Modality::Text).await
    }

    pub async fn generate_image(&self, request: &GenerationRequest)
      -> GenerationResult
    {   self.generate(request, Modality::Image).await
    }

    pub async fn list_models(&self, provider: Provider, api_key: &str)
      -> Result<Vec<RawModel>, Error>
    {   self.dispatch.list_models(provider, api_key).await
    }

    /// Listing filtered down to what can be called
    pub async fn catalog(&self, provider: Provider, api_key: &str)
      -> Result<Vec<CatalogEntry>, Error>
    {   let raw = self.list_models(provider, api_key).await?;
        Ok(crate::catalog::filter_for_provider(&raw, provider))
    }

    pub async fn validate_key(&self, provider: Provider, api_key: &str)
      -> Result<(), Error>
    {   self.list_models(provider, api_key).await.map(|_| ())
    }
}
