//! Same-origin proxy routes for the web path.
//!
//! Each route runs [`DirectDispatch`] server-side and answers with the
//! success payload or `{ "error": string }`. Request keys are used for
//! the one upstream call and never stored; server keys fill in when a
//! request carries none.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Json;
use log::{debug, info, warn};
use std::sync::Arc;

use crate::client::{DirectDispatch, Dispatcher};
use crate::config::{ApiKeys, EvvlConfig};
use crate::error::Error;
use crate::request::{
  GenerationRequest, GenerationResult, ModelListRequest, ModelListResponse,
};
use crate::Modality;

pub const TEXT_PATH: &str = "/api/generate/text";
pub const IMAGE_PATH: &str = "/api/generate/image";
pub const MODELS_PATH: &str = "/api/models";

/// Shared application state
pub struct ProxyState
{   pub dispatch: DirectDispatch
}

impl ProxyState
{   pub fn new(config: &EvvlConfig) -> Result<Self, Error>
    {   Self::with_keys(config, ApiKeys::default())
    }

    /// `keys` stand in for requests that arrive without one
    pub fn with_keys(config: &EvvlConfig, keys: ApiKeys) -> Result<Self, Error>
    {   Ok(ProxyState
        {   dispatch: DirectDispatch::new(config)?.with_keys(keys)
        })
    }
}

pub fn routes(state: Arc<ProxyState>) -> axum::Router
{   axum::Router::new()
      .route(TEXT_PATH, post(generate_text))
      .route(IMAGE_PATH, post(generate_image))
      .route(MODELS_PATH, post(list_models))
      .with_state(state)
}

/// Serve until the listener fails
pub async fn serve(
  listener: tokio::net::TcpListener
, state: Arc<ProxyState>
) -> std::io::Result<()>
{   if let Ok(addr) = listener.local_addr()
    {   info!("evvl proxy listening on {}", addr);
    }
    axum::serve(listener, routes(state)).await
}

fn status_for(err: &Error) -> StatusCode
{   if err.is_configuration()
    {   StatusCode::BAD_REQUEST
    } else
    {   StatusCode::BAD_GATEWAY
    }
}

/// POST /api/generate/text
pub async fn generate_text(
  State(state): State<Arc<ProxyState>>
, body: Result<Json<GenerationRequest>, JsonRejection>
) -> (StatusCode, Json<GenerationResult>)
{   generate(&state, body, Modality::Text).await
}

/// POST /api/generate/image
pub async fn generate_image(
  State(state): State<Arc<ProxyState>>
, body: Result<Json<GenerationRequest>, JsonRejection>
) -> (StatusCode, Json<GenerationResult>)
{   generate(&state, body, Modality::Image).await
}

async fn generate(
  state: &ProxyState
, body: Result<Json<GenerationRequest>, JsonRejection>
, modality: Modality
) -> (StatusCode, Json<GenerationResult>)
{   let request = match body
    {   Ok(Json(request)) => request
      , Err(rejection) => {
          warn!("Rejected {} request body: {}", modality, rejection.body_text());
          return (
            StatusCode::BAD_REQUEST,
            Json(GenerationResult::failure(format!(
              "Invalid request body: {}", rejection.body_text()
            ))),
          );
        }
    };
    if let Err(e) = state.dispatch.resolve(&request, modality)
    {   debug!("Configuration error for {}: {}", request.provider, e);
        return (status_for(&e), Json(e.into()));
    }

    let result = match modality
    {   Modality::Text => state.dispatch.generate_text(&request).await
      , Modality::Image => state.dispatch.generate_image(&request).await
    };
    let status = if result.is_failure()
    {   StatusCode::BAD_GATEWAY
    } else
    {   StatusCode::OK
    };
    (status, Json(result))
}

/// POST /api/models
pub async fn list_models(
  State(state): State<Arc<ProxyState>>
, body: Result<Json<ModelListRequest>, JsonRejection>
) -> (StatusCode, Json<ModelListResponse>)
{   let request = match body
    {   Ok(Json(request)) => request
      , Err(rejection) => {
          return (
            StatusCode::BAD_REQUEST,
            Json(ModelListResponse::Failure
            {   error: format!("Invalid request body: {}", rejection.body_text())
            }),
          );
        }
    };
    match state.dispatch.list_models(request.provider, &request.api_key).await
    {   Ok(models) => (StatusCode::OK, Json(ModelListResponse::Models { models }))
      , Err(e) => (
          status_for(&e),
          Json(ModelListResponse::Failure { error: e.to_string() }),
        )
    }
}
