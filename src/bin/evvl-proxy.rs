//! Same-origin proxy server for the web build.
//!
//! `EVVL_CONFIG` points at a JSON config file, `EVVL_BIND` sets the
//! listen address, `RUST_LOG` controls verbosity. Provider keys in
//! the usual `*_API_KEY` variables serve requests sent without one.

use log::{error, info};
use std::sync::Arc;

use evvl::config::{ApiKeys, EvvlConfig};
use evvl::proxy::{serve, ProxyState};

const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>>
{   env_logger::init();

    let config = match std::env::var("EVVL_CONFIG")
    {   Ok(path) => EvvlConfig::from_file(path)?
      , Err(_) => {
          info!("EVVL_CONFIG not set, using defaults");
          EvvlConfig::default()
        }
    };
    let bind = std::env::var("EVVL_BIND")
      .unwrap_or_else(|_| DEFAULT_BIND.to_string());

    let state = Arc::new(ProxyState::with_keys(&config, ApiKeys::from_env())?);
    let listener = tokio::net::TcpListener::bind(&bind).await.map_err(|e| {
      error!("Cannot bind {}: {}", bind, e);
      e
    })?;
    serve(listener, state).await?;
    Ok(())
}
