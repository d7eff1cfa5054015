//! Runtime environment (desktop shell vs. web)
//!
//! The embedding host says which one it is: a desktop shell either
//! builds with the `desktop` feature or calls
//! [`RuntimeEnvironment::init`] before the first router is built.
//! `EVVL_RUNTIME=desktop|web` overrides both.

use log::debug;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Explicit switch, `desktop` or `web`
pub const RUNTIME_VAR: &str = "EVVL_RUNTIME";

static DETECTED: OnceCell<RuntimeEnvironment> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment
{   /// Embedded/local-first: adapters are called in-process
    Desktop
  , /// Calls go through the same-origin proxy
    Web
}

impl RuntimeEnvironment
{   /// What this build assumes when the host says nothing
    pub fn build_default() -> Self
    {   if cfg!(feature = "desktop")
        {   RuntimeEnvironment::Desktop
        } else
        {   RuntimeEnvironment::Web
        }
    }

    /// Apply the `EVVL_RUNTIME` override to `fallback`, no caching
    pub fn probe_with<F>(lookup: F, fallback: Self) -> Self
    where
      F: Fn(&str) -> Option<String>
    {   match lookup(RUNTIME_VAR)
        {   Some(explicit) => match explicit.trim().to_ascii_lowercase().as_str()
            {   "desktop" => RuntimeEnvironment::Desktop
              , "web" => RuntimeEnvironment::Web
              , other => {
                  debug!("Ignoring {}={}", RUNTIME_VAR, other);
                  fallback
                }
            }
          , None => fallback
        }
    }

    fn from_process(fallback: Self) -> Self
    {   Self::probe_with(|name| std::env::var(name).ok(), fallback)
    }

    /// Called by the host shell at startup. Fails if the environment
    /// was already resolved to something else.
    pub fn init(host: Self) -> Result<Self, Error>
    {   let wanted = Self::from_process(host);
        let resolved = *DETECTED.get_or_init(|| {
          debug!("Runtime environment set by host as {:?}", wanted);
          wanted
        });
        if resolved == wanted
        {   Ok(resolved)
        } else
        {   Err(Error::InvalidConfiguration(format!(
              "runtime already resolved as {:?}", resolved
            )))
        }
    }

    /// Resolved once per process and cached afterwards.
    pub fn detect() -> Self
    {   *DETECTED.get_or_init(|| {
          let env = Self::from_process(Self::build_default());
          debug!("Runtime environment resolved as {:?}", env);
          env
        })
    }

    pub fn is_desktop(&self) -> bool
    {   matches!(self, RuntimeEnvironment::Desktop)
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String>
    {   let map: HashMap<String, String> = vars
          .iter()
          .map(|(k, v)| (k.to_string(), v.to_string()))
          .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn host_signal_is_used_without_override()
    {   assert_eq!(
          RuntimeEnvironment::probe_with(lookup(&[]), RuntimeEnvironment::Desktop),
          RuntimeEnvironment::Desktop
        );
        assert_eq!(
          RuntimeEnvironment::probe_with(lookup(&[]), RuntimeEnvironment::Web),
          RuntimeEnvironment::Web
        );
    }

    #[test]
    fn explicit_switch_wins_over_host()
    {   let env = RuntimeEnvironment::probe_with(
          lookup(&[(RUNTIME_VAR, "Web")]),
          RuntimeEnvironment::Desktop
        );
        assert_eq!(env, RuntimeEnvironment::Web);
    }

    #[test]
    fn unknown_switch_value_is_ignored()
    {   let env = RuntimeEnvironment::probe_with(
          lookup(&[(RUNTIME_VAR, "tablet")]),
          RuntimeEnvironment::Desktop
        );
        assert_eq!(env, RuntimeEnvironment::Desktop);
    }

    #[test]
    fn build_default_follows_feature()
    {   assert_eq!(
          RuntimeEnvironment::build_default().is_desktop(),
          cfg!(feature = "desktop")
        );
    }

    #[test]
    fn init_after_detect_must_agree()
    {   let current = RuntimeEnvironment::detect();
        assert_eq!(RuntimeEnvironment::detect(), current);
        if std::env::var(RUNTIME_VAR).is_err()
        {   assert_eq!(RuntimeEnvironment::init(current), Ok(current));
            let other = if current.is_desktop()
            {   RuntimeEnvironment::Web
            } else
            {   RuntimeEnvironment::Desktop
            };
            assert!(RuntimeEnvironment::init(other).is_err());
        }
    }
}
