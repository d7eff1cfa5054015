//! Aggregator slug -> native slug.
//!
//! Pure and synchronous. This module is the only place allowed to
//! translate between the two slug namespaces.

pub mod tables;

use log::trace;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

use crate::error::Error;
use crate::Provider;

static ANTHROPIC_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
  let mut map: HashMap<&'static str, &'static str> = tables::ANTHROPIC_ALIASES
    .iter()
    .copied()
    .collect();
  for native in tables::ANTHROPIC_ACTIVE.iter().chain(tables::ANTHROPIC_DEPRECATED)
  {   map.insert(*native, *native);
  }
  map
});

static OPENAI_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
  tables::OPENAI_ALIASES.iter().copied().collect()
});

static GEMINI_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
  tables::GEMINI_ALIASES.iter().copied().collect()
});

static RETIRED: Lazy<HashMap<Provider, HashSet<&'static str>>> = Lazy::new(|| {
  HashMap::from([
    (Provider::Anthropic, tables::ANTHROPIC_RETIRED.iter().copied().collect())
  , (Provider::OpenAI, tables::OPENAI_RETIRED.iter().copied().collect())
  , (Provider::Gemini, tables::GEMINI_RETIRED.iter().copied().collect())
  ])
});

/// Map an aggregator slug to the identifier `provider`'s API expects.
///
/// Anthropic fails with [`Error::UnknownModel`] for anything that is
/// neither in its table nor already dated.
pub fn transform(provider: Provider, slug: &str) -> Result<String, Error>
{   let native = match provider
    {   Provider::OpenRouter
      | Provider::Ollama
      | Provider::LmStudio => slug.to_string()
      , Provider::OpenAI => lookup_or_keep(&OPENAI_MAP, strip_prefix(provider, slug))
      , Provider::Gemini => lookup_or_keep(&GEMINI_MAP, strip_prefix(provider, slug))
      , Provider::Anthropic => anthropic_native(slug)?
    };
    trace!("transform {}: {} -> {}", provider, slug, native);
    Ok(native)
}

/// Remove a leading `"<provider>/"` segment; no-op if absent
pub fn strip_prefix(provider: Provider, slug: &str) -> &str
{   provider
      .aggregator_prefix()
      .and_then(|prefix| slug.strip_prefix(prefix))
      .unwrap_or(slug)
}

fn lookup_or_keep(map: &HashMap<&'static str, &'static str>, slug: &str) -> String
{   map.get(slug).map(|s| s.to_string()).unwrap_or_else(|| slug.to_string())
}

fn anthropic_native(slug: &str) -> Result<String, Error>
{   let bare = strip_prefix(Provider::Anthropic, slug);
    if let Some(native) = ANTHROPIC_MAP.get(bare.to_ascii_lowercase().as_str())
    {   return Ok(native.to_string());
    }
    if has_date_suffix(bare)
    {   return Ok(bare.to_ascii_lowercase());
    }
    Err(Error::UnknownModel
    {   provider: Provider::Anthropic
      , slug: slug.to_string()
    })
}

/// `...-YYYYMMDD`
pub fn has_date_suffix(slug: &str) -> bool
{   let bytes = slug.as_bytes();
    bytes.len() > 9
      && bytes[bytes.len() - 9] == b'-'
      && bytes[bytes.len() - 8..].iter().all(u8::is_ascii_digit)
}

/// Native ids Anthropic currently accepts (active and deprecated)
pub fn anthropic_supported() -> impl Iterator<Item = &'static str>
{   tables::ANTHROPIC_ACTIVE
      .iter()
      .chain(tables::ANTHROPIC_DEPRECATED)
      .copied()
}

/// Hard-coded retirement list lookup; deprecated ids are not retired
pub fn is_retired(provider: Provider, native: &str) -> bool
{   RETIRED
      .get(&provider)
      .map(|set| set.contains(strip_prefix(provider, native)))
      .unwrap_or(false)
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn alias_values_are_never_keys()
    {   // keeps transform idempotent for the alias-table providers
        for (table, map) in [
          (tables::OPENAI_ALIASES, &*OPENAI_MAP)
        , (tables::GEMINI_ALIASES, &*GEMINI_MAP)
        ]
        {   for (_, native) in table
            {   assert!(!map.contains_key(native), "{native} is also a key");
            }
        }
    }

    #[test]
    fn anthropic_aliases_point_at_supported_ids()
    {   let supported: HashSet<&str> = anthropic_supported().collect();
        for (alias, native) in tables::ANTHROPIC_ALIASES
        {   assert!(supported.contains(native), "{alias} -> {native}");
        }
    }

    #[test]
    fn date_suffix_shape()
    {   assert!(has_date_suffix("claude-3-opus-20240229"));
        assert!(!has_date_suffix("claude-3-opus"));
        assert!(!has_date_suffix("claude-3-opus-2024022"));
        assert!(!has_date_suffix("20240229"));
    }

    #[test]
    fn deprecated_is_not_retired()
    {   assert!(!is_retired(Provider::Anthropic, "claude-3-opus-20240229"));
        assert!(is_retired(Provider::Anthropic, "anthropic/claude-2.1"));
        assert!(!is_retired(Provider::OpenRouter, "claude-2.1"));
    }

    #[test]
    fn dated_fallback_is_lowercased()
    {   assert_eq!(
          transform(Provider::Anthropic, "anthropic/Claude-Next-20270101").unwrap(),
          "claude-next-20270101"
        );
        assert_eq!(
          transform(Provider::Anthropic, "CLAUDE-3-OPUS-20240229").unwrap(),
          "claude-3-opus-20240229"
        );
    }
}
