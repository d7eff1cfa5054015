//! Slug tables. Every naming divergence between the aggregator
//! listing and a provider's own API lives here as data.
//!
//! Revision: 2025-11. When a provider ships or retires a model,
//! update these slices; no code path changes.

/// Anthropic aggregator names (hyphen and dot spellings) to dated ids
pub const ANTHROPIC_ALIASES: &[(&str, &str)] = &[
  ("claude-3-opus", "claude-3-opus-20240229")
, ("claude-3-haiku", "claude-3-haiku-20240307")
, ("claude-3-5-sonnet", "claude-3-5-sonnet-20241022")
, ("claude-3.5-sonnet", "claude-3-5-sonnet-20241022")
, ("claude-3-5-haiku", "claude-3-5-haiku-20241022")
, ("claude-3.5-haiku", "claude-3-5-haiku-20241022")
, ("claude-3-7-sonnet", "claude-3-7-sonnet-20250219")
, ("claude-3.7-sonnet", "claude-3-7-sonnet-20250219")
, ("claude-sonnet-4", "claude-sonnet-4-20250514")
, ("claude-opus-4", "claude-opus-4-20250514")
, ("claude-opus-4-1", "claude-opus-4-1-20250805")
, ("claude-opus-4.1", "claude-opus-4-1-20250805")
, ("claude-sonnet-4-5", "claude-sonnet-4-5-20250929")
, ("claude-sonnet-4.5", "claude-sonnet-4-5-20250929")
, ("claude-haiku-4-5", "claude-haiku-4-5-20251001")
, ("claude-haiku-4.5", "claude-haiku-4-5-20251001")
, ("claude-opus-4-5", "claude-opus-4-5-20251101")
, ("claude-opus-4.5", "claude-opus-4-5-20251101")
];

/// Dated ids currently served
pub const ANTHROPIC_ACTIVE: &[&str] = &[
  "claude-opus-4-5-20251101"
, "claude-haiku-4-5-20251001"
, "claude-sonnet-4-5-20250929"
, "claude-opus-4-1-20250805"
, "claude-opus-4-20250514"
, "claude-sonnet-4-20250514"
, "claude-3-7-sonnet-20250219"
, "claude-3-5-haiku-20241022"
];

/// Still callable, scheduled for retirement. Must stay visible.
pub const ANTHROPIC_DEPRECATED: &[&str] = &[
  "claude-3-5-sonnet-20241022"
, "claude-3-opus-20240229"
, "claude-3-haiku-20240307"
];

/// No longer accepted by the live API
pub const ANTHROPIC_RETIRED: &[&str] = &[
  "claude-3-5-sonnet-20240620"
, "claude-3-sonnet-20240229"
, "claude-2.1"
, "claude-2.0"
, "claude-instant-1.2"
];

/// OpenAI: aggregator image variants named differently upstream
pub const OPENAI_ALIASES: &[(&str, &str)] = &[
  ("gpt-5-image", "gpt-image-1")
, ("gpt-5-image-mini", "gpt-image-1-mini")
];

pub const OPENAI_RETIRED: &[&str] = &[
  "gpt-4-0314"
, "gpt-4-32k"
, "gpt-4-32k-0314"
, "gpt-4-vision-preview"
, "gpt-3.5-turbo-0301"
, "gpt-3.5-turbo-0613"
, "text-davinci-003"
];

/// Gemini: word-order and image-variant divergences
pub const GEMINI_ALIASES: &[(&str, &str)] = &[
  ("gemini-flash-1.5", "gemini-1.5-flash")
, ("gemini-flash-1.5-8b", "gemini-1.5-flash-8b")
, ("gemini-pro-1.5", "gemini-1.5-pro")
, ("gemini-2.5-flash-image-preview", "gemini-2.5-flash-image")
];

pub const GEMINI_RETIRED: &[&str] = &[
  "gemini-1.0-pro"
, "gemini-1.0-pro-vision-latest"
, "gemini-pro-vision"
, "gemini-1.5-pro-001"
, "gemini-1.5-flash-001"
];
