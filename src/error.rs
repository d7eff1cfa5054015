use std::fmt;

/// Custom error type for evvl operations
/// Implements Clone so a failure can be copied into batch slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// API key is missing for a provider
    MissingApiKey(String)
  , /// Slug has no native counterpart for a mapping-table provider
    UnknownModel
    {   provider: crate::Provider
      , slug: String
    }
  , /// Provider cannot serve the requested modality
    Unsupported
    {   provider: crate::Provider
      , modality: crate::Modality
    }
  , /// HTTP request error
    HttpError(String)
  , /// API returned an error response
    ApiError(String)
  , /// Failed to parse API response
    ParseError(String)
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Request exceeded its time budget (seconds)
    Timeout(u64)
  , /// Generic error
    Other(String)
}

impl Error
{   /// Configuration errors are raised before any network call
    /// and indicate a maintenance gap, not a transient condition.
    pub fn is_configuration(&self) -> bool
    {   matches!(
          self,
          Error::UnknownModel { .. }
            | Error::Unsupported { .. }
            | Error::MissingApiKey(_)
            | Error::InvalidConfiguration(_)
        )
    }

    /// Map a reqwest failure, keeping timeouts distinct
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self
    {   if err.is_timeout()
        {   Error::Timeout(timeout_secs)
        } else if err.is_decode()
        {   Error::ParseError(err.to_string())
        } else
        {   Error::HttpError(err.to_string())
        }
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::MissingApiKey(provider) => {
              write!(f, "Missing API key for: {}", provider)
            }
          , Error::UnknownModel { provider, slug } => {
              write!(f,
                "Unknown {} model: '{}' has no native model mapping",
                provider.display_name(),
                slug
              )
            }
          , Error::Unsupported { provider, modality } => {
              write!(f,
                "{} does not support {} generation",
                provider.display_name(),
                modality
              )
            }
          , Error::HttpError(msg) => {
              write!(f, "Network error: {}", msg)
            }
          , Error::ApiError(msg) => {
              write!(f, "{}", msg)
            }
          , Error::ParseError(msg) => {
              write!(f, "Parse error: {}", msg)
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::Timeout(secs) => {
              write!(f, "Request timed out after {}s", secs)
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}

impl From<serde_json::Error> for Error
{   fn from(e: serde_json::Error) -> Self
    {   Error::ParseError(e.to_string())
    }
}
