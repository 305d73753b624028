use thiserror::Error;

/// The error type for container construction and bean resolution.
///
/// Every variant is fatal for the call that raised it; nothing is retried.
/// A missing parameter value is not an error (the field keeps its default),
/// and an over-deep macro chain degrades to its literal text inside
/// `strand_config` rather than surfacing here.
#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Config(#[from] strand_config::Error),

  #[error("Unknown type '{0}': no descriptor registered under that name")]
  UnknownType(String),

  #[error("Bean '{name}' is not an instance of the requested type")]
  WrongType { name: String },

  #[error("Failed to convert '{raw}' for property '{property}': {reason}")]
  Convert {
    property: String,
    raw: String,
    reason: String,
  },

  #[error("Injection failed for bean '{bean}', property '{property}': {reason}")]
  Injection {
    bean: String,
    property: String,
    reason: String,
  },

  #[error("Initializer failed for bean '{bean}': {reason}")]
  Initializer { bean: String, reason: String },

  #[error("Provider failed to supply an instance of '{type_name}': {reason}")]
  Provider { type_name: String, reason: String },
}

/// A specialized `Result` type for `strand_ioc` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
