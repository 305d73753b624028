use thiserror::Error;

/// The error type for configuration loading and value resolution.
#[derive(Debug, Error)]
pub enum Error {
  #[error("Failed to read configuration file: {0}")]
  Io(#[from] std::io::Error),

  #[error("Malformed escape sequence '\\{sequence}' on line {line}")]
  BadEscape { sequence: String, line: usize },

  #[error("Unterminated macro reference in '{template}'")]
  UnterminatedMacro { template: String },
}

/// A specialized `Result` type for `strand_config` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
