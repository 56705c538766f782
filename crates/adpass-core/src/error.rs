//! Error types for `adpass-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid timezone: {0:?}")]
  InvalidTimezone(String),

  #[error("invalid pwdLastSet value {value:?}: {source}")]
  InvalidTimestamp {
    value:  String,
    #[source]
    source: std::num::ParseIntError,
  },

  #[error("pipeline stage {stage} failed: {reason}")]
  StageFailed { stage: &'static str, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
