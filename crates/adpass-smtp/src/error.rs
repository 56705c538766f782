//! Error type for `adpass-smtp`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid mail address {address:?}: {source}")]
  Address {
    address: String,
    #[source]
    source:  lettre::address::AddressError,
  },

  #[error("no recipients")]
  NoRecipients,

  #[error("failed to build message: {0}")]
  Message(#[from] lettre::error::Error),

  #[error("smtp delivery failed: {0}")]
  Transport(#[from] lettre::transport::smtp::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
