//! Error type for `adpass-ldap`.

use adpass_core::source::{SetupError, SetupStage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to connect to {url}: {source}")]
  Connect {
    url:    String,
    #[source]
    source: ldap3::LdapError,
  },

  #[error("bind failed for {user}: {source}")]
  Bind {
    user:   String,
    #[source]
    source: ldap3::LdapError,
  },

  #[error("search under {base_dn} failed: {source}")]
  Search {
    base_dn: String,
    #[source]
    source:  ldap3::LdapError,
  },
}

impl SetupError for Error {
  fn stage(&self) -> SetupStage {
    match self {
      Error::Connect { .. } => SetupStage::Connect,
      Error::Bind { .. } => SetupStage::Bind,
      Error::Search { .. } => SetupStage::Search,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
