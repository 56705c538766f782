//! Collaborator traits for the directory and mail adapters.
//!
//! The binary depends on these abstractions; `adpass-ldap` and `adpass-smtp`
//! provide the real implementations and tests substitute in-memory ones.

use std::{fmt, future::Future};

use crate::account::DirectoryRecord;

// ─── Directory ───────────────────────────────────────────────────────────────

/// The set-up step a directory failure happened in. Any of these aborts the
/// run before the pipeline starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
  Connect,
  Bind,
  Search,
}

impl fmt::Display for SetupStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Connect => "connect",
      Self::Bind => "bind",
      Self::Search => "search",
    })
  }
}

/// Errors from an [`AccountSource`] say which set-up step failed.
pub trait SetupError: std::error::Error + Send + Sync + 'static {
  fn stage(&self) -> SetupStage;
}

/// Produces the full, ordered list of accounts for one run.
pub trait AccountSource: Send + Sync {
  type Error: SetupError;

  /// Connect, bind and search. Returns every matching record in the order
  /// the directory returned them.
  fn fetch_records(
    &self,
  ) -> impl Future<Output = Result<Vec<DirectoryRecord>, Self::Error>> + Send + '_;
}

// ─── Mail ────────────────────────────────────────────────────────────────────

/// A plain-text message to a list of recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
  pub to:      Vec<String>,
  pub subject: String,
  pub body:    String,
}

/// Fire-and-forget mail delivery. No retries.
pub trait Mailer: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send(
    &self,
    mail: OutgoingMail,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
