//! Accounts — the unit of work that flows through the pipeline.
//!
//! An [`Account`] starts life as a [`DirectoryRecord`]. Each derived field is
//! written exactly once, by the stage that owns it, and never overwritten.
//! The setters are crate-private so only the pipeline stages can fill them in.

use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Format used for expiration dates in verdict descriptions.
pub const VERDICT_DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

// ─── Directory input ─────────────────────────────────────────────────────────

/// One account exactly as returned by the directory search.
///
/// Missing attributes are represented by the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRecord {
  /// `sAMAccountName`.
  pub name:         String,
  /// `userAccountControl`, as text.
  pub status_code:  String,
  /// `pwdLastSet`, FILETIME ticks as text.
  pub pwd_last_set: String,
}

impl DirectoryRecord {
  pub fn new(
    name: impl Into<String>,
    status_code: impl Into<String>,
    pwd_last_set: impl Into<String>,
  ) -> Self {
    Self {
      name:         name.into(),
      status_code:  status_code.into(),
      pwd_last_set: pwd_last_set.into(),
    }
  }
}

// ─── Verdict ─────────────────────────────────────────────────────────────────

/// The outcome of expiration evaluation for an account that needs attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
  /// The password expired at the given local time.
  Expired(DateTime<Tz>),
  /// The password expires at the given local time, inside the notify window.
  SoonToExpire(DateTime<Tz>),
}

impl Verdict {
  pub fn expires_at(&self) -> &DateTime<Tz> {
    match self {
      Self::Expired(at) | Self::SoonToExpire(at) => at,
    }
  }

  pub fn is_expired(&self) -> bool { matches!(self, Self::Expired(_)) }
}

impl fmt::Display for Verdict {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Expired(at) => {
        write!(f, "EXPIRED: {}", at.format(VERDICT_DATE_FORMAT))
      }
      Self::SoonToExpire(at) => {
        write!(f, "WILL BE EXPIRED SOON -> {}", at.format(VERDICT_DATE_FORMAT))
      }
    }
  }
}

// ─── Account ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Account {
  name:               String,
  status_raw:         String,
  status:             Option<String>,
  pwd_last_set_raw:   String,
  pwd_last_set:       Option<DateTime<Utc>>,
  pwd_last_set_local: Option<DateTime<Tz>>,
  verdict:            Option<Verdict>,
}

impl From<DirectoryRecord> for Account {
  fn from(record: DirectoryRecord) -> Self {
    Self {
      name:               record.name,
      status_raw:         record.status_code,
      status:             None,
      pwd_last_set_raw:   record.pwd_last_set,
      pwd_last_set:       None,
      pwd_last_set_local: None,
      verdict:            None,
    }
  }
}

impl Account {
  pub fn name(&self) -> &str { &self.name }

  pub fn status_raw(&self) -> &str { &self.status_raw }

  /// The explained status, or the raw code if enrichment has not run yet.
  pub fn status(&self) -> &str {
    self.status.as_deref().unwrap_or(&self.status_raw)
  }

  pub fn pwd_last_set_raw(&self) -> &str { &self.pwd_last_set_raw }

  pub fn pwd_last_set(&self) -> Option<&DateTime<Utc>> {
    self.pwd_last_set.as_ref()
  }

  pub fn pwd_last_set_local(&self) -> Option<&DateTime<Tz>> {
    self.pwd_last_set_local.as_ref()
  }

  pub fn verdict(&self) -> Option<&Verdict> { self.verdict.as_ref() }

  pub(crate) fn set_status(&mut self, explained: String) {
    debug_assert!(self.status.is_none(), "status already explained");
    self.status = Some(explained);
  }

  pub(crate) fn set_pwd_last_set(
    &mut self,
    utc: DateTime<Utc>,
    local: DateTime<Tz>,
  ) {
    debug_assert!(self.pwd_last_set.is_none(), "pwdLastSet already converted");
    self.pwd_last_set = Some(utc);
    self.pwd_last_set_local = Some(local);
  }

  pub(crate) fn set_verdict(&mut self, verdict: Verdict) {
    debug_assert!(self.verdict.is_none(), "verdict already written");
    self.verdict = Some(verdict);
  }
}

// ─── Terminal dispositions ───────────────────────────────────────────────────

/// Why an account left the pipeline before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DivertReason {
  /// `pwdLastSet` could not be parsed as an integer.
  InvalidTimestamp(String),
  /// The configured zone could not be resolved.
  InvalidTimezone(String),
}

impl fmt::Display for DivertReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::InvalidTimestamp(msg) => write!(f, "invalid pwdLastSet: {msg}"),
      Self::InvalidTimezone(msg) => write!(f, "timezone conversion: {msg}"),
    }
  }
}

/// An account that was routed to the failed set. It is frozen: no later stage
/// sees it.
#[derive(Debug, Clone)]
pub struct Diverted {
  account: Account,
  reason:  DivertReason,
}

impl Diverted {
  pub(crate) fn new(account: Account, reason: DivertReason) -> Self {
    Self { account, reason }
  }

  pub fn account(&self) -> &Account { &self.account }

  pub fn reason(&self) -> &DivertReason { &self.reason }
}

/// Where a single record ended up.
#[derive(Debug, Clone)]
pub enum Disposition {
  /// Expired or soon to expire; goes into the notify mail.
  Notify(Account),
  /// Conversion failed; goes into the failure report.
  Failed(Diverted),
  /// Nothing to report.
  Healthy(Account),
}
