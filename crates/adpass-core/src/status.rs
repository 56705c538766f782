//! `userAccountControl` explanation.
//!
//! Only the codes seen on ordinary user objects are recognised. Everything
//! else is reported as `UNKNOWN` with the original code kept as a prefix.

use strum::{Display, EnumString};

/// Coarse classification of an account-control code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
  NormalAccount,
  #[strum(serialize = "NORMAL_ACCOUNT PASSWD_NOTREQD")]
  PasswordNotRequired,
  #[strum(serialize = "NORMAL_ACCOUNT DONT_EXPIRE_PASSWORD")]
  PasswordNeverExpires,
  PasswordExpired,
  #[strum(serialize = "ACCOUNTDISABLE")]
  Disabled,
  Unknown,
}

impl AccountStatus {
  pub fn from_code(code: &str) -> Self {
    match code.trim() {
      "512" => Self::NormalAccount,
      "544" => Self::PasswordNotRequired,
      "66048" => Self::PasswordNeverExpires,
      "8388608" => Self::PasswordExpired,
      // ACCOUNTDISABLE combined with NORMAL_ACCOUNT, PASSWD_NOTREQD or
      // DONT_EXPIRE_PASSWORD.
      "514" | "546" | "66050" => Self::Disabled,
      _ => Self::Unknown,
    }
  }
}

/// Annotate a raw `userAccountControl` code, e.g. `"512"` becomes
/// `"512 NORMAL_ACCOUNT"`.
pub fn explain_status(code: &str) -> String {
  format!("{code} {}", AccountStatus::from_code(code))
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn known_codes() {
    assert_eq!(explain_status("512"), "512 NORMAL_ACCOUNT");
    assert_eq!(explain_status("8388608"), "8388608 PASSWORD_EXPIRED");
    assert_eq!(explain_status("514"), "514 ACCOUNTDISABLE");
    assert_eq!(explain_status("546"), "546 ACCOUNTDISABLE");
    assert_eq!(
      explain_status("66048"),
      "66048 NORMAL_ACCOUNT DONT_EXPIRE_PASSWORD"
    );
  }

  #[test]
  fn unknown_code_keeps_prefix() {
    let explained = explain_status("999999");
    assert!(explained.starts_with("999999"));
    assert!(explained.contains("UNKNOWN"));
  }

  #[test]
  fn empty_code_is_unknown() {
    assert_eq!(explain_status(""), " UNKNOWN");
    assert_eq!(AccountStatus::from_code(""), AccountStatus::Unknown);
  }

  #[test]
  fn annotation_parses_back() {
    assert_eq!(
      AccountStatus::from_str("ACCOUNTDISABLE").unwrap(),
      AccountStatus::Disabled
    );
    assert_eq!(
      AccountStatus::from_str("NORMAL_ACCOUNT").unwrap(),
      AccountStatus::NormalAccount
    );
  }
}
