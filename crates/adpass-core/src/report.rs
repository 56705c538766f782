//! Plain-text mail bodies for classified and failed accounts.

use std::fmt::Write as _;

use crate::account::{Account, Diverted};

/// Separator written after every block.
pub const BLOCK_DELIMITER: &str = "---";

const LAST_SET_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

/// One block per account, in the order given.
pub fn format_report(accounts: &[Account]) -> String {
  let mut body = String::new();
  for account in accounts {
    let last_set = account
      .pwd_last_set_local()
      .map(|t| t.format(LAST_SET_FORMAT).to_string())
      .unwrap_or_else(|| account.pwd_last_set_raw().to_string());
    let verdict = account
      .verdict()
      .map(ToString::to_string)
      .unwrap_or_default();
    write_block(&mut body, account, &last_set, &verdict);
  }
  body
}

/// Same layout as [`format_report`], with the raw `pwdLastSet` and the reason
/// the account was diverted.
pub fn format_failure_report(failed: &[Diverted]) -> String {
  let mut body = String::new();
  for diverted in failed {
    let account = diverted.account();
    let reason = format!("FAILED: {}", diverted.reason());
    write_block(&mut body, account, account.pwd_last_set_raw(), &reason);
  }
  body
}

fn write_block(body: &mut String, account: &Account, last_set: &str, status: &str) {
  // Writing into a String cannot fail.
  let _ = write!(
    body,
    "sAMAccountName: {}\naccStatus: {}\npwdLastSet: {}\nexpirationStatus: {}\n{BLOCK_DELIMITER}\n",
    account.name(),
    account.status(),
    last_set,
    status,
  );
}
