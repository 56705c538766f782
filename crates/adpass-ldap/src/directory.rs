//! [`LdapDirectory`] — the LDAP implementation of [`AccountSource`].

use std::{collections::HashMap, time::Duration};

use adpass_core::{account::DirectoryRecord, source::AccountSource};
use ldap3::{
  LdapConnAsync, LdapConnSettings, Scope, SearchEntry,
  adapters::{Adapter, EntriesOnly, PagedResults},
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Attributes requested for every account, in record order.
pub const ACCOUNT_ATTRIBUTES: [&str; 3] =
  ["sAMAccountName", "userAccountControl", "pwdLastSet"];

// ─── Settings ────────────────────────────────────────────────────────────────

/// The `[ldap]` section of the configuration.
#[derive(Clone, Deserialize)]
pub struct LdapSettings {
  /// Domain controller or domain FQDN.
  pub host:                 String,
  /// Defaults to 389, or 636 with `use_ssl`.
  #[serde(default)]
  pub port:                 Option<u16>,
  #[serde(default)]
  pub use_ssl:              bool,
  /// Where to search, e.g. `OU=service accounts,DC=example,DC=com`.
  pub base_dn:              String,
  #[serde(default = "default_filter")]
  pub filter:               String,
  #[serde(default = "default_connect_timeout")]
  pub connect_timeout_secs: u64,
  /// Entries per page of the paged search. AD caps unpaged results at its
  /// MaxPageSize (1000 by default).
  #[serde(default = "default_page_size")]
  pub page_size:            i32,
  /// Prompted for on stdin when absent.
  #[serde(default)]
  pub bind_user:            Option<String>,
  /// Prompted for on stdin when absent.
  #[serde(default)]
  pub bind_password:        Option<String>,
}

fn default_filter() -> String { "(objectClass=user)".to_string() }

fn default_connect_timeout() -> u64 { 10 }

fn default_page_size() -> i32 { 500 }

impl LdapSettings {
  pub fn url(&self) -> String {
    let (scheme, default_port) =
      if self.use_ssl { ("ldaps", 636) } else { ("ldap", 389) };
    format!(
      "{scheme}://{}:{}",
      self.host,
      self.port.unwrap_or(default_port)
    )
  }
}

// ─── Directory ───────────────────────────────────────────────────────────────

/// Reads account records from Active Directory.
pub struct LdapDirectory {
  settings: LdapSettings,
  user:     String,
  password: String,
}

impl LdapDirectory {
  /// `user` is typically `name@domain`; `password` is used for a simple bind.
  pub fn new(
    settings: LdapSettings,
    user: impl Into<String>,
    password: impl Into<String>,
  ) -> Self {
    Self {
      settings,
      user: user.into(),
      password: password.into(),
    }
  }

  async fn fetch(&self) -> Result<Vec<DirectoryRecord>> {
    let url = self.settings.url();
    info!(url = %url, "making LDAP connection");

    let conn_settings = LdapConnSettings::new().set_conn_timeout(
      Duration::from_secs(self.settings.connect_timeout_secs),
    );
    let (conn, mut ldap) = LdapConnAsync::with_settings(conn_settings, &url)
      .await
      .map_err(|source| Error::Connect {
        url: url.clone(),
        source,
      })?;

    tokio::spawn(async move {
      if let Err(e) = conn.drive().await {
        warn!(error = %e, "LDAP connection driver error");
      }
    });

    info!(user = %self.user, "making LDAP bind");
    ldap
      .simple_bind(&self.user, &self.password)
      .await
      .and_then(|res| res.success())
      .map_err(|source| Error::Bind {
        user: self.user.clone(),
        source,
      })?;

    let base_dn = &self.settings.base_dn;
    let search_error = |source: ldap3::LdapError| Error::Search {
      base_dn: base_dn.clone(),
      source,
    };
    info!(
      base_dn = %base_dn,
      filter = %self.settings.filter,
      page_size = self.settings.page_size,
      "making LDAP search request"
    );
    let mut search = ldap
      .streaming_search_with(
        search_adapters(self.settings.page_size),
        base_dn,
        Scope::Subtree,
        &self.settings.filter,
        ACCOUNT_ATTRIBUTES.to_vec(),
      )
      .await
      .map_err(search_error)?;

    let mut records = Vec::new();
    while let Some(entry) = search.next().await.map_err(search_error)? {
      records.push(record_from_attrs(&SearchEntry::construct(entry).attrs));
    }
    search.finish().await.success().map_err(search_error)?;
    info!(count = records.len(), "LDAP search returned accounts");

    if let Err(e) = ldap.unbind().await {
      debug!(error = %e, "LDAP unbind failed");
    }

    Ok(records)
  }
}

impl AccountSource for LdapDirectory {
  type Error = Error;

  async fn fetch_records(&self) -> Result<Vec<DirectoryRecord>> {
    self.fetch().await
  }
}

/// Skip referrals and intermediate messages, and page through the results.
fn search_adapters<'a>(
  page_size: i32,
) -> Vec<Box<dyn Adapter<'a, &'a str, Vec<&'a str>>>> {
  vec![
    Box::new(EntriesOnly::new()),
    Box::new(PagedResults::new(page_size)),
  ]
}

// ─── Attribute mapping ───────────────────────────────────────────────────────

/// Build a record from a search entry's attributes. The first value of each
/// attribute is used; missing attributes become the empty string.
pub fn record_from_attrs(attrs: &HashMap<String, Vec<String>>) -> DirectoryRecord {
  let [name, status, last_set] = ACCOUNT_ATTRIBUTES.map(|attr| first_value(attrs, attr));
  DirectoryRecord::new(name, status, last_set)
}

/// Attribute names are case-insensitive in LDAP; servers usually echo the
/// requested spelling, so try that first.
fn first_value(attrs: &HashMap<String, Vec<String>>, attr: &str) -> String {
  attrs
    .get(attr)
    .or_else(|| {
      attrs
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(attr))
        .map(|(_, v)| v)
    })
    .and_then(|values| values.first())
    .cloned()
    .unwrap_or_default()
}
