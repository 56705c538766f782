//! Configuration: defaults, `adpass.toml`, `ADPASS_*` environment variables
//! and command-line flags, in increasing order of precedence.

use std::path::PathBuf;

use adpass_core::{
  evaluate::ExpirationPolicy,
  pipeline::{DEFAULT_CHANNEL_CAPACITY, Policy},
};
use adpass_ldap::LdapSettings;
use adpass_smtp::SmtpSettings;
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

pub const APP_NAME: &str = "adpass";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug, Default)]
#[command(
  name = "adpass",
  version,
  about = "AD accounts password expiration mail notification"
)]
pub struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "adpass.toml")]
  pub config: PathBuf,

  /// Directory for the daily log files.
  #[arg(long)]
  pub log_dir: Option<PathBuf>,

  /// Number of log files to keep after rotation.
  #[arg(long)]
  pub keep_logs: Option<u32>,

  /// Days after which a password expires.
  #[arg(long = "pet", value_name = "DAYS")]
  pub expire_after_days: Option<u32>,

  /// Days before expiration to start notifying.
  #[arg(long = "pnt", value_name = "DAYS")]
  pub notify_ahead_days: Option<u32>,

  /// IANA timezone, e.g. `Asia/Almaty`.
  #[arg(long = "tz")]
  pub timezone: Option<String>,

  /// SMTP host, name or IP.
  #[arg(long)]
  pub mail_host: Option<String>,

  #[arg(long)]
  pub mail_port: Option<u16>,

  /// Sender address.
  #[arg(long)]
  pub mail_from: Option<String>,

  /// Notification recipients, comma separated.
  #[arg(long, value_delimiter = ',')]
  pub mail_to: Option<Vec<String>>,

  /// Recipients of error reports and failed-account reports, comma separated.
  #[arg(long, value_delimiter = ',')]
  pub mail_admins: Option<Vec<String>>,

  /// Subject of the notification mail.
  #[arg(long)]
  pub mail_subject: Option<String>,

  /// Domain controller or domain FQDN.
  #[arg(long)]
  pub ldap_host: Option<String>,

  /// Base DN to search for accounts in.
  #[arg(long)]
  pub base_dn: Option<String>,
}

// ─── Settings ─────────────────────────────────────────────────────────────────

/// The `[mail]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct MailSettings {
  pub host:         String,
  #[serde(default = "default_mail_port")]
  pub port:         u16,
  pub from:         String,
  #[serde(default = "default_mail_timeout")]
  pub timeout_secs: u64,
  pub to:           Vec<String>,
  /// Empty disables admin reports.
  #[serde(default)]
  pub admins:       Vec<String>,
  #[serde(default = "default_subject")]
  pub subject:      String,
}

impl MailSettings {
  pub fn smtp(&self) -> SmtpSettings {
    SmtpSettings {
      host:         self.host.clone(),
      port:         self.port,
      from:         self.from.clone(),
      timeout_secs: self.timeout_secs,
    }
  }
}

/// Runtime configuration, deserialised from all sources.
#[derive(Clone, Deserialize)]
pub struct Settings {
  #[serde(default = "default_log_dir")]
  pub log_dir:           PathBuf,
  #[serde(default = "default_keep_logs")]
  pub keep_logs:         usize,
  #[serde(default = "default_expire_after")]
  pub expire_after_days: u32,
  #[serde(default = "default_notify_ahead")]
  pub notify_ahead_days: u32,
  #[serde(default = "default_timezone")]
  pub timezone:          String,
  #[serde(default = "default_capacity")]
  pub channel_capacity:  usize,
  pub mail:              MailSettings,
  pub ldap:              LdapSettings,
}

fn default_log_dir() -> PathBuf { PathBuf::from(format!("logs_{APP_NAME}")) }
fn default_keep_logs() -> usize { 7 }
fn default_expire_after() -> u32 { 60 }
fn default_notify_ahead() -> u32 { 5 }
fn default_timezone() -> String { "Asia/Almaty".to_string() }
fn default_capacity() -> usize { DEFAULT_CHANNEL_CAPACITY }
fn default_mail_port() -> u16 { 25 }
fn default_mail_timeout() -> u64 { 30 }
fn default_subject() -> String { "Accounts with expired password".to_string() }

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to load configuration: {0}")]
  Load(#[from] config::ConfigError),

  #[error("{0} is not set")]
  Missing(&'static str),
}

impl Settings {
  /// Merge every configuration source, then normalise and validate.
  pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
    let builder = config::Config::builder()
      .add_source(config::File::from(cli.config.clone()).required(false))
      .add_source(
        config::Environment::with_prefix("ADPASS")
          .separator("__")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("mail.to")
          .with_list_parse_key("mail.admins"),
      )
      .set_override_option(
        "log_dir",
        cli.log_dir.as_ref().map(|p| p.to_string_lossy().into_owned()),
      )?
      .set_override_option("keep_logs", cli.keep_logs.map(i64::from))?
      .set_override_option("expire_after_days", cli.expire_after_days.map(i64::from))?
      .set_override_option("notify_ahead_days", cli.notify_ahead_days.map(i64::from))?
      .set_override_option("timezone", cli.timezone.clone())?
      .set_override_option("mail.host", cli.mail_host.clone())?
      .set_override_option("mail.port", cli.mail_port.map(i64::from))?
      .set_override_option("mail.from", cli.mail_from.clone())?
      .set_override_option("mail.to", cli.mail_to.clone())?
      .set_override_option("mail.admins", cli.mail_admins.clone())?
      .set_override_option("mail.subject", cli.mail_subject.clone())?
      .set_override_option("ldap.host", cli.ldap_host.clone())?
      .set_override_option("ldap.base_dn", cli.base_dn.clone())?;

    let mut settings: Settings = builder.build()?.try_deserialize()?;
    settings.normalize();
    settings.validate()?;
    Ok(settings)
  }

  /// Trim recipient addresses and drop empty ones.
  fn normalize(&mut self) {
    for list in [&mut self.mail.to, &mut self.mail.admins] {
      *list = list
        .iter()
        .map(|addr| addr.trim().to_string())
        .filter(|addr| !addr.is_empty())
        .collect();
    }
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    let required = [
      (self.mail.host.as_str(), "mail.host"),
      (self.mail.from.as_str(), "mail.from"),
      (self.ldap.host.as_str(), "ldap.host"),
      (self.ldap.base_dn.as_str(), "ldap.base_dn"),
    ];
    if let Some((_, key)) = required.iter().find(|(v, _)| v.trim().is_empty()) {
      return Err(ConfigError::Missing(*key));
    }
    if self.mail.to.is_empty() {
      return Err(ConfigError::Missing("mail.to"));
    }
    Ok(())
  }

  pub fn admin_reports_enabled(&self) -> bool { !self.mail.admins.is_empty() }

  /// The pipeline policy for a run starting at `now`.
  pub fn policy(&self, now: DateTime<Utc>) -> Policy {
    Policy {
      now,
      timezone: self.timezone.clone(),
      expiration: ExpirationPolicy {
        expire_after_days: self.expire_after_days,
        notify_ahead_days: self.notify_ahead_days,
      },
    }
  }
}
