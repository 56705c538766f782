//! `adpass` — mail a report of Active Directory accounts whose password has
//! expired or is about to.
//!
//! # Usage
//!
//! ```text
//! adpass --config adpass.toml
//! adpass --ldap-host dc1.example.com --base-dn 'OU=svc,DC=example,DC=com' \
//!   --mail-host smtp.example.com --mail-from adpass@example.com \
//!   --mail-to ops@example.com --mail-admins root@example.com
//! ```
//!
//! The bind user and password are asked for on the terminal unless
//! configured; the password is not echoed.

use std::{io, sync::Mutex, time::Instant};

use adpass_cli::{Cli, Recipients, Runner, Settings, credentials, logfile};
use adpass_core::pipeline::Pipeline;
use adpass_ldap::LdapDirectory;
use adpass_smtp::SmtpMailer;
use anyhow::Context as _;
use chrono::{Local, Utc};
use clap::Parser;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let started = Instant::now();
  let now = Utc::now();

  let cli = Cli::parse();
  let settings = Settings::load(&cli).context("invalid configuration")?;

  // Initialise logging: daily file plus stderr.
  let log_path = logfile::log_file_path(&settings.log_dir, Local::now().date_naive());
  let log_file = logfile::open_log_file(&log_path)
    .with_context(|| format!("failed to open log file {}", log_path.display()))?;
  tracing_subscriber::registry()
    .with(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(log_file)))
    .with(fmt::layer().with_writer(io::stderr))
    .init();

  info!(app = adpass_cli::config::APP_NAME, "program started");

  info!(log_dir = %settings.log_dir.display(), keep = settings.keep_logs, "rotating logs");
  match logfile::rotate_by_mtime(&settings.log_dir, settings.keep_logs) {
    Ok(removed) => info!(removed = removed.len(), "log rotation done"),
    Err(e) => warn!(error = %e, "failed to rotate logs"),
  }

  if !settings.admin_reports_enabled() {
    warn!("no admin recipients configured, admin reports are disabled");
  }

  let (user, password) = credentials::bind_credentials(&settings.ldap)
    .context("failed to read AD bind credentials")?;
  let directory = LdapDirectory::new(settings.ldap.clone(), user, password);
  let mailer = SmtpMailer::new(&settings.mail.smtp()).inspect_err(|e| {
    error!(error = %e, "invalid mail settings, exiting");
  })?;

  let runner = Runner {
    source:     &directory,
    mailer:     &mailer,
    pipeline:   Pipeline::new(settings.policy(now))
      .with_capacity(settings.channel_capacity),
    recipients: Recipients {
      to:      settings.mail.to.clone(),
      admins:  settings.mail.admins.clone(),
      subject: settings.mail.subject.clone(),
    },
    log_path,
  };

  let summary = runner.run().await?;
  info!(
    fetched = summary.fetched,
    notified = summary.notified,
    failed = summary.failed,
    healthy = summary.healthy,
    elapsed_secs = started.elapsed().as_secs_f64(),
    "program done"
  );

  Ok(())
}
