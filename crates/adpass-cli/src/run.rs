//! One run: fetch accounts, evaluate them, mail the results.
//!
//! Directory and notification-delivery failures end the run with an error
//! after a best-effort admin report containing the current log file.
//! Per-account failures never end the run; they are mailed to the admins.

use std::path::PathBuf;

use adpass_core::{
  pipeline::{Pipeline, PipelineOutcome},
  report::{format_failure_report, format_report},
  source::{AccountSource, Mailer, OutgoingMail, SetupError, SetupStage},
};
use thiserror::Error;
use tracing::{error, info, warn};

/// Subject of the admin report carrying the log file.
pub const REPORT_SUBJECT: &str = "Err Report";

/// Subject of the admin report listing accounts that could not be evaluated.
pub const FAILED_SUBJECT: &str = "FAILED accounts";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum RunError {
  #[error("directory {stage} failed: {source}")]
  Setup {
    stage:  SetupStage,
    #[source]
    source: BoxError,
  },

  #[error(transparent)]
  Pipeline(#[from] adpass_core::Error),

  #[error("failed to send notification mail: {0}")]
  Delivery(#[source] BoxError),
}

/// Who receives what.
#[derive(Debug, Clone)]
pub struct Recipients {
  pub to:      Vec<String>,
  /// Empty disables every admin report.
  pub admins:  Vec<String>,
  pub subject: String,
}

/// Counts for the closing log line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
  pub fetched:             usize,
  pub notified:            usize,
  pub failed:              usize,
  pub healthy:             usize,
  pub failure_report_sent: bool,
}

pub struct Runner<'a, S, M> {
  pub source:     &'a S,
  pub mailer:     &'a M,
  pub pipeline:   Pipeline,
  pub recipients: Recipients,
  /// The log file mailed to admins on fatal errors.
  pub log_path:   PathBuf,
}

impl<S, M> Runner<'_, S, M>
where
  S: AccountSource,
  M: Mailer,
{
  pub async fn run(&self) -> Result<RunSummary, RunError> {
    let records = match self.source.fetch_records().await {
      Ok(records) => records,
      Err(err) => {
        let stage = err.stage();
        error!(%stage, error = %err, "directory request failed, exiting");
        self.send_admin_log().await;
        return Err(RunError::Setup {
          stage,
          source: Box::new(err),
        });
      }
    };
    let fetched = records.len();
    let policy = self.pipeline.policy();
    info!(
      fetched,
      timezone = %policy.timezone,
      expire_after_days = policy.expiration.expire_after_days,
      notify_ahead_days = policy.expiration.notify_ahead_days,
      "evaluating accounts"
    );

    let outcome = match self.pipeline.run(records).await {
      Ok(outcome) => outcome,
      Err(err) => {
        error!(error = %err, "account pipeline failed, exiting");
        self.send_admin_log().await;
        return Err(err.into());
      }
    };

    self.notify(&outcome).await?;
    let failure_report_sent = self.report_failed(&outcome).await;

    Ok(RunSummary {
      fetched,
      notified: outcome.to_notify.len(),
      failed: outcome.failed.len(),
      healthy: outcome.healthy,
      failure_report_sent,
    })
  }

  async fn notify(&self, outcome: &PipelineOutcome) -> Result<(), RunError> {
    if outcome.to_notify.is_empty() {
      info!("no expired or expiring passwords");
      return Ok(());
    }

    let mail = OutgoingMail {
      to:      self.recipients.to.clone(),
      subject: self.recipients.subject.clone(),
      body:    format_report(&outcome.to_notify),
    };
    if let Err(err) = self.mailer.send(mail).await {
      error!(error = %err, "failed to send mail about accounts");
      self.send_admin_log().await;
      return Err(RunError::Delivery(Box::new(err)));
    }
    info!(count = outcome.to_notify.len(), "notification sent");
    Ok(())
  }

  /// Mail the failed accounts to the admins. Never fails the run.
  async fn report_failed(&self, outcome: &PipelineOutcome) -> bool {
    if outcome.failed.is_empty() {
      return false;
    }
    if self.recipients.admins.is_empty() {
      warn!(
        count = outcome.failed.len(),
        "some accounts could not be evaluated; admin reports are disabled"
      );
      return false;
    }

    info!(count = outcome.failed.len(), "sending failed accounts report");
    let mail = OutgoingMail {
      to:      self.recipients.admins.clone(),
      subject: FAILED_SUBJECT.to_string(),
      body:    format_failure_report(&outcome.failed),
    };
    match self.mailer.send(mail).await {
      Ok(()) => true,
      Err(err) => {
        warn!(admins = ?self.recipients.admins, error = %err, "failed to send mail to admins");
        false
      }
    }
  }

  /// Best-effort: mail the current log file to the admins.
  async fn send_admin_log(&self) {
    if self.recipients.admins.is_empty() {
      return;
    }

    info!("sending admin report");
    let body = match tokio::fs::read_to_string(&self.log_path).await {
      Ok(body) => body,
      Err(err) => {
        warn!(path = %self.log_path.display(), error = %err, "failed to form report from log file");
        return;
      }
    };

    let mail = OutgoingMail {
      to: self.recipients.admins.clone(),
      subject: REPORT_SUBJECT.to_string(),
      body,
    };
    if let Err(err) = self.mailer.send(mail).await {
      warn!(admins = ?self.recipients.admins, error = %err, "failed to send mail to admins");
    }
  }
}
