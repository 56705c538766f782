//! The account-evaluation pipeline.
//!
//! Every record passes through three stages, in order:
//!
//! 1. [`enrich`]: explain the `userAccountControl` code.
//! 2. [`normalize`]: parse `pwdLastSet`, convert it from FILETIME and express
//!    it in the configured zone. Failures divert the account.
//! 3. [`classify`]: evaluate expiry and pick a [`Disposition`].
//!
//! The stages are plain functions. [`Pipeline::run`] executes them as
//! concurrent tasks joined by bounded channels; [`Pipeline::run_inline`]
//! calls them directly. Both produce the same [`PipelineOutcome`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::{sync::mpsc, task::JoinError};
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  account::{Account, DirectoryRecord, Disposition, DivertReason, Diverted, Verdict},
  epoch::filetime_to_utc,
  evaluate::ExpirationPolicy,
  status::explain_status,
  timezone::to_local,
};

/// Channel capacity between stages. One means each hand-off waits for the
/// next stage to be ready.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Everything the stages need besides the account itself.
#[derive(Debug, Clone)]
pub struct Policy {
  /// The reference instant for the whole run.
  pub now:        DateTime<Utc>,
  /// IANA zone name used for localisation and calendar-day arithmetic.
  pub timezone:   String,
  pub expiration: ExpirationPolicy,
}

// ─── Stages ──────────────────────────────────────────────────────────────────

/// Stage A: annotate the account-control code.
pub fn enrich(mut account: Account) -> Account {
  debug!(name = account.name(), "enriching account status code");
  let explained = explain_status(account.status_raw());
  account.set_status(explained);
  account
}

/// Stage B: turn the raw `pwdLastSet` into a local instant.
pub fn normalize(mut account: Account, zone: &str) -> Result<Account, Diverted> {
  debug!(name = account.name(), "converting pwdLastSet");

  let ticks = match account.pwd_last_set_raw().trim().parse::<i64>() {
    Ok(ticks) => ticks,
    Err(source) => {
      let err = Error::InvalidTimestamp {
        value: account.pwd_last_set_raw().to_string(),
        source,
      };
      warn!(name = account.name(), error = %err, "failed to parse pwdLastSet, skipping");
      return Err(Diverted::new(
        account,
        DivertReason::InvalidTimestamp(err.to_string()),
      ));
    }
  };

  let utc = filetime_to_utc(ticks);
  match to_local(utc, zone) {
    Ok(local) => {
      account.set_pwd_last_set(utc, local);
      Ok(account)
    }
    Err(err) => {
      warn!(
        name = account.name(),
        pwd_last_set = %utc,
        error = %err,
        "failed to convert pwdLastSet to local timezone, skipping"
      );
      Err(Diverted::new(
        account,
        DivertReason::InvalidTimezone(err.to_string()),
      ))
    }
  }
}

/// Stage C: evaluate expiry for a normalized account.
///
/// An account that skipped [`normalize`] has nothing to evaluate and is
/// diverted rather than guessed at.
pub fn classify(mut account: Account, policy: &Policy) -> Disposition {
  let Some(last_set) = account.pwd_last_set_local().cloned() else {
    warn!(name = account.name(), "pwdLastSet was never converted, skipping");
    return Disposition::Failed(Diverted::new(
      account,
      DivertReason::InvalidTimestamp("pwdLastSet was never converted".into()),
    ));
  };

  debug!(name = account.name(), last_set = %last_set, "checking password expiry");
  match policy.expiration.evaluate(&last_set, policy.now) {
    Some(verdict) => {
      match &verdict {
        Verdict::Expired(at) => {
          warn!(name = account.name(), expires_at = %at, "password already expired");
        }
        Verdict::SoonToExpire(at) => {
          info!(name = account.name(), expires_at = %at, "password is going to expire");
        }
      }
      account.set_verdict(verdict);
      Disposition::Notify(account)
    }
    None => Disposition::Healthy(account),
  }
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// The partitioned result of one run. Each input record is counted in
/// exactly one of the three buckets, in input order.
#[derive(Debug, Default)]
pub struct PipelineOutcome {
  pub to_notify: Vec<Account>,
  pub failed:    Vec<Diverted>,
  /// Accounts with nothing to report.
  pub healthy:   usize,
}

impl PipelineOutcome {
  pub fn total(&self) -> usize {
    self.to_notify.len() + self.failed.len() + self.healthy
  }

  fn record(&mut self, disposition: Disposition) {
    match disposition {
      Disposition::Notify(account) => self.to_notify.push(account),
      Disposition::Failed(diverted) => self.failed.push(diverted),
      Disposition::Healthy(_) => self.healthy += 1,
    }
  }
}

// ─── Orchestrator ────────────────────────────────────────────────────────────

/// Drives directory records through the stages.
#[derive(Debug, Clone)]
pub struct Pipeline {
  policy:   Arc<Policy>,
  capacity: usize,
}

impl Pipeline {
  pub fn new(policy: Policy) -> Self {
    Self {
      policy:   Arc::new(policy),
      capacity: DEFAULT_CHANNEL_CAPACITY,
    }
  }

  /// Set the per-stage channel capacity (at least one).
  pub fn with_capacity(mut self, capacity: usize) -> Self {
    self.capacity = capacity.max(1);
    self
  }

  pub fn policy(&self) -> &Policy { &self.policy }

  /// Run every record through the stages on the current task.
  pub fn run_inline(&self, records: Vec<DirectoryRecord>) -> PipelineOutcome {
    let mut outcome = PipelineOutcome::default();
    for record in records {
      outcome.record(self.process(Account::from(record)));
    }
    log_outcome(&outcome);
    outcome
  }

  fn process(&self, account: Account) -> Disposition {
    match normalize(enrich(account), &self.policy.timezone) {
      Ok(account) => classify(account, &self.policy),
      Err(diverted) => Disposition::Failed(diverted),
    }
  }

  /// Run every record through the stages as concurrent tasks.
  ///
  /// Each stage is a single task reading from a bounded channel, so a slow
  /// stage holds back the ones before it. Stage B owns the failed list and
  /// stage C owns the notify list; both are handed back through the task
  /// handles and merged here once every task has finished.
  pub async fn run(&self, records: Vec<DirectoryRecord>) -> Result<PipelineOutcome> {
    let total = records.len();
    let (enrich_tx, mut enrich_rx) = mpsc::channel::<Account>(self.capacity);
    let (normalize_tx, mut normalize_rx) = mpsc::channel::<Account>(self.capacity);
    let (classify_tx, mut classify_rx) = mpsc::channel::<Account>(self.capacity);

    let producer = tokio::spawn(async move {
      info!(count = total, "collecting accounts data");
      for record in records {
        if enrich_tx.send(Account::from(record)).await.is_err() {
          break;
        }
      }
    });

    let enricher = tokio::spawn(async move {
      while let Some(account) = enrich_rx.recv().await {
        if normalize_tx.send(enrich(account)).await.is_err() {
          break;
        }
      }
    });

    let zone = self.policy.timezone.clone();
    let normalizer = tokio::spawn(async move {
      let mut failed = Vec::new();
      while let Some(account) = normalize_rx.recv().await {
        match normalize(account, &zone) {
          Ok(account) => {
            if classify_tx.send(account).await.is_err() {
              break;
            }
          }
          Err(diverted) => failed.push(diverted),
        }
      }
      failed
    });

    let policy = Arc::clone(&self.policy);
    let classifier = tokio::spawn(async move {
      let mut outcome = PipelineOutcome::default();
      while let Some(account) = classify_rx.recv().await {
        outcome.record(classify(account, &policy));
      }
      outcome
    });

    let (produced, enriched, normalized, classified) =
      tokio::join!(producer, enricher, normalizer, classifier);
    produced.map_err(|e| stage_failed("collect", e))?;
    enriched.map_err(|e| stage_failed("enrich", e))?;
    let mut failed = normalized.map_err(|e| stage_failed("normalize", e))?;
    let mut outcome = classified.map_err(|e| stage_failed("classify", e))?;

    failed.append(&mut outcome.failed);
    outcome.failed = failed;

    debug_assert_eq!(outcome.total(), total, "every record has one disposition");
    log_outcome(&outcome);
    Ok(outcome)
  }
}

fn stage_failed(stage: &'static str, err: JoinError) -> Error {
  Error::StageFailed {
    stage,
    reason: err.to_string(),
  }
}

fn log_outcome(outcome: &PipelineOutcome) {
  info!(
    to_notify = outcome.to_notify.len(),
    failed = outcome.failed.len(),
    healthy = outcome.healthy,
    "accounts evaluated"
  );
}
