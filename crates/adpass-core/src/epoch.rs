//! FILETIME conversion.
//!
//! Active Directory stores `pwdLastSet` as the number of 100-nanosecond
//! intervals since 1601-01-01T00:00:00Z.

use chrono::{DateTime, TimeDelta, Utc};

/// Seconds between 1601-01-01 and 1970-01-01.
const FILETIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;

const NANOS_PER_TICK: i64 = 100;

pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Largest step (in ticks) whose nanosecond length still fits in an `i64`.
/// Floored to a whole tick, so every step lands on a 100 ns boundary.
const MAX_STEP_TICKS: i64 = i64::MAX / NANOS_PER_TICK;

/// 1601-01-01T00:00:00Z.
pub fn filetime_epoch() -> DateTime<Utc> {
  DateTime::<Utc>::UNIX_EPOCH - TimeDelta::seconds(FILETIME_UNIX_OFFSET_SECS)
}

/// Convert FILETIME ticks into a UTC instant.
///
/// The offset is applied in nanoseconds, one capped step at a time, so any
/// `i64` is accepted. The full `i64` range stays within chrono's
/// representable years, so the additions cannot overflow.
pub fn filetime_to_utc(ticks: i64) -> DateTime<Utc> {
  let step = TimeDelta::nanoseconds(MAX_STEP_TICKS * NANOS_PER_TICK);
  let mut instant = filetime_epoch();
  let mut remaining = ticks;

  while remaining > MAX_STEP_TICKS {
    instant += step;
    remaining -= MAX_STEP_TICKS;
  }
  while remaining < -MAX_STEP_TICKS {
    instant -= step;
    remaining += MAX_STEP_TICKS;
  }

  instant + TimeDelta::nanoseconds(remaining * NANOS_PER_TICK)
}

/// Convert a UTC instant back into FILETIME ticks, truncating to 100 ns.
/// Returns `None` when the instant lies outside the `i64` tick range.
pub fn utc_to_filetime(instant: DateTime<Utc>) -> Option<i64> {
  let delta = instant - filetime_epoch();
  let sub_ticks = i64::from(delta.subsec_nanos()) / NANOS_PER_TICK;
  delta
    .num_seconds()
    .checked_mul(TICKS_PER_SECOND)?
    .checked_add(sub_ticks)
}
