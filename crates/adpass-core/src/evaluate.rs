//! Expiration evaluation.
//!
//! Boundaries: an account whose expiry equals `now` is expired (inclusive).
//! The notify window is open strictly after `expires_at - notify_ahead_days`,
//! so an account exactly on the window edge is not yet reported.

use chrono::{
  DateTime, Days, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::account::Verdict;

/// Password age thresholds, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationPolicy {
  /// A password expires this many days after it was last set.
  pub expire_after_days: u32,
  /// Start warning this many days before expiry.
  pub notify_ahead_days: u32,
}

impl Default for ExpirationPolicy {
  fn default() -> Self {
    Self {
      expire_after_days: 60,
      notify_ahead_days: 5,
    }
  }
}

impl ExpirationPolicy {
  pub fn evaluate(
    &self,
    last_set_local: &DateTime<Tz>,
    now: DateTime<Utc>,
  ) -> Option<Verdict> {
    evaluate(
      last_set_local,
      now,
      self.expire_after_days,
      self.notify_ahead_days,
    )
  }
}

/// Decide whether a password last set at `last_set_local` is expired, about
/// to expire, or fine at `now`.
///
/// Days are calendar days in the account's local zone, so a DST transition
/// inside the period shifts the expiry by the DST offset. `None` means the
/// password is fine, or that its expiry is beyond the representable range.
pub fn evaluate(
  last_set_local: &DateTime<Tz>,
  now: DateTime<Utc>,
  expire_after_days: u32,
  notify_ahead_days: u32,
) -> Option<Verdict> {
  let tz = last_set_local.timezone();
  let now = now.with_timezone(&tz);

  let expires_at = last_set_local
    .naive_local()
    .checked_add_days(Days::new(expire_after_days.into()))
    .and_then(|naive| resolve_local(&tz, naive))?;

  if expires_at <= now {
    return Some(Verdict::Expired(expires_at));
  }

  let window_opens = expires_at
    .naive_local()
    .checked_sub_days(Days::new(notify_ahead_days.into()))
    .and_then(|naive| resolve_local(&tz, naive))?;

  (now > window_opens).then_some(Verdict::SoonToExpire(expires_at))
}

/// Map a wall-clock time in `tz` to an instant.
///
/// A time repeated by a fall-back transition takes its earlier instant. A time
/// skipped by a spring-forward gap is read with the offset in effect before
/// the gap, which lands it after the gap by the size of the jump (02:30 in a
/// one-hour gap becomes 03:30).
fn resolve_local(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
  match tz.from_local_datetime(&naive) {
    LocalResult::Single(at) => Some(at),
    LocalResult::Ambiguous(earliest, _) => Some(earliest),
    LocalResult::None => {
      let before_gap = naive.checked_sub_days(Days::new(1))?;
      let offset = tz.offset_from_utc_datetime(&before_gap).fix();
      let utc = naive
        .checked_sub_signed(TimeDelta::seconds(offset.local_minus_utc().into()))?;
      Some(tz.from_utc_datetime(&utc))
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono_tz::{Europe, UTC};

  use super::*;

  fn last_set() -> DateTime<Tz> {
    UTC.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap()
  }

  fn days_after(days: i64) -> DateTime<Utc> {
    last_set().with_timezone(&Utc) + TimeDelta::days(days)
  }

  #[test]
  fn exact_expiry_is_expired() {
    let verdict = evaluate(&last_set(), days_after(60), 60, 5).unwrap();
    assert!(verdict.is_expired());
    assert_eq!(verdict.expires_at(), &days_after(60));
  }

  #[test]
  fn one_nanosecond_before_expiry_is_soon() {
    let now = days_after(60) - TimeDelta::nanoseconds(1);
    let verdict = evaluate(&last_set(), now, 60, 5).unwrap();
    assert!(matches!(verdict, Verdict::SoonToExpire(_)));
  }

  #[test]
  fn inside_notify_window_is_soon() {
    let verdict = evaluate(&last_set(), days_after(56), 60, 5).unwrap();
    assert!(matches!(verdict, Verdict::SoonToExpire(_)));
  }

  #[test]
  fn window_edge_is_not_yet_soon() {
    assert_eq!(evaluate(&last_set(), days_after(55), 60, 5), None);
    let just_inside = days_after(55) + TimeDelta::seconds(1);
    assert!(evaluate(&last_set(), just_inside, 60, 5).is_some());
  }

  #[test]
  fn healthy_password_has_no_verdict() {
    assert_eq!(evaluate(&last_set(), days_after(50), 60, 5), None);
  }

  #[test]
  fn long_expired() {
    let verdict = evaluate(&last_set(), days_after(400), 60, 5).unwrap();
    assert!(verdict.is_expired());
  }

  #[test]
  fn zero_notify_window_never_reports_soon() {
    assert_eq!(evaluate(&last_set(), days_after(59), 60, 0), None);
    assert!(evaluate(&last_set(), days_after(60), 60, 0).unwrap().is_expired());
  }

  #[test]
  fn days_are_calendar_days_across_dst() {
    // Berlin switches to CEST on 2024-03-31; local 10:00 is kept, so in UTC
    // the expiry is one hour earlier than 60 * 24h.
    let set = Europe::Berlin.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    let expected = Utc.with_ymd_and_hms(2024, 4, 30, 8, 0, 0).unwrap();

    let verdict = evaluate(&set, expected, 60, 5).unwrap();
    assert!(verdict.is_expired());
    assert_eq!(verdict.expires_at(), &expected);

    let before = expected - TimeDelta::minutes(1);
    assert!(!evaluate(&set, before, 60, 5).unwrap().is_expired());
  }

  fn berlin(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Tz> {
    Europe::Berlin.with_ymd_and_hms(y, m, d, h, min, 0).single().unwrap()
  }

  fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
  }

  #[test]
  fn expiry_in_spring_forward_gap_moves_past_the_gap() {
    // 2024-03-31 02:30 does not exist in Berlin; it resolves to 03:30 CEST.
    let set = berlin(2024, 1, 31, 2, 30);
    let expected = utc(2024, 3, 31, 1, 30);

    let verdict = evaluate(&set, utc(2025, 6, 1, 0, 0), 60, 5).unwrap();
    assert!(verdict.is_expired());
    assert_eq!(verdict.expires_at(), &expected);

    let just_before = expected - TimeDelta::seconds(1);
    let verdict = evaluate(&set, just_before, 60, 5).unwrap();
    assert_eq!(verdict, Verdict::SoonToExpire(expected.with_timezone(&Europe::Berlin)));
  }

  #[test]
  fn expiry_in_fall_back_overlap_takes_the_earlier_instant() {
    // 2024-10-27 02:30 happens twice in Berlin; the CEST one comes first.
    let set = berlin(2024, 8, 28, 2, 30);
    let expected = utc(2024, 10, 27, 0, 30);

    let verdict = evaluate(&set, utc(2025, 6, 1, 0, 0), 60, 5).unwrap();
    assert!(verdict.is_expired());
    assert_eq!(verdict.expires_at(), &expected);

    assert!(evaluate(&set, expected, 60, 5).unwrap().is_expired());
    let just_before = expected - TimeDelta::seconds(1);
    assert!(!evaluate(&set, just_before, 60, 5).unwrap().is_expired());
  }

  #[test]
  fn notify_window_edge_in_spring_forward_gap() {
    // Expires 2024-04-05 02:30 CEST; five days earlier is inside the gap and
    // resolves to 2024-03-31 01:30 UTC.
    let set = berlin(2024, 2, 5, 2, 30);
    let edge = utc(2024, 3, 31, 1, 30);

    assert_eq!(evaluate(&set, edge - TimeDelta::seconds(1), 60, 5), None);
    assert_eq!(evaluate(&set, edge, 60, 5), None);
    let verdict = evaluate(&set, edge + TimeDelta::seconds(1), 60, 5).unwrap();
    assert_eq!(verdict.expires_at(), &berlin(2024, 4, 5, 2, 30));
    assert!(!verdict.is_expired());
  }

  #[test]
  fn notify_window_edge_in_fall_back_overlap() {
    // Expires 2024-11-01 02:30 CET; five days earlier is the ambiguous
    // 2024-10-27 02:30, whose earlier instant is 00:30 UTC.
    let set = berlin(2024, 9, 2, 2, 30);
    let edge = utc(2024, 10, 27, 0, 30);

    assert_eq!(evaluate(&set, edge, 60, 5), None);
    assert!(evaluate(&set, edge + TimeDelta::seconds(1), 60, 5).is_some());
  }

  #[test]
  fn policy_delegates() {
    let policy = ExpirationPolicy::default();
    assert_eq!(
      policy.evaluate(&last_set(), days_after(60)),
      evaluate(&last_set(), days_after(60), 60, 5)
    );
  }
}
