//! Reinterpretation of UTC instants in a named IANA zone.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::{Error, Result};

/// Resolve an IANA zone name such as `"Asia/Almaty"`.
pub fn resolve_zone(name: &str) -> Result<Tz> {
  name
    .parse::<Tz>()
    .map_err(|_| Error::InvalidTimezone(name.to_string()))
}

/// Express `instant` in the zone called `zone`. The instant itself does not
/// move; only its local representation changes.
pub fn to_local(instant: DateTime<Utc>, zone: &str) -> Result<DateTime<Tz>> {
  let tz = resolve_zone(zone)?;
  Ok(instant.with_timezone(&tz))
}
