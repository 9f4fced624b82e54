// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Timestamp parsing, ISO week bucketing, day differences and man page rendering
// role: utilities/helpers
// inputs: API timestamp strings; chrono DateTime values; clap CommandFactory
// outputs: Parsed DateTime<FixedOffset>, 2-digit week labels, day counts, man page text
// invariants:
// - Week labels are ISO weeks of the timestamp in its own offset, always 2 digits
// - Whole-day differences floor toward negative infinity
// - Minute-precision differences drop partial minutes before dividing into days
// errors: Unparseable timestamps yield None; callers decide how to surface them
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use clap::CommandFactory;

const SECONDS_PER_DAY: i64 = 86_400;
const MINUTES_PER_DAY: f64 = 1_440.0;

/// Parse an API timestamp.
///
/// Accepts RFC3339 (`2020-10-26T10:00:00.123Z`, `...+02:00`); timestamps
/// without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
  let raw = raw.trim();

  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(dt);
  }

  ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .map(|naive| naive.and_utc().fixed_offset())
}

/// ISO-8601 week number, zero padded ("01".."53").
pub fn iso_week(dt: &DateTime<FixedOffset>) -> String {
  dt.format("%V").to_string()
}

/// Whole days elapsed from `start` to `end`, floored.
pub fn elapsed_days(start: &DateTime<FixedOffset>, end: &DateTime<FixedOffset>) -> f64 {
  let secs = (*end - *start).num_seconds();
  secs.div_euclid(SECONDS_PER_DAY) as f64
}

/// Fractional days elapsed from `start` to `end` at whole-minute precision.
pub fn elapsed_days_by_minute(start: &DateTime<FixedOffset>, end: &DateTime<FixedOffset>) -> f64 {
  let secs = (*end - *start).num_seconds();
  secs.div_euclid(60) as f64 / MINUTES_PER_DAY
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> anyhow::Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
