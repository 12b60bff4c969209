use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Resolve a timezone setting to a [`Tz`].
///
/// `"auto"` resolves to the system timezone. Unknown names fall back to UTC
/// with a warning.
pub fn resolve_timezone(name: &str) -> Tz {
    let name = if name == "auto" {
        get_system_timezone()
    } else {
        name.to_string()
    };
    name.parse::<Tz>().unwrap_or_else(|_| {
        warn!("unrecognised timezone \"{}\", falling back to UTC", name);
        Tz::UTC
    })
}

// ── TimestampParser ───────────────────────────────────────────────────────────

/// Naive date-time layouts tried in order, after RFC 3339 and RFC 2822.
///
/// Slash-separated dates are month-first, as Google Forms writes them by
/// default (`1/15/2024 10:23:45`). Day-first layouts come last and only match
/// when the first field cannot be a month.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%b %d, %Y %H:%M:%S",
    "%b %d, %Y %H:%M",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%d/%m/%Y",
];

/// Parses the free-form timestamp strings found in the fuel log.
///
/// Strings carrying an explicit offset are honoured as-is; naive date-times
/// and bare dates are interpreted in the parser's timezone.
#[derive(Debug, Clone, Copy)]
pub struct TimestampParser {
    tz: Tz,
}

impl Default for TimestampParser {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl TimestampParser {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Parse `s` into a UTC instant, or `None` when no layout matches.
    pub fn parse(&self, s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        let normalised = match s.strip_suffix('Z') {
            Some(stripped) => format!("{}+00:00", stripped),
            None => s.to_string(),
        };
        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
            return Some(dt.with_timezone(&Utc));
        }

        for fmt in DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return self.localise(naive);
            }
        }
        for fmt in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
                return self.localise(date.and_hms_opt(0, 0, 0)?);
            }
        }

        debug!("could not parse timestamp \"{}\"", s);
        None
    }

    /// Interpret `naive` as wall-clock time in the parser's timezone.
    ///
    /// Ambiguous times (DST fall-back) resolve to the earlier instant; times
    /// inside a DST gap do not exist and yield `None`.
    fn localise(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

// ── Calendar bucketing ────────────────────────────────────────────────────────

/// `"YYYY-MM"` month key of `ts` in `tz`.
///
/// Lexicographic order of these keys coincides with chronological order.
pub fn month_key(ts: DateTime<Utc>, tz: Tz) -> String {
    ts.with_timezone(&tz).format("%Y-%m").to_string()
}

/// Calendar year of `ts` in `tz`.
pub fn year_of(ts: DateTime<Utc>, tz: Tz) -> i32 {
    ts.with_timezone(&tz).year()
}

/// `true` when `ts` and `now` fall in the same calendar month (and year) in `tz`.
pub fn is_same_month(ts: DateTime<Utc>, now: DateTime<Utc>, tz: Tz) -> bool {
    let a = ts.with_timezone(&tz);
    let b = now.with_timezone(&tz);
    a.year() == b.year() && a.month() == b.month()
}

/// Split a `"YYYY-MM"` key into `(year, month)`.
pub fn split_month_key(key: &str) -> Option<(i32, u32)> {
    let (year, month) = key.split_once('-')?;
    let year = year.parse::<i32>().ok()?;
    let month = month.parse::<u32>().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    // ── TimestampParser ───────────────────────────────────────────────────────

    #[test]
    fn test_parse_date_only() {
        let parser = TimestampParser::default();
        assert_eq!(parser.parse("2024-01-15"), Some(utc(2024, 1, 15, 0, 0)));
    }

    #[test]
    fn test_parse_rfc3339_with_z() {
        let parser = TimestampParser::default();
        assert_eq!(
            parser.parse("2024-01-15T10:30:00Z"),
            Some(utc(2024, 1, 15, 10, 30))
        );
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let parser = TimestampParser::default();
        assert_eq!(
            parser.parse("2024-01-15T12:30:00+02:00"),
            Some(utc(2024, 1, 15, 10, 30))
        );
    }

    #[test]
    fn test_parse_forms_timestamp_month_first() {
        let parser = TimestampParser::default();
        assert_eq!(
            parser.parse("1/15/2024 10:23:45"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 23, 45).unwrap())
        );
        assert_eq!(parser.parse("2/15/2024 9:00"), Some(utc(2024, 2, 15, 9, 0)));
        assert_eq!(parser.parse("03/04/2024"), Some(utc(2024, 3, 4, 0, 0)));
    }

    #[test]
    fn test_parse_textual_month() {
        let parser = TimestampParser::default();
        assert_eq!(parser.parse("Jan 15, 2024"), Some(utc(2024, 1, 15, 0, 0)));
        assert_eq!(parser.parse("January 20, 2024"), Some(utc(2024, 1, 20, 0, 0)));
        assert_eq!(
            parser.parse("Mar 5, 2024 14:30"),
            Some(utc(2024, 3, 5, 14, 30))
        );
        assert_eq!(parser.parse("5 Mar 2024"), Some(utc(2024, 3, 5, 0, 0)));
    }

    #[test]
    fn test_parse_day_first_only_when_not_a_month() {
        let parser = TimestampParser::default();
        assert_eq!(
            parser.parse("15/01/2024 10:23:45"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 23, 45).unwrap())
        );
        assert_eq!(parser.parse("25/12/2023"), Some(utc(2023, 12, 25, 0, 0)));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let parser = TimestampParser::default();
        assert_eq!(parser.parse("  2024-02-01 "), Some(utc(2024, 2, 1, 0, 0)));
    }

    #[test]
    fn test_parse_naive_in_configured_timezone() {
        let parser = TimestampParser::new(chrono_tz::Europe::London);
        // BST is UTC+1 in July.
        assert_eq!(
            parser.parse("2024-07-01 09:00:00"),
            Some(utc(2024, 7, 1, 8, 0))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let parser = TimestampParser::default();
        assert_eq!(parser.parse("bad-date"), None);
        assert_eq!(parser.parse(""), None);
        assert_eq!(parser.parse("   "), None);
        assert_eq!(parser.parse("2024-13-01"), None);
    }

    // ── Calendar bucketing ────────────────────────────────────────────────────

    #[test]
    fn test_month_key_is_zero_padded() {
        assert_eq!(month_key(utc(2024, 3, 10, 0, 0), Tz::UTC), "2024-03");
        assert_eq!(month_key(utc(2023, 11, 1, 0, 0), Tz::UTC), "2023-11");
    }

    #[test]
    fn test_month_key_respects_timezone() {
        // 23:30 UTC on 31 March is already April in Berlin.
        let ts = utc(2024, 3, 31, 23, 30);
        assert_eq!(month_key(ts, Tz::UTC), "2024-03");
        assert_eq!(month_key(ts, chrono_tz::Europe::Berlin), "2024-04");
    }

    #[test]
    fn test_year_of() {
        assert_eq!(year_of(utc(2022, 12, 31, 12, 0), Tz::UTC), 2022);
    }

    #[test]
    fn test_is_same_month() {
        let now = utc(2024, 3, 15, 0, 0);
        assert!(is_same_month(utc(2024, 3, 1, 0, 0), now, Tz::UTC));
        assert!(!is_same_month(utc(2023, 3, 1, 0, 0), now, Tz::UTC));
        assert!(!is_same_month(utc(2024, 2, 29, 0, 0), now, Tz::UTC));
    }

    #[test]
    fn test_split_month_key() {
        assert_eq!(split_month_key("2024-03"), Some((2024, 3)));
        assert_eq!(split_month_key("2024-13"), None);
        assert_eq!(split_month_key("garbage"), None);
    }

    #[test]
    fn test_resolve_timezone_unknown_falls_back_to_utc() {
        assert_eq!(resolve_timezone("Mars/Olympus_Mons"), Tz::UTC);
        assert_eq!(resolve_timezone("Europe/London"), chrono_tz::Europe::London);
    }
}
