use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A timestamp as found in stored documents.
///
/// Documents written by different client versions carry the SDK's rich
/// timestamp object, plain epoch millis, or a date string. Anything else is
/// kept verbatim so a rewrite does not lose it, and compares as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Rich {
        seconds: i64,
        nanoseconds: i64,
    },
    /// The admin SDK's JSON spelling, written back as it was read.
    Underscored {
        #[serde(rename = "_seconds")]
        seconds: i64,
        #[serde(rename = "_nanoseconds")]
        nanoseconds: i64,
    },
    Millis(i64),
    FractionalMillis(f64),
    Text(String),
    Other(serde_json::Value),
}

impl Timestamp {
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn now_millis() -> Self {
        Self::Millis(Utc::now().timestamp_millis())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self::Rich {
            seconds: dt.timestamp(),
            nanoseconds: i64::from(dt.timestamp_subsec_nanos()),
        }
    }

    /// Epoch milliseconds, or `None` when the value is not comparable.
    pub fn to_millis(&self) -> Option<i64> {
        match self {
            Self::Rich {
                seconds,
                nanoseconds,
            }
            | Self::Underscored {
                seconds,
                nanoseconds,
            } => seconds
                .checked_mul(1000)
                .and_then(|ms| ms.checked_add(nanoseconds / 1_000_000)),
            Self::Millis(ms) => Some(*ms),
            Self::FractionalMillis(ms) if ms.is_finite() => Some(*ms as i64),
            Self::FractionalMillis(_) => None,
            Self::Text(s) => parse_date_str(s).map(|dt| dt.timestamp_millis()),
            Self::Other(_) => None,
        }
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        self.to_millis()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }
}

/// Parse the date strings older clients wrote. Strings without an offset are
/// read as UTC.
pub fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
