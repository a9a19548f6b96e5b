//! `HH:MM:SS` timecodes.
//!
//! Every view of a flight (timeline, video, map, telemetry charts) exchanges
//! the playback position in this textual form. Hours are not wrapped at 24,
//! so a 25 hour log renders as `25:03:10`.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const SECS_PER_HOUR: u64 = 3600;
const SECS_PER_MINUTE: u64 = 60;

/// Parse `H:M:S` into total seconds.
///
/// Accepts exactly three colon-separated unsigned integer fields. Field
/// ranges are not checked here; use [`is_well_formed`] for that.
pub fn time_to_seconds(s: &str) -> Result<u64> {
    let invalid = || CoreError::InvalidTimestamp(s.to_string());

    let mut fields = s.split(':');
    let (Some(h), Some(m), Some(sec), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(invalid());
    };

    let parse = |field: &str| -> Result<u64> {
        if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        field.parse::<u64>().map_err(|_| invalid())
    };

    let (h, m, sec) = (parse(h)?, parse(m)?, parse(sec)?);
    h.checked_mul(SECS_PER_HOUR)
        .zip(m.checked_mul(SECS_PER_MINUTE))
        .and_then(|(hours, minutes)| hours.checked_add(minutes))
        .and_then(|hm| hm.checked_add(sec))
        .ok_or_else(invalid)
}

/// Format total seconds as zero-padded `HH:MM:SS`.
pub fn seconds_to_time(n: u64) -> String {
    let h = n / SECS_PER_HOUR;
    let m = (n % SECS_PER_HOUR) / SECS_PER_MINUTE;
    let s = n % SECS_PER_MINUTE;
    format!("{h:02}:{m:02}:{s:02}")
}

/// True when `s` matches `^\d{1,}:[0-5]\d:[0-5]\d$`.
pub fn is_well_formed(s: &str) -> bool {
    let mut fields = s.split(':');
    let (Some(h), Some(m), Some(sec), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return false;
    };

    let sexagesimal = |field: &str| {
        let b = field.as_bytes();
        b.len() == 2 && (b'0'..=b'5').contains(&b[0]) && b[1].is_ascii_digit()
    };

    !h.is_empty() && h.bytes().all(|b| b.is_ascii_digit()) && sexagesimal(m) && sexagesimal(sec)
}

/// A flight-relative offset in whole seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timecode(u64);

impl Timecode {
    pub const ZERO: Timecode = Timecode(0);

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub const fn as_secs(self) -> u64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64
    }

    /// Parse input that must satisfy [`is_well_formed`].
    pub fn parse_strict(s: &str) -> Result<Self> {
        if !is_well_formed(s) {
            return Err(CoreError::InvalidTimestamp(s.to_string()));
        }
        time_to_seconds(s).map(Self)
    }

    /// Parse any three-field `H:M:S`, normalising out-of-range fields.
    pub fn parse_lenient(s: &str) -> Result<Self> {
        time_to_seconds(s).map(Self)
    }

    pub fn saturating_add_secs(self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    pub fn saturating_sub_secs(self, secs: u64) -> Self {
        Self(self.0.saturating_sub(secs))
    }

    pub fn clamp_to(self, upper: Timecode) -> Self {
        Self(self.0.min(upper.0))
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&seconds_to_time(self.0))
    }
}

impl FromStr for Timecode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_strict(s)
    }
}

impl From<u64> for Timecode {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

impl Serialize for Timecode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timecode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Timecode::parse_strict(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_seconds_through_text() {
        for n in [0, 1, 59, 60, 61, 3599, 3600, 3661, 86_399, 86_400, 90_190, 400_000] {
            let text = seconds_to_time(n);
            assert_eq!(time_to_seconds(&text).unwrap(), n, "round trip of {n} via {text}");
        }
    }

    #[test]
    fn round_trips_well_formed_text() {
        for s in ["00:00:00", "00:12:34", "01:00:00", "23:59:59", "25:03:10", "120:00:01"] {
            assert!(is_well_formed(s));
            assert_eq!(seconds_to_time(time_to_seconds(s).unwrap()), s);
        }
    }

    #[test]
    fn hours_are_not_wrapped() {
        assert_eq!(seconds_to_time(25 * 3600 + 3 * 60 + 10), "25:03:10");
    }

    #[test]
    fn rejects_malformed_input() {
        for s in ["", "12:00", "1:2:3:4", "aa:00:00", "00:-1:00", "00:00:", " 00:00:00", "1.5:00:00"] {
            assert!(time_to_seconds(s).is_err(), "{s:?} should not parse");
        }
    }

    #[test]
    fn lenient_parse_does_not_range_check() {
        assert_eq!(time_to_seconds("0:75:00").unwrap(), 75 * 60);
        assert!(!is_well_formed("0:75:00"));
        assert!(Timecode::parse_strict("0:75:00").is_err());
    }

    #[test]
    fn well_formed_pattern() {
        assert!(is_well_formed("0:00:00"));
        assert!(is_well_formed("100:59:59"));
        assert!(!is_well_formed("00:60:00"));
        assert!(!is_well_formed("00:00:6"));
        assert!(!is_well_formed(":00:00"));
        assert!(!is_well_formed("00:00:00:00"));
    }

    #[test]
    fn serializes_as_text() {
        let tc = Timecode::from_secs(754);
        assert_eq!(serde_json::to_string(&tc).unwrap(), "\"00:12:34\"");
        let back: Timecode = serde_json::from_str("\"00:12:34\"").unwrap();
        assert_eq!(back, tc);
        assert!(serde_json::from_str::<Timecode>("\"12:34\"").is_err());
    }

    #[test]
    fn saturating_helpers() {
        let tc = Timecode::from_secs(10);
        assert_eq!(tc.saturating_sub_secs(30), Timecode::ZERO);
        assert_eq!(tc.saturating_add_secs(30).clamp_to(Timecode::from_secs(25)).as_secs(), 25);
    }
}
