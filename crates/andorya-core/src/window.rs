//! Lookback windows for "last N minutes/hours" chart views.

use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::TelemetryError;

/// Milliseconds since the Unix epoch, saturating to 0 before 1970.
pub fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// A chart lookback range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Window {
    #[default]
    Hour,
    SixHours,
    Day,
    Week,
    Minutes(u64),
}

impl Window {
    /// The presets offered by the dashboard range picker.
    pub const PRESETS: [Window; 4] = [Window::Hour, Window::SixHours, Window::Day, Window::Week];

    /// Largest window whose span still fits in a millisecond `u64`.
    pub const MAX_MINUTES: u64 = u64::MAX / 60_000;

    pub fn minutes(self) -> u64 {
        match self {
            Self::Hour => 60,
            Self::SixHours => 360,
            Self::Day => 1440,
            Self::Week => 10_080,
            Self::Minutes(m) => m,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::from_secs(self.minutes().saturating_mul(60))
    }

    /// Inclusive lower bound for a `query` ending at `now_ms`.
    pub fn since(self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.minutes().saturating_mul(60_000))
    }

    /// Next preset, wrapping around. Custom windows restart at one hour.
    pub fn next(self) -> Self {
        match self {
            Self::Hour => Self::SixHours,
            Self::SixHours => Self::Day,
            Self::Day => Self::Week,
            Self::Week | Self::Minutes(_) => Self::Hour,
        }
    }

    pub fn label(self) -> String {
        match self {
            Self::Hour => "1H".to_string(),
            Self::SixHours => "6H".to_string(),
            Self::Day => "24H".to_string(),
            Self::Week => "7D".to_string(),
            Self::Minutes(m) => format!("{m}M"),
        }
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hour => write!(f, "1h"),
            Self::SixHours => write!(f, "6h"),
            Self::Day => write!(f, "24h"),
            Self::Week => write!(f, "7d"),
            Self::Minutes(m) => write!(f, "{m}m"),
        }
    }
}

impl FromStr for Window {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_ascii_lowercase();
        let invalid = || TelemetryError::InvalidWindow(s.to_string());
        let split = raw
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (digits, unit) = raw.split_at(split);
        let n: u64 = digits.parse().map_err(|_| invalid())?;
        if n == 0 {
            return Err(invalid());
        }
        let minutes = match unit {
            "m" | "min" => n,
            "h" => n.checked_mul(60).ok_or_else(invalid)?,
            "d" => n.checked_mul(1440).ok_or_else(invalid)?,
            _ => return Err(invalid()),
        };
        if minutes > Self::MAX_MINUTES {
            return Err(invalid());
        }
        Ok(match minutes {
            60 => Self::Hour,
            360 => Self::SixHours,
            1440 => Self::Day,
            10_080 => Self::Week,
            m => Self::Minutes(m),
        })
    }
}

impl TryFrom<String> for Window {
    type Error = TelemetryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Window> for String {
    fn from(w: Window) -> Self {
        w.to_string()
    }
}
