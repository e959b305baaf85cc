//! Indicator interval and series size definitions.
//!
//! This module defines [`Interval`] for the sampling interval of technical
//! indicators and [`OutputSize`] for the length of daily price series.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sampling interval of a technical-indicator series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    /// One-minute samples.
    OneMinute,
    /// Five-minute samples.
    FiveMinute,
    /// Fifteen-minute samples.
    FifteenMinute,
    /// Thirty-minute samples.
    ThirtyMinute,
    /// Hourly samples.
    Hourly,
    /// Daily samples.
    #[default]
    Daily,
    /// Weekly samples.
    Weekly,
    /// Monthly samples.
    Monthly,
}

impl Interval {
    /// Returns the upstream wire name of this interval.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinute => "1min",
            Self::FiveMinute => "5min",
            Self::FifteenMinute => "15min",
            Self::ThirtyMinute => "30min",
            Self::Hourly => "60min",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Returns true if this is an intraday interval (one minute through hourly).
    #[must_use]
    pub const fn is_intraday(&self) -> bool {
        matches!(
            self,
            Self::OneMinute
                | Self::FiveMinute
                | Self::FifteenMinute
                | Self::ThirtyMinute
                | Self::Hourly
        )
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Length of a daily price series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputSize {
    /// The latest 100 data points.
    #[default]
    Compact,
    /// The full available history.
    Full,
}

impl OutputSize {
    /// Returns the upstream wire name of this size.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for OutputSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_wire_names() {
        assert_eq!(Interval::default().as_str(), "daily");
        assert_eq!(Interval::Hourly.to_string(), "60min");
        assert!(Interval::FiveMinute.is_intraday());
        assert!(!Interval::Weekly.is_intraday());
    }

    #[test]
    fn test_output_size_wire_names() {
        assert_eq!(OutputSize::default().to_string(), "compact");
        assert_eq!(OutputSize::Full.as_str(), "full");
    }
}
