//! Configuration value types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ConfigResult;

/// Date format used by leap-second entries.
pub const LEAP_DATE_FORMAT: &str = "%Y-%m-%d";

/// What to render when a display string is wider than the requested width.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OversizePolicy {
    /// Keep the leading characters that fit.
    #[default]
    Truncate,
    /// Replace the whole string with the oversize marker.
    Marker,
}

/// One row of the leap-second table: from `date` (00:00:00 UTC) onward,
/// TAI is ahead of UTC by `tai_minus_utc` seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeapSecondEntry {
    pub date: String,
    pub tai_minus_utc: i32,
}

impl LeapSecondEntry {
    pub fn new(date: impl Into<String>, tai_minus_utc: i32) -> Self {
        Self {
            date: date.into(),
            tai_minus_utc,
        }
    }

    /// Parse `date` as `YYYY-MM-DD`.
    pub fn parsed_date(&self) -> ConfigResult<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, LEAP_DATE_FORMAT).map_err(|e| {
            ConfigError::validation(format!("leap-second date '{}': {}", self.date, e))
        })
    }
}

/// Settings consumed by the field resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Width every display string is padded or cut to. `None` leaves strings as-is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_width: Option<usize>,
    pub oversize: OversizePolicy,
    pub oversize_marker: String,
    /// Replacement leap-second table. Empty selects the built-in table.
    pub leap_seconds: Vec<LeapSecondEntry>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            display_width: None,
            oversize: OversizePolicy::Truncate,
            oversize_marker: "<oversized>".to_string(),
            leap_seconds: Vec::new(),
        }
    }
}

impl ResolverConfig {
    /// Check the values that serde cannot: widths, marker text and the
    /// ordering of the leap-second table.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.display_width == Some(0) {
            return Err(ConfigError::validation("display_width must be at least 1"));
        }
        if self.oversize == OversizePolicy::Marker && self.oversize_marker.is_empty() {
            return Err(ConfigError::validation(
                "oversize_marker must not be empty when oversize = marker",
            ));
        }

        let mut previous: Option<NaiveDate> = None;
        for entry in &self.leap_seconds {
            let date = entry.parsed_date()?;
            if let Some(prev) = previous {
                if date <= prev {
                    return Err(ConfigError::validation(format!(
                        "leap-second dates must strictly increase ({} follows {})",
                        date, prev
                    )));
                }
            }
            previous = Some(date);
        }
        Ok(())
    }

    /// Parsed leap-second rows, in table order.
    pub fn leap_second_rows(&self) -> ConfigResult<Vec<(NaiveDate, i32)>> {
        self.leap_seconds
            .iter()
            .map(|entry| Ok((entry.parsed_date()?, entry.tai_minus_utc)))
            .collect()
    }
}
