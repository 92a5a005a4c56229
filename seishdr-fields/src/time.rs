//! Calendar and time-system conversion.
//!
//! Instants are handled as integer microseconds counted from 0001-01-01
//! (proleptic Gregorian, `chrono`'s common era), so carrying between seconds,
//! minutes, hours, days and years is exact and symmetric for negative
//! offsets. Broken-down times are rounded to the millisecond; the exact
//! instant is kept alongside so later additions do not accumulate rounding.
//!
//! UTC ↔ TAI conversion is driven entirely by a [`LeapSecondTable`].

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::error::{FieldsError, Result};

pub const US_PER_MS: i64 = 1_000;
pub const US_PER_SECOND: i64 = 1_000_000;
pub const US_PER_DAY: i64 = 86_400_000_000;

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_DAY: i64 = 86_400_000;

/// Largest offset (in seconds) accepted before conversion to microseconds.
const MAX_OFFSET_SECONDS: f64 = 1.0e12;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Days in the months before each month of a common year.
const DAYS_BEFORE_MONTH: [u32; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// Why an absolute time could not be produced.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimeError {
    #[error("record has no valid reference time")]
    NoReferenceTime,
    #[error("time is not finite or outside the supported calendar")]
    OutOfRange,
}

/// Gregorian leap-year rule, valid for every `i32` year.
pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

pub fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// `month` must be in `1..=12`.
fn days_before_month(year: i32, month: u32) -> u32 {
    let leap_day = u32::from(month > 2 && is_leap_year(year));
    DAYS_BEFORE_MONTH[(month - 1) as usize] + leap_day
}

/// Expand a day-of-year into `(month, day)`.
///
/// Pure arithmetic on the Gregorian rules, so any `i32` year works, including
/// years outside `chrono`'s calendar. Returns `None` when `day_of_year` does
/// not exist in `year`.
pub fn to_calendar(day_of_year: u32, year: i32) -> Option<(u32, u32)> {
    if day_of_year == 0 || day_of_year > days_in_year(year) {
        return None;
    }
    let month = (1..=12)
        .rev()
        .find(|&month| days_before_month(year, month) < day_of_year)?;
    Some((month, day_of_year - days_before_month(year, month)))
}

/// Inverse of [`to_calendar`].
pub fn to_day_of_year(year: i32, month: u32, day: u32) -> Option<u32> {
    if !(1..=12).contains(&month) || day == 0 {
        return None;
    }
    let month_end = if month == 12 {
        days_in_year(year)
    } else {
        days_before_month(year, month + 1)
    };
    let day_of_year = days_before_month(year, month) + day;
    (day_of_year <= month_end).then_some(day_of_year)
}

/// Three-letter upper-case month name, `1` = `JAN`.
pub fn month_abbreviation(month: u32) -> Option<&'static str> {
    MONTH_ABBREVIATIONS.get(month.checked_sub(1)? as usize).copied()
}

fn date_us(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) * US_PER_DAY
}

fn seconds_to_us(seconds: f64) -> std::result::Result<i64, TimeError> {
    if !seconds.is_finite() || seconds.abs() > MAX_OFFSET_SECONDS {
        return Err(TimeError::OutOfRange);
    }
    Ok((seconds * US_PER_SECOND as f64).round() as i64)
}

/// The validated reference instant of one record.
///
/// Built from the six raw slots `[year, day-of-year, hour, minute, second,
/// millisecond]`. `second` may be 60 (a leap second).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReferenceTime {
    pub year: i32,
    pub day_of_year: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millisecond: u32,
}

impl ReferenceTime {
    /// Validate six raw slots. Any component that is non-finite, equal to
    /// `undefined`, fractional or out of range rejects the whole time.
    pub fn from_slots(slots: [f64; 6], undefined: f64) -> Option<Self> {
        const LIMITS: [(f64, f64); 6] = [
            (i32::MIN as f64, i32::MAX as f64),
            (1.0, 366.0),
            (0.0, 23.0),
            (0.0, 59.0),
            (0.0, 60.0),
            (0.0, 999.0),
        ];

        let valid = slots.iter().zip(LIMITS).all(|(&value, (lo, hi))| {
            value.is_finite()
                && value != undefined
                && value.fract() == 0.0
                && (lo..=hi).contains(&value)
        });
        if !valid {
            return None;
        }

        let time = Self {
            year: slots[0] as i32,
            day_of_year: slots[1] as u32,
            hour: slots[2] as u32,
            minute: slots[3] as u32,
            second: slots[4] as u32,
            millisecond: slots[5] as u32,
        };
        // Years outside chrono's calendar cannot be converted.
        time.date()?;
        Some(time)
    }

    /// `[year, day-of-year, hour, minute, seconds-with-fraction]`
    pub fn to_vector(&self) -> [f64; 5] {
        [
            f64::from(self.year),
            f64::from(self.day_of_year),
            f64::from(self.hour),
            f64::from(self.minute),
            f64::from(self.second) + f64::from(self.millisecond) / 1000.0,
        ]
    }

    /// The six raw slots this time was built from.
    pub fn to_slots(&self) -> [f64; 6] {
        [
            f64::from(self.year),
            f64::from(self.day_of_year),
            f64::from(self.hour),
            f64::from(self.minute),
            f64::from(self.second),
            f64::from(self.millisecond),
        ]
    }

    /// Calendar date; day 366 of a common year rolls into January 1st.
    /// Day 0 has no date.
    pub fn date(&self) -> Option<NaiveDate> {
        let days_after_first = self.day_of_year.checked_sub(1)?;
        NaiveDate::from_yo_opt(self.year, 1)?
            .checked_add_days(Days::new(u64::from(days_after_first)))
    }

    fn micros_of_day(&self) -> Option<i64> {
        let ms = ((i64::from(self.hour) * 60 + i64::from(self.minute)) * 60
            + i64::from(self.second))
            * MS_PER_SECOND
            + i64::from(self.millisecond);
        ms.checked_mul(US_PER_MS)
    }

    fn epoch_us(&self) -> Option<i64> {
        date_us(self.date()?).checked_add(self.micros_of_day()?)
    }

    /// The reference instant itself, normalized.
    pub fn instant(&self) -> std::result::Result<AbsoluteTime, TimeError> {
        utc_offset(self, 0.0)
    }
}

/// A fully broken-down instant, shown to the millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AbsoluteTime {
    year: i32,
    month: u32,
    day: u32,
    day_of_year: u32,
    hour: u32,
    minute: u32,
    second: u32,
    millisecond: u32,
    /// Day the instant is counted from.
    #[serde(skip)]
    basis: NaiveDate,
    /// Exact offset into `basis`; one day or more inside a leap second.
    #[serde(skip)]
    micros_of_day: i64,
}

impl AbsoluteTime {
    /// `micros_of_day` at or past [`US_PER_DAY`] lands in second 60 of 23:59.
    fn from_parts(
        basis: NaiveDate,
        micros_of_day: i64,
    ) -> std::result::Result<Self, TimeError> {
        let mut date = basis;
        let mut ms = (micros_of_day + US_PER_MS / 2).div_euclid(US_PER_MS);
        let (hour, minute, second, millisecond) = if micros_of_day >= US_PER_DAY {
            let leap = ms - MS_PER_DAY;
            (23, 59, 60 + leap / MS_PER_SECOND, leap % MS_PER_SECOND)
        } else {
            if ms == MS_PER_DAY {
                date = basis.succ_opt().ok_or(TimeError::OutOfRange)?;
                ms = 0;
            }
            (
                ms / 3_600_000,
                ms / 60_000 % 60,
                ms / MS_PER_SECOND % 60,
                ms % MS_PER_SECOND,
            )
        };
        Ok(Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
            day_of_year: date.ordinal(),
            hour: hour as u32,
            minute: minute as u32,
            second: second as u32,
            millisecond: millisecond as u32,
            basis,
            micros_of_day,
        })
    }

    fn from_epoch_us(us: i64) -> std::result::Result<Self, TimeError> {
        let days = i32::try_from(us.div_euclid(US_PER_DAY)).map_err(|_| TimeError::OutOfRange)?;
        let date = NaiveDate::from_num_days_from_ce_opt(days).ok_or(TimeError::OutOfRange)?;
        Self::from_parts(date, us.rem_euclid(US_PER_DAY))
    }

    fn epoch_us(&self) -> std::result::Result<i64, TimeError> {
        date_us(self.basis)
            .checked_add(self.micros_of_day)
            .ok_or(TimeError::OutOfRange)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn day_of_year(&self) -> u32 {
        self.day_of_year
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// 60 inside an inserted leap second.
    pub fn second(&self) -> u32 {
        self.second
    }

    pub fn millisecond(&self) -> u32 {
        self.millisecond
    }

    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }

    /// Add seconds with plain calendar normalization (no leap seconds).
    pub fn add_seconds(&self, seconds: f64) -> std::result::Result<Self, TimeError> {
        let end = self
            .epoch_us()?
            .checked_add(seconds_to_us(seconds)?)
            .ok_or(TimeError::OutOfRange)?;
        Self::from_epoch_us(end)
    }

    pub fn seconds(&self) -> f64 {
        f64::from(self.second) + f64::from(self.millisecond) / 1000.0
    }

    /// `[year, day-of-year, hour, minute, seconds]`
    pub fn day_of_year_vector(&self) -> [f64; 5] {
        [
            f64::from(self.year),
            f64::from(self.day_of_year),
            f64::from(self.hour),
            f64::from(self.minute),
            self.seconds(),
        ]
    }

    /// `[year, month, day, hour, minute, seconds]`
    pub fn calendar_vector(&self) -> [f64; 6] {
        [
            f64::from(self.year),
            f64::from(self.month),
            f64::from(self.day),
            f64::from(self.hour),
            f64::from(self.minute),
            self.seconds(),
        ]
    }

    /// `HH:MM:SS.mmm`
    pub fn clock(&self) -> String {
        format!(
            "{:02}:{:02}:{:02}.{:03}",
            self.hour, self.minute, self.second, self.millisecond
        )
    }

    /// `YYYY-MM-DD (JJJ) HH:MM:SS.mmm`
    pub fn format_day_of_year(&self) -> String {
        format!(
            "{:04}-{:02}-{:02} ({:03}) {}",
            self.year,
            self.month,
            self.day,
            self.day_of_year,
            self.clock()
        )
    }

    /// `YYYY-MM-DD HH:MM:SS.mmm`
    pub fn format_calendar(&self) -> String {
        format!(
            "{:04}-{:02}-{:02} {}",
            self.year,
            self.month,
            self.day,
            self.clock()
        )
    }
}

impl std::fmt::Display for AbsoluteTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_day_of_year())
    }
}

/// Add `offset_seconds` to a reference time with plain carrying.
pub fn utc_offset(
    reference: &ReferenceTime,
    offset_seconds: f64,
) -> std::result::Result<AbsoluteTime, TimeError> {
    let start = reference.epoch_us().ok_or(TimeError::OutOfRange)?;
    let end = start
        .checked_add(seconds_to_us(offset_seconds)?)
        .ok_or(TimeError::OutOfRange)?;
    AbsoluteTime::from_epoch_us(end)
}

/// Move the reference time into TAI, then add `offset_seconds` in that
/// uniform scale.
pub fn tai_offset(
    reference: &ReferenceTime,
    offset_seconds: f64,
    table: &LeapSecondTable,
) -> std::result::Result<AbsoluteTime, TimeError> {
    let date = reference.date().ok_or(TimeError::OutOfRange)?;
    let micros_of_day = reference.micros_of_day().ok_or(TimeError::OutOfRange)?;
    let end = table
        .utc_us_to_tai_us(date, micros_of_day)
        .and_then(|start| start.checked_add(seconds_to_us(offset_seconds).ok()?))
        .ok_or(TimeError::OutOfRange)?;
    AbsoluteTime::from_epoch_us(end)
}

/// One row of the leap-second table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeapSecond {
    /// First UTC day on which `tai_minus_utc` applies.
    pub date: NaiveDate,
    pub tai_minus_utc: i32,
}

/// Cumulative TAI − UTC offsets, sorted by date.
///
/// Dates before the first row use the first row's offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeapSecondTable {
    entries: Vec<LeapSecond>,
}

const BUILTIN_LEAP_SECONDS: [(i32, u32, i32); 28] = [
    (1972, 1, 10),
    (1972, 7, 11),
    (1973, 1, 12),
    (1974, 1, 13),
    (1975, 1, 14),
    (1976, 1, 15),
    (1977, 1, 16),
    (1978, 1, 17),
    (1979, 1, 18),
    (1980, 1, 19),
    (1981, 7, 20),
    (1982, 7, 21),
    (1983, 7, 22),
    (1985, 7, 23),
    (1988, 1, 24),
    (1990, 1, 25),
    (1991, 1, 26),
    (1992, 7, 27),
    (1993, 7, 28),
    (1994, 7, 29),
    (1996, 1, 30),
    (1997, 7, 31),
    (1999, 1, 32),
    (2006, 1, 33),
    (2009, 1, 34),
    (2012, 7, 35),
    (2015, 7, 36),
    (2017, 1, 37),
];

impl LeapSecondTable {
    /// Build a table from rows with strictly increasing dates.
    pub fn new(entries: Vec<LeapSecond>) -> Result<Self> {
        if entries.is_empty() {
            return Err(FieldsError::InvalidLeapSecondTable {
                message: "table has no rows".into(),
            });
        }
        if let Some(pair) = entries.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(FieldsError::InvalidLeapSecondTable {
                message: format!("{} does not follow {}", pair[1].date, pair[0].date),
            });
        }
        Ok(Self { entries })
    }

    /// Offsets published through 2017-01-01 (TAI − UTC = 37 s).
    pub fn builtin() -> Self {
        let entries = BUILTIN_LEAP_SECONDS
            .iter()
            .filter_map(|&(year, month, tai_minus_utc)| {
                NaiveDate::from_ymd_opt(year, month, 1).map(|date| LeapSecond {
                    date,
                    tai_minus_utc,
                })
            })
            .collect();
        Self { entries }
    }

    /// The configured table, or the built-in one when none is configured.
    pub fn from_config(config: &seishdr_config::ResolverConfig) -> Result<Self> {
        let rows = config.leap_second_rows()?;
        if rows.is_empty() {
            return Ok(Self::builtin());
        }
        Self::new(
            rows.into_iter()
                .map(|(date, tai_minus_utc)| LeapSecond {
                    date,
                    tai_minus_utc,
                })
                .collect(),
        )
    }

    pub fn entries(&self) -> &[LeapSecond] {
        &self.entries
    }

    /// TAI − UTC in seconds on a UTC date.
    pub fn tai_minus_utc(&self, date: NaiveDate) -> i32 {
        let idx = self.entries.partition_point(|e| e.date <= date);
        self.entries[idx.saturating_sub(1)].tai_minus_utc
    }

    fn utc_us_to_tai_us(&self, date: NaiveDate, micros_of_day: i64) -> Option<i64> {
        let offset = i64::from(self.tai_minus_utc(date)) * US_PER_SECOND;
        date_us(date).checked_add(micros_of_day)?.checked_add(offset)
    }

    pub fn utc_to_tai(&self, utc: &AbsoluteTime) -> std::result::Result<AbsoluteTime, TimeError> {
        let tai = self
            .utc_us_to_tai_us(utc.basis, utc.micros_of_day)
            .ok_or(TimeError::OutOfRange)?;
        AbsoluteTime::from_epoch_us(tai)
    }

    /// Convert TAI to UTC. Instants inside an inserted leap second come back
    /// as second 60 of the last minute of the preceding day.
    pub fn tai_to_utc(&self, tai: &AbsoluteTime) -> std::result::Result<AbsoluteTime, TimeError> {
        let tai_us = tai.epoch_us()?;

        for (idx, entry) in self.entries.iter().enumerate().rev() {
            let offset = i64::from(entry.tai_minus_utc) * US_PER_SECOND;
            let start = date_us(entry.date) + offset;
            if tai_us >= start {
                return AbsoluteTime::from_epoch_us(tai_us - offset);
            }
            if idx == 0 {
                break;
            }
            let inserted = offset - i64::from(self.entries[idx - 1].tai_minus_utc) * US_PER_SECOND;
            if inserted > 0 && tai_us >= start - inserted {
                let into_leap = tai_us - (start - inserted);
                // The last half millisecond shows as midnight of the next day.
                if (into_leap + US_PER_MS / 2) / US_PER_MS >= inserted / US_PER_MS {
                    return AbsoluteTime::from_epoch_us(tai_us - offset);
                }
                let day = entry.date.pred_opt().ok_or(TimeError::OutOfRange)?;
                return AbsoluteTime::from_parts(day, US_PER_DAY + into_leap);
            }
        }

        let offset = i64::from(self.entries[0].tai_minus_utc) * US_PER_SECOND;
        AbsoluteTime::from_epoch_us(tai_us - offset)
    }
}

impl Default for LeapSecondTable {
    fn default() -> Self {
        Self::builtin()
    }
}
