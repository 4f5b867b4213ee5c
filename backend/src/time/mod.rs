//! Conversion between ephemeris time and calendar labels.
//!
//! Ephemeris time is counted in TDB seconds from J2000. Calendar labels are
//! taken in the same time scale, so a label always names the TDB day that
//! contains the instant and day-aligned instants convert back exactly.

pub mod calendar;
pub mod format;

use crate::constants::SECONDS_PER_DAY;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{CalendarLabel, EphemerisTime, TimePoint};

use calendar::{calendar_from_jdn, days_in_month, in_reform_gap, jdn_from_calendar, J2000_JDN};

pub use format::{
    format_calendar, month_number, month_token, parse_calendar_label, parse_date_argument,
};

/// Seconds between 2000-01-01 00:00 TDB and J2000.
const HALF_DAY_SECONDS: f64 = SECONDS_PER_DAY / 2.0;

/// Split an ephemeris time into the Julian day number of its calendar day and
/// the whole seconds elapsed since that day's midnight.
pub(crate) fn split_ephemeris_time(et: EphemerisTime) -> (i64, i64) {
    let since_midnight_2000 = (et.seconds() + HALF_DAY_SECONDS).round() as i64;
    let seconds_per_day = SECONDS_PER_DAY as i64;
    let day = since_midnight_2000.div_euclid(seconds_per_day);
    let seconds_of_day = since_midnight_2000.rem_euclid(seconds_per_day);
    (J2000_JDN + day, seconds_of_day)
}

/// Calendar label of the day containing `et`.
pub fn to_calendar(et: EphemerisTime) -> CalendarLabel {
    let (jdn, _) = split_ephemeris_time(et);
    let (year, month, day) = calendar_from_jdn(jdn);
    CalendarLabel::from_astronomical(year, month, day)
}

/// Ephemeris time at midnight (TDB) starting the labelled day.
pub fn to_ephemeris_time(label: &CalendarLabel) -> PipelineResult<EphemerisTime> {
    validate_label(label)?;
    let jdn = jdn_from_calendar(label.astronomical_year(), label.month, label.day);
    let days = (jdn - J2000_JDN) as f64;
    Ok(EphemerisTime::new(days * SECONDS_PER_DAY - HALF_DAY_SECONDS))
}

/// Advance an ephemeris time by a number of days.
pub fn step_forward(et: EphemerisTime, days: f64) -> EphemerisTime {
    et.offset_days(days)
}

/// Both representations of the instant `et`.
pub fn time_point(et: EphemerisTime) -> TimePoint {
    TimePoint {
        et,
        label: to_calendar(et),
    }
}

/// Check that a label names a day that exists on the mixed calendar.
pub fn validate_label(label: &CalendarLabel) -> PipelineResult<()> {
    let text = label.to_string();
    if label.year == 0 {
        return Err(PipelineError::MalformedTimeLabel {
            label: text,
            reason: "there is no year zero".to_string(),
        });
    }

    let year = label.astronomical_year();
    let max_day = days_in_month(year, label.month).ok_or_else(|| {
        PipelineError::MalformedTimeLabel {
            label: text.clone(),
            reason: format!("month {} out of range", label.month),
        }
    })?;

    if label.day == 0 || label.day > max_day {
        return Err(PipelineError::MalformedTimeLabel {
            label: text,
            reason: format!("day {} out of range for month {}", label.day, label.month),
        });
    }

    if in_reform_gap(year, label.month, label.day) {
        return Err(PipelineError::MalformedTimeLabel {
            label: text,
            reason: "date falls in the 1582 calendar reform gap".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
#[path = "time_tests.rs"]
mod time_tests;
