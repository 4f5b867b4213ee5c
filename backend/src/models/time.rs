use serde::*;
use std::fmt;

use crate::constants::{J2000_JD, SECONDS_PER_DAY};
use crate::error::{PipelineError, PipelineResult};

/// Ephemeris time: TDB seconds past J2000 (2000-01-01 12:00:00 TDB).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct EphemerisTime(f64);

impl EphemerisTime {
    /// Create a new ephemeris time value.
    pub fn new(seconds: f64) -> Self {
        Self(seconds)
    }

    /// Raw seconds past J2000.
    pub fn seconds(&self) -> f64 {
        self.0
    }

    /// Julian date in the TDB scale.
    pub fn julian_date(&self) -> f64 {
        J2000_JD + self.0 / SECONDS_PER_DAY
    }

    /// Days elapsed since J2000.
    pub fn days_since_j2000(&self) -> f64 {
        self.0 / SECONDS_PER_DAY
    }

    /// Shift by a (possibly fractional or negative) number of days.
    pub fn offset_days(&self, days: f64) -> Self {
        Self(self.0 + days * SECONDS_PER_DAY)
    }
}

impl From<f64> for EphemerisTime {
    fn from(v: f64) -> Self {
        EphemerisTime::new(v)
    }
}

/// Calendar era.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Era {
    #[serde(rename = "BC")]
    BeforeChrist,
    #[serde(rename = "AD")]
    AnnoDomini,
}

impl Era {
    /// Token used by the ephemeris formatter.
    pub fn token(&self) -> &'static str {
        match self {
            Era::BeforeChrist => "B.C.",
            Era::AnnoDomini => "A.D.",
        }
    }

    /// Classify a formatter era token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "B.C." | "BC" => Some(Era::BeforeChrist),
            "A.D." | "AD" => Some(Era::AnnoDomini),
            _ => None,
        }
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Calendar label of a day, in historical (era + year >= 1) numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarLabel {
    pub era: Era,
    pub year: u32,
    pub month: u8,
    pub day: u8,
}

impl CalendarLabel {
    pub fn new(era: Era, year: u32, month: u8, day: u8) -> Self {
        Self {
            era,
            year,
            month,
            day,
        }
    }

    /// Build from an astronomical year (year 0 = 1 B.C., year -1 = 2 B.C.).
    /// Years beyond the label range saturate at `u32::MAX`.
    pub fn from_astronomical(year: i64, month: u8, day: u8) -> Self {
        Self::try_from_astronomical(year, month, day).unwrap_or_else(|| {
            let era = if year >= 1 { Era::AnnoDomini } else { Era::BeforeChrist };
            Self::new(era, u32::MAX, month, day)
        })
    }

    /// Like [`Self::from_astronomical`], but `None` when the era year does
    /// not fit a label.
    pub fn try_from_astronomical(year: i64, month: u8, day: u8) -> Option<Self> {
        if year >= 1 {
            let year = u32::try_from(year).ok()?;
            Some(Self::new(Era::AnnoDomini, year, month, day))
        } else {
            let year = u32::try_from(1i64.checked_sub(year)?).ok()?;
            Some(Self::new(Era::BeforeChrist, year, month, day))
        }
    }

    /// Astronomical year number.
    pub fn astronomical_year(&self) -> i64 {
        match self.era {
            Era::AnnoDomini => self.year as i64,
            Era::BeforeChrist => 1 - self.year as i64,
        }
    }

    /// Ordering key that respects the era.
    pub fn sort_key(&self) -> (i64, u8, u8) {
        (self.astronomical_year(), self.month, self.day)
    }
}

/// Renders the label persisted next to each record: `2024 03 15` or `44 B.C. 03 15`.
impl fmt::Display for CalendarLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.era {
            Era::AnnoDomini => write!(f, "{} {:02} {:02}", self.year, self.month, self.day),
            Era::BeforeChrist => write!(
                f,
                "{} B.C. {:02} {:02}",
                self.year, self.month, self.day
            ),
        }
    }
}

/// A physical instant carried in both representations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub et: EphemerisTime,
    pub label: CalendarLabel,
}

/// Inclusive date range walked by the streaming batcher.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: CalendarLabel,
    pub end: CalendarLabel,
    pub step_days: f64,
}

impl DateRange {
    pub fn new(start: CalendarLabel, end: CalendarLabel, step_days: f64) -> Self {
        Self {
            start,
            end,
            step_days,
        }
    }

    /// A one-step range covering a single day.
    pub fn single_day(day: CalendarLabel) -> Self {
        Self::new(day, day, 1.0)
    }

    /// Reject non-positive steps and ranges that end before they start.
    pub fn validate(&self) -> PipelineResult<()> {
        if !self.step_days.is_finite() || self.step_days <= 0.0 {
            return Err(PipelineError::Configuration(format!(
                "step must be a positive number of days, got {}",
                self.step_days
            )));
        }
        if self.end.sort_key() < self.start.sort_key() {
            return Err(PipelineError::Configuration(format!(
                "range ends ({}) before it starts ({})",
                self.end, self.start
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_et_julian_date() {
        let et = EphemerisTime::new(0.0);
        assert_eq!(et.julian_date(), 2_451_545.0);
        assert_eq!(EphemerisTime::new(-43_200.0).julian_date(), 2_451_544.5);
    }

    #[test]
    fn test_et_offset_days() {
        let et = EphemerisTime::new(100.0).offset_days(2.0);
        assert_eq!(et.seconds(), 100.0 + 2.0 * 86_400.0);
        let back = et.offset_days(-2.0);
        assert_eq!(back.seconds(), 100.0);
    }

    #[test]
    fn test_era_tokens() {
        assert_eq!(Era::from_token("B.C."), Some(Era::BeforeChrist));
        assert_eq!(Era::from_token("A.D."), Some(Era::AnnoDomini));
        assert_eq!(Era::from_token("CE"), None);
        assert_eq!(Era::BeforeChrist.to_string(), "B.C.");
    }

    #[test]
    fn test_astronomical_year_has_no_year_zero_in_labels() {
        let one_bc = CalendarLabel::from_astronomical(0, 1, 1);
        assert_eq!(one_bc.era, Era::BeforeChrist);
        assert_eq!(one_bc.year, 1);

        let one_ad = CalendarLabel::from_astronomical(1, 1, 1);
        assert_eq!(one_ad.era, Era::AnnoDomini);
        assert_eq!(one_ad.year, 1);

        assert_eq!(CalendarLabel::new(Era::BeforeChrist, 13200, 1, 1).astronomical_year(), -13199);
    }

    #[test]
    fn test_out_of_range_years_do_not_wrap() {
        assert!(CalendarLabel::try_from_astronomical(4_294_967_297, 1, 1).is_none());
        assert!(CalendarLabel::try_from_astronomical(-4_294_967_296, 1, 1).is_none());
        assert!(CalendarLabel::try_from_astronomical(i64::MIN, 1, 1).is_none());

        let last = CalendarLabel::try_from_astronomical(-4_294_967_294, 1, 1).unwrap();
        assert_eq!(last.year, u32::MAX);
        assert_eq!(CalendarLabel::from_astronomical(i64::MAX, 1, 1).year, u32::MAX);
    }

    #[test]
    fn test_label_display() {
        assert_eq!(
            CalendarLabel::new(Era::AnnoDomini, 2024, 3, 5).to_string(),
            "2024 03 05"
        );
        assert_eq!(
            CalendarLabel::new(Era::AnnoDomini, 999, 12, 31).to_string(),
            "999 12 31"
        );
        assert_eq!(
            CalendarLabel::new(Era::BeforeChrist, 44, 3, 15).to_string(),
            "44 B.C. 03 15"
        );
    }

    #[test]
    fn test_sort_key_orders_across_eras() {
        let bc = CalendarLabel::new(Era::BeforeChrist, 1, 12, 31);
        let ad = CalendarLabel::new(Era::AnnoDomini, 1, 1, 1);
        assert!(bc.sort_key() < ad.sort_key());
    }

    #[test]
    fn test_range_validation() {
        let start = CalendarLabel::new(Era::BeforeChrist, 10, 1, 1);
        let end = CalendarLabel::new(Era::AnnoDomini, 10, 1, 1);
        assert!(DateRange::new(start, end, 1.0).validate().is_ok());
        assert!(DateRange::single_day(end).validate().is_ok());
        assert!(DateRange::new(start, end, 0.0).validate().is_err());
        assert!(DateRange::new(start, end, f64::NAN).validate().is_err());
        assert!(DateRange::new(end, start, 1.0).validate().is_err());
    }
}
