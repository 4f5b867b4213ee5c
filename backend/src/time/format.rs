//! Text forms of calendar instants.
//!
//! The ephemeris formatter writes calendar strings as
//!
//! ```text
//! 2024 MAR 15 00:00:00            years 1000 A.D. and later
//! 999 A.D. MAR 15 00:00:00        years 1 to 999 A.D.
//! 13200 B.C. JAN 01 00:00:00      every B.C. year
//! ```
//!
//! so the month and day fields sit one position further right whenever the
//! label carries an era token. [`parse_calendar_label`] keeps that field
//! shift: labels marked B.C., or with a year token below 1000, read month and
//! day from the third and fourth fields.

use crate::error::{PipelineError, PipelineResult};
use crate::models::{CalendarLabel, EphemerisTime, Era};

use super::calendar::calendar_from_jdn;
use super::split_ephemeris_time;

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Month number for a three-letter month token.
pub fn month_number(token: &str) -> Option<u8> {
    let upper = token.to_ascii_uppercase();
    MONTHS
        .iter()
        .position(|m| *m == upper)
        .map(|idx| idx as u8 + 1)
}

/// Three-letter token for a month number.
pub fn month_token(month: u8) -> Option<&'static str> {
    MONTHS.get(month.checked_sub(1)? as usize).copied()
}

fn malformed(label: &str, reason: impl Into<String>) -> PipelineError {
    PipelineError::MalformedTimeLabel {
        label: label.to_string(),
        reason: reason.into(),
    }
}

/// Format an ephemeris time the way the ephemeris formatter does.
pub fn format_calendar(et: EphemerisTime) -> String {
    let (jdn, seconds_of_day) = split_ephemeris_time(et);
    let (year, month, day) = calendar_from_jdn(jdn);
    let label = CalendarLabel::from_astronomical(year, month, day);

    let hh = seconds_of_day / 3600;
    let mm = (seconds_of_day % 3600) / 60;
    let ss = seconds_of_day % 60;
    let mon = month_token(label.month).unwrap_or("???");

    match (label.era, label.year) {
        (Era::AnnoDomini, y) if y >= 1000 => {
            format!("{y} {mon} {:02} {hh:02}:{mm:02}:{ss:02}", label.day)
        }
        (era, y) => format!(
            "{y} {} {mon} {:02} {hh:02}:{mm:02}:{ss:02}",
            era.token(),
            label.day
        ),
    }
}

/// Parse a formatter calendar string into a label.
pub fn parse_calendar_label(text: &str) -> PipelineResult<CalendarLabel> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(malformed(text, "expected year, month and day fields"));
    }

    let year: u32 = parts[0]
        .parse()
        .map_err(|_| malformed(text, format!("year token '{}' is not numeric", parts[0])))?;
    if year == 0 {
        return Err(malformed(text, "there is no year zero"));
    }

    let (era, month_field, day_field) = if parts.contains(&"B.C.") {
        (Era::BeforeChrist, parts.get(2), parts.get(3))
    } else if year < 1000 {
        match Era::from_token(parts[1]) {
            Some(Era::AnnoDomini) => (Era::AnnoDomini, parts.get(2), parts.get(3)),
            _ => {
                return Err(PipelineError::UnsupportedEra {
                    label: text.to_string(),
                })
            }
        }
    } else {
        (Era::AnnoDomini, parts.get(1), parts.get(2))
    };

    let (month_field, day_field) = match (month_field, day_field) {
        (Some(m), Some(d)) => (*m, *d),
        _ => return Err(malformed(text, "missing month or day after era token")),
    };

    let month = month_number(month_field)
        .ok_or_else(|| malformed(text, format!("unknown month token '{}'", month_field)))?;
    let day: u8 = day_field
        .parse()
        .ok()
        .filter(|d| (1..=31).contains(d))
        .ok_or_else(|| malformed(text, format!("day token '{}' is not a day", day_field)))?;

    Ok(CalendarLabel::new(era, year, month, day))
}

/// Parse a date given on the command line.
///
/// Accepted forms: `2024-03-15`, `-0043-03-15` (astronomical year),
/// `0044-03-15 BC`, `15 MAR 44 B.C.`, `01 JAN 13200 B.C.`, and the
/// formatter form accepted by [`parse_calendar_label`].
pub fn parse_date_argument(text: &str) -> PipelineResult<CalendarLabel> {
    let trimmed = text.trim();
    let parts: Vec<&str> = trimmed.split_whitespace().collect();

    match parts.as_slice() {
        [iso] | [iso, _] if iso.len() > 5 && iso.chars().skip(1).any(|c| c == '-') => {
            let era = match parts.get(1) {
                Some(tok) => Some(
                    Era::from_token(&tok.to_ascii_uppercase()).ok_or_else(|| {
                        PipelineError::UnsupportedEra {
                            label: text.to_string(),
                        }
                    })?,
                ),
                None => None,
            };
            parse_iso_like(text, iso, era)
        }
        [day, mon, year, rest @ ..]
            if day.len() <= 2 && month_number(mon).is_some() && rest.len() <= 1 =>
        {
            let era = match rest.first() {
                Some(tok) => {
                    Era::from_token(&tok.to_ascii_uppercase()).ok_or_else(|| {
                        PipelineError::UnsupportedEra {
                            label: text.to_string(),
                        }
                    })?
                }
                None => Era::AnnoDomini,
            };
            let year: u32 = year
                .parse()
                .ok()
                .filter(|y| *y > 0)
                .ok_or_else(|| malformed(text, "year must be a positive integer"))?;
            let day: u8 = day
                .parse()
                .ok()
                .filter(|d| (1..=31).contains(d))
                .ok_or_else(|| malformed(text, "day out of range"))?;
            let month = month_number(mon).unwrap_or(1);
            Ok(CalendarLabel::new(era, year, month, day))
        }
        _ => parse_calendar_label(trimmed),
    }
}

fn parse_iso_like(text: &str, iso: &str, era: Option<Era>) -> PipelineResult<CalendarLabel> {
    let (negative, body) = match iso.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, iso),
    };
    let fields: Vec<&str> = body.split('-').collect();
    if fields.len() != 3 {
        return Err(malformed(text, "expected YYYY-MM-DD"));
    }

    let year: i64 = fields[0]
        .parse()
        .map_err(|_| malformed(text, "year is not numeric"))?;
    let month: u8 = fields[1]
        .parse()
        .ok()
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| malformed(text, "month out of range"))?;
    let day: u8 = fields[2]
        .parse()
        .ok()
        .filter(|d| (1..=31).contains(d))
        .ok_or_else(|| malformed(text, "day out of range"))?;

    let out_of_range = || malformed(text, "year out of range");
    match (negative, era) {
        (true, Some(_)) => Err(malformed(text, "signed year cannot carry an era")),
        (true, None) => CalendarLabel::try_from_astronomical(-year, month, day)
            .ok_or_else(out_of_range),
        (false, Some(era)) => {
            if year == 0 {
                return Err(malformed(text, "there is no year zero"));
            }
            let year = u32::try_from(year).map_err(|_| out_of_range())?;
            Ok(CalendarLabel::new(era, year, month, day))
        }
        (false, None) => {
            CalendarLabel::try_from_astronomical(year, month, day).ok_or_else(out_of_range)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_table() {
        assert_eq!(month_number("JAN"), Some(1));
        assert_eq!(month_number("dec"), Some(12));
        assert_eq!(month_number("SEPT"), None);
        assert_eq!(month_token(3), Some("MAR"));
        assert_eq!(month_token(0), None);
        assert_eq!(month_token(13), None);
    }

    #[test]
    fn test_non_ascii_date_argument_is_malformed() {
        for text in ["é2024-01-01", "2024–01–01", "日本"] {
            let err = parse_date_argument(text).unwrap_err();
            assert!(
                matches!(err, PipelineError::MalformedTimeLabel { .. }),
                "{text}: {err:?}"
            );
        }
    }

    #[test]
    fn test_oversized_years_are_rejected() {
        for text in ["4294967297-01-01 BC", "4294967297-01-01", "-4294967296-01-01"] {
            let err = parse_date_argument(text).unwrap_err();
            assert!(
                matches!(err, PipelineError::MalformedTimeLabel { .. }),
                "{text}: {err:?}"
            );
        }
        let widest = parse_date_argument("4294967295-12-31 BC").unwrap();
        assert_eq!(widest.year, u32::MAX);
    }

    #[test]
    fn test_long_year_uses_unshifted_fields() {
        let label = parse_calendar_label("2024 MAR 15 00:00:00").unwrap();
        assert_eq!(label, CalendarLabel::new(Era::AnnoDomini, 2024, 3, 15));
    }

    #[test]
    fn test_short_year_shifts_fields() {
        let label = parse_calendar_label("999 A.D. DEC 31 00:00:00").unwrap();
        assert_eq!(label, CalendarLabel::new(Era::AnnoDomini, 999, 12, 31));
    }

    #[test]
    fn test_bc_shifts_fields_even_for_long_years() {
        let label = parse_calendar_label("13200 B.C. JAN 01 00:00:00").unwrap();
        assert_eq!(label, CalendarLabel::new(Era::BeforeChrist, 13200, 1, 1));
        assert_eq!(label.to_string(), "13200 B.C. 01 01");
    }

    #[test]
    fn test_short_year_without_era_token_is_unsupported() {
        let err = parse_calendar_label("999 DEC 31 00:00:00").unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedEra { .. }));
    }

    #[test]
    fn test_unknown_month_is_malformed() {
        let err = parse_calendar_label("2024 FOO 15 00:00:00").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedTimeLabel { .. }));
    }

    #[test]
    fn test_era_token_on_long_year_reads_as_month() {
        // Long A.D. years never carry an era token, so one in the month slot is an error.
        let err = parse_calendar_label("2024 A.D. MAR 15").unwrap_err();
        assert!(matches!(err, PipelineError::MalformedTimeLabel { .. }));
    }

    #[test]
    fn test_non_numeric_year_is_malformed() {
        assert!(matches!(
            parse_calendar_label("MMXXIV MAR 15").unwrap_err(),
            PipelineError::MalformedTimeLabel { .. }
        ));
        assert!(matches!(
            parse_calendar_label("2024 MAR").unwrap_err(),
            PipelineError::MalformedTimeLabel { .. }
        ));
    }

    #[test]
    fn test_format_calendar_at_j2000() {
        assert_eq!(format_calendar(EphemerisTime::new(0.0)), "2000 JAN 01 12:00:00");
        assert_eq!(
            format_calendar(EphemerisTime::new(-43_200.0)),
            "2000 JAN 01 00:00:00"
        );
    }

    #[test]
    fn test_parse_date_argument_forms() {
        assert_eq!(
            parse_date_argument("2024-03-15").unwrap(),
            CalendarLabel::new(Era::AnnoDomini, 2024, 3, 15)
        );
        assert_eq!(
            parse_date_argument("-0043-03-15").unwrap(),
            CalendarLabel::new(Era::BeforeChrist, 44, 3, 15)
        );
        assert_eq!(
            parse_date_argument("0044-03-15 BC").unwrap(),
            CalendarLabel::new(Era::BeforeChrist, 44, 3, 15)
        );
        assert_eq!(
            parse_date_argument("01 JAN 13200 B.C.").unwrap(),
            CalendarLabel::new(Era::BeforeChrist, 13200, 1, 1)
        );
        assert_eq!(
            parse_date_argument("31 DEC 17100 A.D.").unwrap(),
            CalendarLabel::new(Era::AnnoDomini, 17100, 12, 31)
        );
        assert_eq!(
            parse_date_argument("999 A.D. JAN 01").unwrap(),
            CalendarLabel::new(Era::AnnoDomini, 999, 1, 1)
        );
        assert!(parse_date_argument("2024-13-01").is_err());
        assert!(parse_date_argument("15 MAR 44 CE").is_err());
    }
}
