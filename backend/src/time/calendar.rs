//! Julian day number arithmetic on the mixed Julian/Gregorian calendar.
//!
//! Years are astronomical (year 0 = 1 B.C.). Dates before 1582-10-15 use the
//! Julian calendar, later dates the Gregorian one. All divisions are floor
//! divisions so the formulas hold far into negative years.

/// Julian day number of 1582-10-15, the first Gregorian day.
pub const GREGORIAN_START_JDN: i64 = 2_299_161;

/// Julian day number of 2000-01-01.
pub const J2000_JDN: i64 = 2_451_545;

fn is_gregorian_date(year: i64, month: u8, day: u8) -> bool {
    (year, month, day) >= (1582, 10, 15)
}

/// Whether the date falls in the ten days dropped by the 1582 reform.
pub fn in_reform_gap(year: i64, month: u8, day: u8) -> bool {
    year == 1582 && month == 10 && (5..=14).contains(&day)
}

pub fn is_leap_year(year: i64) -> bool {
    if year < 1582 {
        year.rem_euclid(4) == 0
    } else {
        (year.rem_euclid(4) == 0 && year.rem_euclid(100) != 0) || year.rem_euclid(400) == 0
    }
}

/// Days in a month, or `None` for a month outside 1..=12.
pub fn days_in_month(year: i64, month: u8) -> Option<u8> {
    let days = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => return None,
    };
    Some(days)
}

/// Julian day number of a calendar date. The date is not validated.
pub fn jdn_from_calendar(year: i64, month: u8, day: u8) -> i64 {
    let month = month as i64;
    let day = day as i64;
    let a = (14 - month).div_euclid(12);
    let y = year + 4800 - a;
    let m = month + 12 * a - 3;
    let base = day + (153 * m + 2).div_euclid(5) + 365 * y + y.div_euclid(4);

    if is_gregorian_date(year, month as u8, day as u8) {
        base - y.div_euclid(100) + y.div_euclid(400) - 32045
    } else {
        base - 32083
    }
}

/// Calendar date `(year, month, day)` of a Julian day number.
pub fn calendar_from_jdn(jdn: i64) -> (i64, u8, u8) {
    let (c, century_years) = if jdn >= GREGORIAN_START_JDN {
        let a = jdn + 32044;
        let b = (4 * a + 3).div_euclid(146_097);
        (a - (146_097 * b).div_euclid(4), 100 * b)
    } else {
        (jdn + 32082, 0)
    };

    let d = (4 * c + 3).div_euclid(1461);
    let e = c - (1461 * d).div_euclid(4);
    let m = (5 * e + 2).div_euclid(153);

    let day = e - (153 * m + 2).div_euclid(5) + 1;
    let month = m + 3 - 12 * m.div_euclid(10);
    let year = century_years + d - 4800 + m.div_euclid(10);

    (year, month as u8, day as u8)
}
