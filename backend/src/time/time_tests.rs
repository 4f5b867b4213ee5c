use super::*;
use crate::models::Era;

fn label(era: Era, year: u32, month: u8, day: u8) -> CalendarLabel {
    CalendarLabel::new(era, year, month, day)
}

#[test]
fn test_j2000_midnight() {
    let et = to_ephemeris_time(&label(Era::AnnoDomini, 2000, 1, 1)).unwrap();
    assert_eq!(et.seconds(), -43_200.0);
    assert_eq!(to_calendar(EphemerisTime::new(0.0)), label(Era::AnnoDomini, 2000, 1, 1));
}

#[test]
fn test_round_trip_across_eras() {
    let labels = [
        label(Era::BeforeChrist, 13200, 1, 1),
        label(Era::BeforeChrist, 4713, 1, 1),
        label(Era::BeforeChrist, 44, 3, 15),
        label(Era::BeforeChrist, 1, 12, 31),
        label(Era::AnnoDomini, 1, 1, 1),
        label(Era::AnnoDomini, 999, 12, 31),
        label(Era::AnnoDomini, 1582, 10, 4),
        label(Era::AnnoDomini, 1582, 10, 15),
        label(Era::AnnoDomini, 2024, 2, 29),
        label(Era::AnnoDomini, 17100, 12, 31),
    ];

    for l in labels {
        let et = to_ephemeris_time(&l).unwrap();
        assert_eq!(to_calendar(et), l, "label {l}");
        assert_eq!(to_ephemeris_time(&to_calendar(et)).unwrap(), et);
    }
}

#[test]
fn test_round_trip_within_one_step_for_arbitrary_instants() {
    let mut et = to_ephemeris_time(&label(Era::BeforeChrist, 13200, 1, 1)).unwrap();
    let end = to_ephemeris_time(&label(Era::AnnoDomini, 17100, 12, 31)).unwrap();
    while et <= end {
        let t = et.offset_days(0.37);
        let back = to_ephemeris_time(&to_calendar(t)).unwrap();
        assert!((t.seconds() - back.seconds()).abs() < SECONDS_PER_DAY);
        et = step_forward(et, 104_729.0);
    }
}

#[test]
fn test_era_flips_between_1_bc_and_1_ad() {
    let last_bc = to_ephemeris_time(&label(Era::BeforeChrist, 1, 12, 31)).unwrap();
    let next = to_calendar(step_forward(last_bc, 1.0));
    assert_eq!(next, label(Era::AnnoDomini, 1, 1, 1));
}

#[test]
fn test_gregorian_reform_is_one_day_apart() {
    let before = to_ephemeris_time(&label(Era::AnnoDomini, 1582, 10, 4)).unwrap();
    let after = to_ephemeris_time(&label(Era::AnnoDomini, 1582, 10, 15)).unwrap();
    assert_eq!(after.seconds() - before.seconds(), SECONDS_PER_DAY);
}

#[test]
fn test_formatter_output_parses_back_to_the_same_label() {
    let mut et = to_ephemeris_time(&label(Era::BeforeChrist, 13200, 1, 1)).unwrap();
    let end = to_ephemeris_time(&label(Era::AnnoDomini, 17100, 12, 31)).unwrap();
    while et <= end {
        let text = format_calendar(et);
        let parsed = parse_calendar_label(&text).unwrap();
        assert_eq!(parsed, to_calendar(et), "formatted as '{text}'");
        et = step_forward(et, 7_919.5);
    }
}

#[test]
fn test_formatter_shapes() {
    let et = to_ephemeris_time(&label(Era::AnnoDomini, 999, 7, 4)).unwrap();
    assert_eq!(format_calendar(et), "999 A.D. JUL 04 00:00:00");

    let et = to_ephemeris_time(&label(Era::BeforeChrist, 13200, 1, 1)).unwrap();
    assert_eq!(format_calendar(et), "13200 B.C. JAN 01 00:00:00");

    let et = to_ephemeris_time(&label(Era::AnnoDomini, 1000, 1, 1)).unwrap();
    assert_eq!(format_calendar(et.offset_days(0.75)), "1000 JAN 01 18:00:00");
}

#[test]
fn test_invalid_labels_are_malformed() {
    for bad in [
        label(Era::AnnoDomini, 2023, 2, 29),
        label(Era::AnnoDomini, 2024, 4, 31),
        label(Era::AnnoDomini, 2024, 13, 1),
        label(Era::AnnoDomini, 2024, 1, 0),
        label(Era::AnnoDomini, 0, 1, 1),
        label(Era::AnnoDomini, 1582, 10, 10),
    ] {
        assert!(
            matches!(
                to_ephemeris_time(&bad),
                Err(PipelineError::MalformedTimeLabel { .. })
            ),
            "{bad:?}"
        );
    }
}

#[test]
fn test_julian_leap_day_before_reform() {
    // 1500 is a leap year on the Julian calendar.
    assert!(to_ephemeris_time(&label(Era::AnnoDomini, 1500, 2, 29)).is_ok());
    // 1 B.C. is astronomical year 0, a Julian leap year.
    assert!(to_ephemeris_time(&label(Era::BeforeChrist, 1, 2, 29)).is_ok());
}

#[test]
fn test_time_point_carries_both_forms() {
    let et = to_ephemeris_time(&label(Era::AnnoDomini, 2024, 3, 15)).unwrap();
    let tp = time_point(et);
    assert_eq!(tp.et, et);
    assert_eq!(tp.label.to_string(), "2024 03 15");
}
