//! Date ↔ pixel mapping for each [`Granularity`].
//!
//! All calendar arithmetic happens on the wall-clock time of the configured
//! zone (UTC when none is given). Named zones shift with daylight saving, so a
//! day unit is always one calendar day even when it lasts 23 or 25 hours.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, Months, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ChartZone, Granularity};

/// Units added to the header so the last partially covered unit still gets a label.
pub const HEADER_ENLARGEMENT: f64 = 1.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Labels of the date header row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateHeader {
    pub total_units: usize,
    pub labels: Vec<String>,
}

/// Wall-clock time of `date` in `tz`.
pub fn to_local(date: DateTime<Utc>, tz: Option<ChartZone>) -> NaiveDateTime {
    match tz {
        Some(zone) => zone.to_local(date),
        None => date.naive_utc(),
    }
}

/// Instant of a wall-clock time in `tz`.
pub fn to_utc(local: NaiveDateTime, tz: Option<ChartZone>) -> DateTime<Utc> {
    match tz {
        Some(zone) => zone.to_utc(local),
        None => local.and_utc(),
    }
}

fn first_of_month(date: NaiveDate, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
}

/// Start of the unit containing `local`. Weeks start on Monday.
pub fn truncate(local: NaiveDateTime, granularity: Granularity) -> NaiveDateTime {
    let date = local.date();
    let start = match granularity {
        Granularity::Day => date,
        Granularity::Week => {
            date - ChronoDuration::days(date.weekday().num_days_from_monday() as i64)
        }
        Granularity::Month => first_of_month(date, date.month()),
        Granularity::Quarter => first_of_month(date, (date.month0() / 3) * 3 + 1),
        Granularity::Year => first_of_month(date, 1),
    };
    start.and_hms_opt(0, 0, 0).unwrap_or(local)
}

fn add_months(local: NaiveDateTime, months: i64) -> NaiveDateTime {
    let shifted = if months >= 0 {
        local.checked_add_months(Months::new(months as u32))
    } else {
        local.checked_sub_months(Months::new(months.unsigned_abs() as u32))
    };
    shifted.unwrap_or(local)
}

/// Shift `local` by `n` whole units.
pub fn add_units(local: NaiveDateTime, granularity: Granularity, n: i64) -> NaiveDateTime {
    match granularity {
        Granularity::Day => local + ChronoDuration::days(n),
        Granularity::Week => local + ChronoDuration::weeks(n),
        Granularity::Month => add_months(local, n),
        Granularity::Quarter => add_months(local, n * 3),
        Granularity::Year => add_months(local, n * 12),
    }
}

fn seconds_between(a: NaiveDateTime, b: NaiveDateTime) -> f64 {
    (b - a).num_milliseconds() as f64 / 1000.0
}

/// Fractional calendar months from `a` to `b`; whole months are exact, the
/// remainder is measured against the length of the month it falls in.
fn month_diff(a: NaiveDateTime, b: NaiveDateTime) -> f64 {
    let whole = (b.year() as i64 - a.year() as i64) * 12 + (b.month() as i64 - a.month() as i64);
    let anchor = add_months(a, whole);
    let remainder = seconds_between(anchor, b);
    let span = if remainder < 0.0 {
        seconds_between(add_months(a, whole - 1), anchor)
    } else {
        seconds_between(anchor, add_months(a, whole + 1))
    };
    if span == 0.0 {
        whole as f64
    } else {
        whole as f64 + remainder / span
    }
}

/// Fractional number of units from `a` to `b` (negative when `b < a`).
pub fn unit_diff(a: NaiveDateTime, b: NaiveDateTime, granularity: Granularity) -> f64 {
    match granularity {
        Granularity::Day => seconds_between(a, b) / SECONDS_PER_DAY,
        Granularity::Week => seconds_between(a, b) / (SECONDS_PER_DAY * 7.0),
        Granularity::Month => month_diff(a, b),
        Granularity::Quarter => month_diff(a, b) / 3.0,
        Granularity::Year => month_diff(a, b) / 12.0,
    }
}

/// Horizontal pixel offset of `date` relative to the window starting at `min`.
///
/// Whole units between the two truncated dates are scaled by the unit width,
/// the days elapsed inside the unit by the day factor (one extra day for end
/// edges), and the unit residue is added to start edges and removed from end
/// edges.
pub fn position(
    min: DateTime<Utc>,
    date: DateTime<Utc>,
    granularity: Granularity,
    is_start: bool,
    tz: Option<ChartZone>,
) -> f32 {
    let local = to_local(date, tz);
    let unit_start = truncate(local, granularity);
    let min_start = truncate(to_local(min, tz), granularity);

    let complete_units = unit_diff(min_start, unit_start, granularity).round();
    let base = granularity.unit_width() as f64 * complete_units;

    let day_start = truncate(local, Granularity::Day);
    let end_day = if is_start { 0.0 } else { 1.0 };
    let partial_days = (unit_diff(unit_start, day_start, Granularity::Day) + end_day).floor();
    let partial = partial_days * granularity.day_factor() as f64;

    let residue = if is_start {
        granularity.residue()
    } else {
        -granularity.residue()
    };
    (base + partial) as f32 + residue
}

/// Pixel extent `(start_x, end_x)` of a bar, corrected so it is never inverted
/// and never narrower than `min_width`.
pub fn bar_extent(
    min: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    granularity: Granularity,
    tz: Option<ChartZone>,
    min_width: f32,
) -> (f32, f32) {
    let mut start_x = position(min, start, granularity, true, tz);
    let mut end_x = position(min, end, granularity, false, tz);
    if granularity == Granularity::Day {
        // A bar ending on a day covers that whole day.
        end_x += granularity.unit_width();
    }
    if end_x < start_x {
        std::mem::swap(&mut start_x, &mut end_x);
    }
    if end_x - start_x < min_width {
        end_x = start_x + min_width;
    }
    (start_x, end_x)
}

/// Visible window: the folded date range padded by the granularity buffer.
pub fn pad_window(
    min: DateTime<Utc>,
    max: DateTime<Utc>,
    granularity: Granularity,
    tz: Option<ChartZone>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let buffer = granularity.buffer();
    let padded_min = add_units(to_local(min, tz), granularity, -buffer);
    let padded_max = add_units(to_local(max, tz), granularity, buffer);
    (to_utc(padded_min, tz), to_utc(padded_max, tz))
}

fn format_label(local: NaiveDateTime, granularity: Granularity) -> String {
    match granularity {
        Granularity::Quarter => format!(
            "{} {}",
            local.format(granularity.header_format()),
            local.month0() / 3 + 1
        ),
        _ => local.format(granularity.header_format()).to_string(),
    }
}

/// One label per unit from the start of `min`'s unit onwards.
pub fn header(
    granularity: Granularity,
    min: DateTime<Utc>,
    max: DateTime<Utc>,
    tz: Option<ChartZone>,
) -> DateHeader {
    let from = to_local(min, tz);
    let to = to_local(max, tz);
    let total_units = (unit_diff(from, to, granularity) + HEADER_ENLARGEMENT)
        .ceil()
        .max(0.0) as usize;

    let mut current = truncate(from, granularity);
    let mut labels = Vec::with_capacity(total_units);
    for _ in 0..total_units {
        labels.push(format_label(current, granularity));
        current = add_units(current, granularity, 1);
    }
    DateHeader {
        total_units,
        labels,
    }
}

/// Long date used in tooltips, e.g. `Tue 02 January 2024`.
pub fn format_instant(date: Option<DateTime<Utc>>, tz: Option<ChartZone>) -> String {
    date.map(|d| to_local(d, tz).format("%a %d %B %Y").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use chrono_tz::Tz;
    use proptest::prelude::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn truncates_to_unit_start() {
        let local = at(2024, 5, 16).naive_utc() + ChronoDuration::hours(13);
        assert_eq!(truncate(local, Granularity::Day), at(2024, 5, 16).naive_utc());
        // 2024-05-16 is a Thursday.
        assert_eq!(truncate(local, Granularity::Week), at(2024, 5, 13).naive_utc());
        assert_eq!(truncate(local, Granularity::Month), at(2024, 5, 1).naive_utc());
        assert_eq!(truncate(local, Granularity::Quarter), at(2024, 4, 1).naive_utc());
        assert_eq!(truncate(local, Granularity::Year), at(2024, 1, 1).naive_utc());
    }

    #[test]
    fn month_diff_is_fractional() {
        let a = at(2024, 1, 1).naive_utc();
        assert_eq!(unit_diff(a, at(2024, 3, 1).naive_utc(), Granularity::Month), 2.0);
        let half = unit_diff(a, at(2024, 1, 16).naive_utc() + ChronoDuration::hours(12), Granularity::Month);
        assert!((half - 0.5).abs() < 1e-9);
        assert_eq!(unit_diff(a, at(2025, 1, 1).naive_utc(), Granularity::Year), 1.0);
        assert_eq!(unit_diff(at(2024, 3, 1).naive_utc(), a, Granularity::Month), -2.0);
    }

    #[test]
    fn day_position_uses_residue_and_whole_days() {
        let min = at(2024, 1, 1);
        assert_eq!(position(min, at(2024, 1, 1), Granularity::Day, true, None), 20.0);
        assert_eq!(position(min, at(2024, 1, 3), Granularity::Day, true, None), 220.0);
        // End edge: one day factor minus residue.
        assert_eq!(position(min, at(2024, 1, 3), Granularity::Day, false, None), 181.0);
    }

    #[test]
    fn week_position_counts_days_inside_week() {
        let min = at(2024, 1, 1); // Monday
        // Wednesday of the second week: 1 unit + 2 days.
        let x = position(min, at(2024, 1, 10), Granularity::Week, true, None);
        assert_eq!(x, 210.0 + 2.0 * 30.0 + 15.0);
    }

    #[test]
    fn timezone_shifts_the_calendar_day() {
        let min = at(2024, 1, 1);
        let late = Utc.with_ymd_and_hms(2024, 1, 2, 23, 0, 0).unwrap();
        let plus_two = FixedOffset::east_opt(2 * 3600).map(ChartZone::Fixed);
        assert_eq!(position(min, late, Granularity::Day, true, None), 120.0);
        assert_eq!(position(min, late, Granularity::Day, true, plus_two), 220.0);
    }

    #[test]
    fn days_stay_whole_across_a_dst_change() {
        let berlin = Some(ChartZone::Named(Tz::Europe__Berlin));
        // Local midnights around the 2024-03-31 spring-forward in Berlin.
        let min = Utc.with_ymd_and_hms(2024, 3, 29, 23, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2024, 3, 30, 23, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 3, 31, 22, 0, 0).unwrap();
        let x_before = position(min, before, Granularity::Day, true, berlin);
        let x_after = position(min, after, Granularity::Day, true, berlin);
        assert_eq!(x_after - x_before, Granularity::Day.unit_width());

        let header = header(Granularity::Day, before, after, berlin);
        assert_eq!(header.labels, vec!["31/03/2024", "01/04/2024"]);
    }

    #[test]
    fn day_bar_covers_its_last_day() {
        let min = at(2024, 1, 1);
        let (start, end) = bar_extent(min, at(2024, 1, 2), at(2024, 1, 2), Granularity::Day, None, 20.0);
        assert_eq!(start, 120.0);
        assert_eq!(end, 181.0);
    }

    #[test]
    fn inverted_bar_is_swapped() {
        let min = at(2024, 1, 1);
        let (start, end) = bar_extent(min, at(2024, 3, 1), at(2024, 1, 10), Granularity::Month, None, 20.0);
        assert!(start < end);
    }

    #[test]
    fn header_labels_one_per_unit() {
        let header = header(Granularity::Month, at(2024, 1, 15), at(2024, 4, 2), None);
        assert_eq!(header.total_units, 4);
        assert_eq!(header.labels, vec!["Jan 2024", "Feb 2024", "Mar 2024", "Apr 2024"]);

        let quarters = super::header(Granularity::Quarter, at(2024, 2, 1), at(2024, 8, 1), None);
        assert_eq!(quarters.labels[0], "2024 Quarter 1");
        assert_eq!(quarters.labels[2], "2024 Quarter 3");

        let days = super::header(Granularity::Day, at(2024, 1, 1), at(2024, 1, 3), None);
        assert_eq!(days.labels, vec!["01/01/2024", "02/01/2024", "03/01/2024"]);
    }

    #[test]
    fn pad_window_adds_buffer_units() {
        let (min, max) = pad_window(at(2024, 5, 10), at(2024, 6, 10), Granularity::Month, None);
        assert_eq!(min, at(2024, 1, 10));
        assert_eq!(max, at(2024, 10, 10));
    }

    #[test]
    fn formats_tooltip_dates() {
        assert_eq!(format_instant(Some(at(2024, 1, 2)), None), "Tue 02 January 2024");
        assert_eq!(format_instant(None, None), "");
    }

    fn granularity() -> impl Strategy<Value = Granularity> {
        prop::sample::select(Granularity::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn bars_are_never_inverted_or_too_narrow(
            g in granularity(),
            start_offset in 0i64..3_000_000,
            length in -400_000i64..3_000_000,
            min_width in 0.0f32..40.0,
        ) {
            let min = at(2023, 6, 1);
            let start = at(2024, 1, 1) + ChronoDuration::minutes(start_offset);
            let end = start + ChronoDuration::minutes(length);
            let (s, e) = bar_extent(min, start, end, g, None, min_width);
            prop_assert!(e >= s);
            prop_assert!(e - s >= min_width - 1e-3);
        }

        #[test]
        fn end_edge_never_precedes_start_edge_for_ordered_dates(
            g in granularity(),
            start_offset in 0i64..2_000_000,
            length in 0i64..2_000_000,
        ) {
            let min = at(2023, 6, 1);
            let start = at(2024, 1, 1) + ChronoDuration::minutes(start_offset);
            let end = start + ChronoDuration::minutes(length);
            let (s, e) = bar_extent(min, start, end, g, None, 0.0);
            prop_assert!(e >= s);
            prop_assert!(s >= position(min, start, g, true, None).min(position(min, end, g, false, None)));
        }
    }
}
