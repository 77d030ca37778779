//! Chart configuration.
//!
//! All fields carry `#[serde(default)]` so that a partial JSON object is valid:
//! missing keys fall back to the built-in defaults.

use chrono::{
    DateTime, Duration as ChronoDuration, FixedOffset, NaiveDateTime, TimeZone, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::task::RelationKind;
use crate::error::GanttError;

/// Sizes and colours of the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GanttOptions {
    /// Width of one label column. The first column is twice as wide.
    pub column_width: f32,
    pub header_height: f32,
    pub header_bg: String,
    pub canvas_bg: String,
    pub font_color: String,
    pub line_color: String,
    pub font: String,
    /// Height of one row slot in the label column.
    pub box_height: f32,
    pub bar_height: f32,
    /// Horizontal text inset inside a bar.
    pub bar_horizontal_residue: f32,
    /// Vertical gap between stacked bars; also the minimum bar width.
    pub bar_vertical_residue: f32,
    pub curve_radius: f32,
}

impl Default for GanttOptions {
    fn default() -> Self {
        Self {
            column_width: 200.0,
            header_height: 50.0,
            header_bg: "#fafafa".into(),
            canvas_bg: "#fafafa".into(),
            font_color: "#333333".into(),
            line_color: "#e0e0e0".into(),
            font: "14px Arial".into(),
            box_height: 60.0,
            bar_height: 40.0,
            bar_horizontal_residue: 10.0,
            bar_vertical_residue: 20.0,
            curve_radius: 5.0,
        }
    }
}

/// Stroke colour of each relation kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationColors {
    #[serde(rename = "FS")]
    pub fs: String,
    #[serde(rename = "SS")]
    pub ss: String,
    #[serde(rename = "FF")]
    pub ff: String,
    #[serde(rename = "SF")]
    pub sf: String,
}

impl Default for RelationColors {
    fn default() -> Self {
        Self {
            fs: "#3DCEFF".into(),
            ss: "#23A118".into(),
            ff: "#FF8B3D".into(),
            sf: "#FF3D3D".into(),
        }
    }
}

impl RelationColors {
    pub fn color(&self, kind: RelationKind) -> &str {
        match kind {
            RelationKind::FinishToStart => &self.fs,
            RelationKind::StartToStart => &self.ss,
            RelationKind::FinishToFinish => &self.ff,
            RelationKind::StartToFinish => &self.sf,
        }
    }
}

/// Timezone whose wall clock drives calendar arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartZone {
    Fixed(FixedOffset),
    /// IANA zone; its offset follows the zone's DST rules.
    Named(Tz),
}

impl ChartZone {
    /// Wall-clock time of `date` in this zone.
    pub fn to_local(&self, date: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Self::Fixed(offset) => wall_clock(date, offset),
            Self::Named(tz) => wall_clock(date, tz),
        }
    }

    /// Instant of a wall-clock time in this zone.
    pub fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        match self {
            Self::Fixed(offset) => instant(local, offset),
            Self::Named(tz) => instant(local, tz),
        }
    }
}

fn wall_clock<Z: TimeZone>(date: DateTime<Utc>, zone: &Z) -> NaiveDateTime {
    date.with_timezone(zone).naive_local()
}

/// Ambiguous wall-clock times resolve to the earlier instant; times skipped
/// by a DST jump move forward past the gap.
fn instant<Z: TimeZone>(local: NaiveDateTime, zone: &Z) -> DateTime<Utc> {
    zone.from_local_datetime(&local)
        .earliest()
        .or_else(|| {
            zone.from_local_datetime(&(local + ChronoDuration::hours(1)))
                .earliest()
        })
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|| local.and_utc())
}

/// Parse a timezone given as `UTC`, `Z`, a `±HH:MM` offset or an IANA name
/// such as `Europe/Berlin`.
pub fn parse_timezone(s: &str) -> Result<ChartZone, GanttError> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("utc") || s.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0)
            .map(ChartZone::Fixed)
            .ok_or_else(|| GanttError::InvalidTimezone(s.into()));
    }
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => {
            return s
                .parse::<Tz>()
                .map(ChartZone::Named)
                .map_err(|_| GanttError::InvalidTimezone(s.to_string()))
        }
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: i32 = hours
        .parse()
        .map_err(|_| GanttError::InvalidTimezone(s.to_string()))?;
    let minutes: i32 = minutes
        .parse()
        .map_err(|_| GanttError::InvalidTimezone(s.to_string()))?;
    if minutes >= 60 {
        return Err(GanttError::InvalidTimezone(s.to_string()));
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .map(ChartZone::Fixed)
        .ok_or_else(|| GanttError::InvalidTimezone(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_options_fall_back_to_defaults() {
        let options: GanttOptions =
            serde_json::from_str(r#"{"column_width": 150, "bar_height": 30}"#).unwrap();
        assert_eq!(options.column_width, 150.0);
        assert_eq!(options.bar_height, 30.0);
        assert_eq!(options.box_height, 60.0);
        assert_eq!(options.header_bg, "#fafafa");
    }

    #[test]
    fn relation_colors_use_type_codes() {
        let colors: RelationColors = serde_json::from_str(r##"{"FS": "#000000"}"##).unwrap();
        assert_eq!(colors.color(RelationKind::FinishToStart), "#000000");
        assert_eq!(colors.color(RelationKind::StartToStart), "#23A118");
    }

    fn offset(s: &str) -> i32 {
        match parse_timezone(s).unwrap() {
            ChartZone::Fixed(offset) => offset.local_minus_utc(),
            other => panic!("{s} parsed as {other:?}"),
        }
    }

    #[test]
    fn parses_offsets() {
        assert_eq!(offset("UTC"), 0);
        assert_eq!(offset("+05:30"), 19_800);
        assert_eq!(offset("-0800"), -28_800);
        assert_eq!(offset("+2"), 7_200);
        assert!(parse_timezone("+01:75").is_err());
    }

    #[test]
    fn parses_zone_names() {
        assert_eq!(
            parse_timezone("Asia/Kolkata").unwrap(),
            ChartZone::Named(Tz::Asia__Kolkata)
        );
        assert_eq!(
            parse_timezone(" Europe/Paris ").unwrap(),
            ChartZone::Named(Tz::Europe__Paris)
        );
        assert!(matches!(
            parse_timezone("Mars/Olympus"),
            Err(GanttError::InvalidTimezone(name)) if name == "Mars/Olympus"
        ));
    }

    #[test]
    fn named_zone_follows_daylight_saving() {
        let berlin = ChartZone::Named(Tz::Europe__Berlin);
        let winter = Utc.with_ymd_and_hms(2024, 3, 30, 12, 0, 0).unwrap();
        let summer = Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap();
        assert_eq!(berlin.to_local(winter).format("%H:%M").to_string(), "13:00");
        assert_eq!(berlin.to_local(summer).format("%H:%M").to_string(), "14:00");
        assert_eq!(berlin.to_utc(berlin.to_local(summer)), summer);
    }

    #[test]
    fn skipped_wall_clock_time_moves_past_the_gap() {
        let berlin = ChartZone::Named(Tz::Europe__Berlin);
        // 02:30 does not exist on 2024-03-31 in Berlin.
        let local = Utc
            .with_ymd_and_hms(2024, 3, 31, 2, 30, 0)
            .unwrap()
            .naive_utc();
        assert_eq!(
            berlin.to_utc(local),
            Utc.with_ymd_and_hms(2024, 3, 31, 1, 30, 0).unwrap()
        );
    }
}
