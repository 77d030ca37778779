use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GanttError;

/// Controls what time unit the horizontal axis is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Granularity {
    pub const ALL: [Granularity; 5] = [
        Granularity::Day,
        Granularity::Week,
        Granularity::Month,
        Granularity::Quarter,
        Granularity::Year,
    ];

    /// Pixels covered by one unit.
    pub fn unit_width(self) -> f32 {
        match self {
            Granularity::Day => 100.0,
            Granularity::Week => 210.0,
            Granularity::Month => 300.0,
            Granularity::Quarter => 450.0,
            Granularity::Year => 600.0,
        }
    }

    /// Nudge applied to bar edges so adjacent bars never touch at unit boundaries.
    pub fn residue(self) -> f32 {
        match self {
            Granularity::Day => 20.0,
            Granularity::Week => 15.0,
            Granularity::Month => 5.0,
            Granularity::Quarter | Granularity::Year => 0.0,
        }
    }

    /// Pixels per day inside one unit.
    pub fn day_factor(self) -> f32 {
        let days = match self {
            Granularity::Day => 100.0,
            Granularity::Week => 7.0,
            Granularity::Month => 30.0,
            Granularity::Quarter => 90.0,
            Granularity::Year => 365.0,
        };
        self.unit_width() / days
    }

    /// Extra units padded on both sides of the visible window.
    pub fn buffer(self) -> i64 {
        match self {
            Granularity::Day => 10,
            Granularity::Week => 6,
            Granularity::Month => 4,
            Granularity::Quarter => 3,
            Granularity::Year => 2,
        }
    }

    /// `chrono` format string for header labels. Quarters are formatted by hand.
    pub fn header_format(self) -> &'static str {
        match self {
            Granularity::Day => "%d/%m/%Y",
            Granularity::Week => "%G Week %V",
            Granularity::Month => "%b %Y",
            Granularity::Quarter => "%Y Quarter",
            Granularity::Year => "%Y",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Granularity::Day => "Day",
            Granularity::Week => "Week",
            Granularity::Month => "Month",
            Granularity::Quarter => "Quarter",
            Granularity::Year => "Year",
        }
    }

    /// Index into a `[T; 5]` ordered like [`Granularity::ALL`].
    pub fn index(self) -> usize {
        match self {
            Granularity::Day => 0,
            Granularity::Week => 1,
            Granularity::Month => 2,
            Granularity::Quarter => 3,
            Granularity::Year => 4,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label().to_lowercase())
    }
}

impl FromStr for Granularity {
    type Err = GanttError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "days" => Ok(Granularity::Day),
            "week" | "weeks" => Ok(Granularity::Week),
            "month" | "months" => Ok(Granularity::Month),
            "quarter" | "quarters" => Ok(Granularity::Quarter),
            "year" | "years" => Ok(Granularity::Year),
            other => Err(GanttError::UnknownGranularity(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_all_order() {
        for (i, g) in Granularity::ALL.iter().enumerate() {
            assert_eq!(g.index(), i);
        }
    }

    #[test]
    fn day_factor_per_unit() {
        assert_eq!(Granularity::Day.day_factor(), 1.0);
        assert_eq!(Granularity::Week.day_factor(), 30.0);
        assert_eq!(Granularity::Month.day_factor(), 10.0);
        assert_eq!(Granularity::Quarter.day_factor(), 5.0);
    }

    #[test]
    fn parses_plural_names() {
        assert_eq!("Weeks".parse::<Granularity>().unwrap(), Granularity::Week);
        assert!("fortnight".parse::<Granularity>().is_err());
    }
}
