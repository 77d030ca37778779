use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GanttError;

/// Id given to a task's main duration when none is supplied.
pub const MAIN_DURATION_ID: &str = "main";

/// Represents the type of dependency between two tasks.
///
/// The first letter names the anchor on the source bar, the second the anchor on
/// the target bar (`S` = start edge, `F` = finish edge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    #[serde(rename = "FS")]
    FinishToStart,
    #[serde(rename = "SS")]
    StartToStart,
    #[serde(rename = "FF")]
    FinishToFinish,
    #[serde(rename = "SF")]
    StartToFinish,
}

/// One edge of a bar a relation can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Finish,
}

impl RelationKind {
    pub const ALL: [RelationKind; 4] = [
        RelationKind::FinishToStart,
        RelationKind::StartToStart,
        RelationKind::FinishToFinish,
        RelationKind::StartToFinish,
    ];

    pub fn code(self) -> &'static str {
        match self {
            RelationKind::FinishToStart => "FS",
            RelationKind::StartToStart => "SS",
            RelationKind::FinishToFinish => "FF",
            RelationKind::StartToFinish => "SF",
        }
    }

    /// Anchor on the source bar.
    pub fn source_anchor(self) -> Anchor {
        match self {
            RelationKind::FinishToStart | RelationKind::FinishToFinish => Anchor::Finish,
            RelationKind::StartToStart | RelationKind::StartToFinish => Anchor::Start,
        }
    }

    /// Anchor on the target bar.
    pub fn target_anchor(self) -> Anchor {
        match self {
            RelationKind::FinishToStart | RelationKind::StartToStart => Anchor::Start,
            RelationKind::FinishToFinish | RelationKind::StartToFinish => Anchor::Finish,
        }
    }

    pub fn touches(self, anchor: Anchor) -> bool {
        self.source_anchor() == anchor || self.target_anchor() == anchor
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for RelationKind {
    type Err = GanttError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FS" => Ok(RelationKind::FinishToStart),
            "SS" => Ok(RelationKind::StartToStart),
            "FF" => Ok(RelationKind::FinishToFinish),
            "SF" => Ok(RelationKind::StartToFinish),
            other => Err(GanttError::UnknownRelationKind(other.to_string())),
        }
    }
}

/// A dependency from the owning task to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub target: String,
    pub kind: RelationKind,
}

/// One time-bound span of a task (the main plan or a comparison timeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Duration {
    #[serde(default = "main_duration_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Fill colour of the bar, as a `#RRGGBB` string.
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub percentage: f32,
}

fn main_duration_id() -> String {
    MAIN_DURATION_ID.to_string()
}

impl Default for Duration {
    fn default() -> Self {
        Self {
            id: main_duration_id(),
            name: String::new(),
            class: String::new(),
            start: None,
            end: None,
            percentage: 0.0,
        }
    }
}

impl Duration {
    pub fn new(
        id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            start: Some(start),
            end: Some(end),
            ..Default::default()
        }
    }

    /// Both edges are known, so the duration can be placed on the timeline.
    pub fn is_drawable(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }
}

/// A single row of the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub main: Duration,
    #[serde(default)]
    pub timelines: Vec<Duration>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    /// Label-column cell text, keyed by header id.
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl Task {
    /// Create a root task without any schedule.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            main: Duration {
                name: name.clone(),
                ..Default::default()
            },
            name,
            parent: None,
            timelines: Vec::new(),
            relations: Vec::new(),
            data: HashMap::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_schedule(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.main.start = Some(start);
        self.main.end = Some(end);
        self
    }

    pub fn with_timeline(mut self, timeline: Duration) -> Self {
        self.timelines.push(timeline);
        self
    }

    pub fn with_relation(mut self, target: impl Into<String>, kind: RelationKind) -> Self {
        self.relations.push(Relation {
            target: target.into(),
            kind,
        });
        self
    }

    pub fn with_cell(mut self, header: impl Into<String>, text: impl Into<String>) -> Self {
        self.data.insert(header.into(), text.into());
        self
    }

    /// Main duration followed by the comparison timelines.
    pub fn durations(&self) -> impl Iterator<Item = &Duration> {
        std::iter::once(&self.main).chain(self.timelines.iter())
    }

    /// Number of stacked bar slots this task needs; never less than one.
    pub fn bar_slots(&self) -> usize {
        self.durations().filter(|d| d.is_drawable()).count().max(1)
    }
}

/// A label-column header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub id: String,
    pub name: String,
}

impl Header {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn relation_kind_anchors() {
        assert_eq!(RelationKind::FinishToStart.source_anchor(), Anchor::Finish);
        assert_eq!(RelationKind::FinishToStart.target_anchor(), Anchor::Start);
        assert_eq!(RelationKind::StartToFinish.source_anchor(), Anchor::Start);
        assert_eq!(RelationKind::StartToFinish.target_anchor(), Anchor::Finish);
        assert!(RelationKind::StartToStart.touches(Anchor::Start));
        assert!(!RelationKind::StartToStart.touches(Anchor::Finish));
    }

    #[test]
    fn relation_kind_parses_codes() {
        assert_eq!("fs".parse::<RelationKind>().unwrap(), RelationKind::FinishToStart);
        assert_eq!(" SF ".parse::<RelationKind>().unwrap(), RelationKind::StartToFinish);
        assert!("XX".parse::<RelationKind>().is_err());
    }

    #[test]
    fn relation_kind_serializes_as_code() {
        let json = serde_json::to_string(&RelationKind::FinishToFinish).unwrap();
        assert_eq!(json, "\"FF\"");
    }

    #[test]
    fn bar_slots_counts_drawable_durations() {
        let unscheduled = Task::new("a", "A");
        assert_eq!(unscheduled.bar_slots(), 1);

        let task = Task::new("b", "B")
            .with_schedule(day(1), day(5))
            .with_timeline(Duration::new("baseline", day(2), day(6)))
            .with_timeline(Duration {
                id: "half".into(),
                start: Some(day(3)),
                ..Default::default()
            });
        assert_eq!(task.bar_slots(), 2);
    }

    #[test]
    fn task_deserializes_with_defaults() {
        let task: Task = serde_json::from_str(r#"{"id":"t1","name":"Design"}"#).unwrap();
        assert_eq!(task.main.id, MAIN_DURATION_ID);
        assert!(task.parent.is_none());
        assert!(task.relations.is_empty());
        assert!(!task.main.is_drawable());
    }
}
