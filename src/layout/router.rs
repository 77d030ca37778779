//! Orthogonal routing of dependency arrows between bars.
//!
//! Every relation becomes one path: a horizontal run from the source anchor out
//! to a vertical lane beside all bars, an optional crossing to the lane on the
//! other side when the anchors differ, a final run into the target anchor, and
//! an arrowhead. Lanes are handed out per `(target, kind)`; the first relation
//! of a pair claims the current shared boundary and widens it for the next pair.
//!
//! Relations into the same target and kind share one lane even when they come
//! from different sources, so their vertical runs can overlap.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::instruction::{Instruction, Point};
use crate::model::{Anchor, GanttOptions, RelationKind, Task};

/// Smallest vertical offset of a line from a bar's centre; also the arrowhead size.
pub const RELATION_MIN_GAP: f32 = 5.0;
/// Distance between neighbouring lanes.
pub const RELATION_BOUNDARY_PADDING: f32 = 10.0;
pub const RELATION_VERTICAL_OFFSET_MULTIPLIER: f32 = 1.5;
pub const RELATION_MIDPOINT_DIVISOR: f32 = 2.0;

/// Vertical offset of a relation line from its bars' centre line.
pub fn relation_gap(kind: RelationKind) -> f32 {
    RELATION_MIN_GAP
        + match kind {
            RelationKind::FinishToStart => 0.0,
            RelationKind::StartToStart => 3.0,
            RelationKind::FinishToFinish => 6.0,
            RelationKind::StartToFinish => 9.0,
        }
}

/// Horizontal pixel extent `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub min: f32,
    pub max: f32,
}

impl Boundary {
    /// Contains nothing; the first [`Boundary::include`] sets both edges.
    pub const EMPTY: Boundary = Boundary {
        min: f32::MAX,
        max: f32::MIN,
    };

    pub fn include(&mut self, start: f32, end: f32) {
        self.min = self.min.min(start);
        self.max = self.max.max(end);
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    fn padded(&self, padding: f32) -> Boundary {
        Boundary {
            min: self.min - padding,
            max: self.max + padding,
        }
    }
}

impl Default for Boundary {
    fn default() -> Self {
        Boundary::EMPTY
    }
}

/// Lanes claimed so far, keyed by `(target id, kind)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaneRegistry {
    lanes: HashMap<(String, RelationKind), Boundary>,
}

impl LaneRegistry {
    pub fn get(&self, target: &str, kind: RelationKind) -> Option<Boundary> {
        self.lanes.get(&(target.to_string(), kind)).copied()
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }
}

/// Left and right anchor of a bar on its centre line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoints {
    pub start: Point,
    pub end: Point,
}

impl Endpoints {
    fn anchor(&self, anchor: Anchor) -> Point {
        match anchor {
            Anchor::Start => self.start,
            Anchor::Finish => self.end,
        }
    }
}

/// One routed dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutedRelation {
    /// `"<source>#<target>#<kind>"`.
    pub key: String,
    pub source: String,
    pub target: String,
    pub kind: RelationKind,
    pub lane: Boundary,
    pub instructions: Vec<Instruction>,
}

pub fn relation_key(source: &str, target: &str, kind: RelationKind) -> String {
    format!("{source}#{target}#{kind}")
}

/// Output of [`RelationRouter::route_all`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Routing {
    pub relations: Vec<RoutedRelation>,
    pub lanes: LaneRegistry,
}

impl Routing {
    pub fn get(&self, key: &str) -> Option<&RoutedRelation> {
        self.relations.iter().find(|r| r.key == key)
    }
}

/// Where the pen is between routing stages.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    x: f32,
    y: f32,
}

/// `+1` when the path runs upwards into the target, `-1` when downwards.
fn direction(going_down: bool) -> f32 {
    if going_down {
        -1.0
    } else {
        1.0
    }
}

fn anchor_sign(anchor: Anchor) -> f32 {
    match anchor {
        Anchor::Finish => 1.0,
        Anchor::Start => -1.0,
    }
}

pub struct RelationRouter<'a> {
    options: &'a GanttOptions,
}

impl<'a> RelationRouter<'a> {
    pub fn new(options: &'a GanttOptions) -> Self {
        Self { options }
    }

    fn radius(&self) -> f32 {
        self.options.curve_radius
    }

    /// Route every relation of `tasks` whose source and target both have a bar.
    ///
    /// `bars` maps a task id to the `(top-left, bottom-right)` corners of its
    /// main bar; `extent` is the horizontal span of all laid-out bars.
    pub fn route_all<'t, F>(
        &self,
        tasks: impl IntoIterator<Item = &'t Task>,
        bars: F,
        extent: Boundary,
    ) -> Routing
    where
        F: Fn(&str) -> Option<(Point, Point)>,
    {
        let mut shared = extent.padded(RELATION_BOUNDARY_PADDING * 2.0);
        let mut routing = Routing::default();
        let mid = self.options.bar_height / 2.0;
        let endpoints = |(start, end): (Point, Point)| Endpoints {
            start: Point::new(start.x, start.y + mid),
            end: Point::new(end.x, start.y + mid),
        };

        for task in tasks {
            for relation in &task.relations {
                if relation.target.is_empty() || relation.target == task.id {
                    trace!(task = %task.id, "skipping self relation");
                    continue;
                }
                let (Some(source), Some(target)) = (bars(&task.id), bars(&relation.target)) else {
                    trace!(source = %task.id, target = %relation.target, "relation endpoint not laid out");
                    continue;
                };

                let lane_key = (relation.target.clone(), relation.kind);
                let (lane, claimed) = match routing.lanes.lanes.get(&lane_key) {
                    Some(lane) => (*lane, false),
                    None => {
                        routing.lanes.lanes.insert(lane_key, shared);
                        (shared, true)
                    }
                };

                let instructions =
                    self.route(endpoints(source), endpoints(target), relation.kind, lane);
                let routed = RoutedRelation {
                    key: relation_key(&task.id, &relation.target, relation.kind),
                    source: task.id.clone(),
                    target: relation.target.clone(),
                    kind: relation.kind,
                    lane,
                    instructions,
                };
                match routing.relations.iter_mut().find(|r| r.key == routed.key) {
                    Some(existing) => *existing = routed,
                    None => routing.relations.push(routed),
                }

                if claimed {
                    if relation.kind.touches(Anchor::Finish) {
                        shared.max += RELATION_BOUNDARY_PADDING;
                    }
                    if relation.kind.touches(Anchor::Start) {
                        shared.min -= RELATION_BOUNDARY_PADDING;
                    }
                }
            }
        }
        routing
    }

    /// Paint program of a single relation through `lane`.
    pub fn route(
        &self,
        source: Endpoints,
        target: Endpoints,
        kind: RelationKind,
        lane: Boundary,
    ) -> Vec<Instruction> {
        let gap = relation_gap(kind);
        let going_down = source.end.y < target.end.y;
        let dir = direction(going_down);
        let source_anchor = kind.source_anchor();
        let target_anchor = kind.target_anchor();

        let mut out = vec![Instruction::BeginPath];
        let mut cursor = self.source_segment(source_anchor, source, lane, going_down, gap, &mut out);
        if source_anchor != target_anchor {
            cursor = self.cross_segment(cursor, target_anchor, target, lane, dir, &mut out);
        }
        self.target_segment(cursor, target_anchor, target, dir, gap, &mut out);
        self.arrowhead(target_anchor, target, gap, &mut out);
        out
    }

    fn lane_x(&self, anchor: Anchor, lane: Boundary) -> f32 {
        match anchor {
            Anchor::Start => lane.min + self.radius(),
            Anchor::Finish => lane.max - self.radius(),
        }
    }

    /// Out of the source anchor to its lane, turning towards the target.
    fn source_segment(
        &self,
        anchor: Anchor,
        source: Endpoints,
        lane: Boundary,
        going_down: bool,
        gap: f32,
        out: &mut Vec<Instruction>,
    ) -> Cursor {
        let r = self.radius();
        let from = source.anchor(anchor);
        let boundary_x = self.lane_x(anchor, lane);
        let y = from.y - gap;

        out.push(Instruction::move_to(Point::new(from.x, y)));
        out.push(Instruction::line_to(Point::new(boundary_x, y)));

        let corner_x = match anchor {
            Anchor::Start => boundary_x - r,
            Anchor::Finish => boundary_x + r,
        };
        let turned_y = from.y + if going_down { r } else { -r } - gap;
        out.push(Instruction::arc_to(
            Point::new(corner_x, y),
            Point::new(corner_x, turned_y),
            r,
        ));
        Cursor {
            x: corner_x,
            y: turned_y,
        }
    }

    /// Past the target row, across to the lane on the target's side and back.
    fn cross_segment(
        &self,
        cursor: Cursor,
        anchor: Anchor,
        target: Endpoints,
        lane: Boundary,
        dir: f32,
        out: &mut Vec<Instruction>,
    ) -> Cursor {
        let r = self.radius();
        let offset = self.options.bar_vertical_residue * RELATION_VERTICAL_OFFSET_MULTIPLIER;
        let target_y = target.start.y + anchor_sign(anchor) * RELATION_MIN_GAP;

        out.push(Instruction::line_to(Point::new(
            cursor.x,
            target_y + dir * (offset + r),
        )));

        let to = target.anchor(anchor);
        let final_x = self.lane_x(anchor, lane);
        let corner_y = target_y + dir * offset;
        out.push(Instruction::arc_to(
            Point::new(cursor.x, corner_y),
            Point::new(to.x, corner_y),
            r,
        ));

        let before_corner_x = match anchor {
            Anchor::Finish => final_x - r,
            Anchor::Start => final_x + r,
        };
        out.push(Instruction::line_to(Point::new(before_corner_x, corner_y)));

        let midpoint_y = target_y + dir * offset / RELATION_MIDPOINT_DIVISOR;
        out.push(Instruction::arc_to(
            Point::new(final_x, corner_y),
            Point::new(final_x, midpoint_y),
            r,
        ));

        Cursor {
            x: final_x,
            y: target_y + dir * r,
        }
    }

    /// Down (or up) the lane and into the target anchor.
    fn target_segment(
        &self,
        cursor: Cursor,
        anchor: Anchor,
        target: Endpoints,
        dir: f32,
        gap: f32,
        out: &mut Vec<Instruction>,
    ) {
        let r = self.radius();
        let to = target.anchor(anchor);
        let end_y = to.y + gap;

        out.push(Instruction::line_to(Point::new(cursor.x, end_y + dir * r)));
        out.push(Instruction::arc_to(
            Point::new(cursor.x, end_y),
            Point::new(to.x, end_y),
            r,
        ));
        out.push(Instruction::line_to(Point::new(to.x, end_y)));
    }

    fn arrowhead(&self, anchor: Anchor, target: Endpoints, gap: f32, out: &mut Vec<Instruction>) {
        let tip = target.anchor(anchor);
        let tip = Point::new(tip.x, tip.y + gap);
        let back_x = tip.x + anchor_sign(anchor) * RELATION_MIN_GAP;
        out.push(Instruction::Triangle {
            a: Point::new(back_x, tip.y - RELATION_MIN_GAP),
            b: tip,
            c: Point::new(back_x, tip.y + RELATION_MIN_GAP),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bars<'a>(map: &'a [(&'static str, (f32, f32, f32))]) -> impl Fn(&str) -> Option<(Point, Point)> + 'a {
        move |id| {
            map.iter()
                .find(|(key, _)| *key == id)
                .map(|(_, (x0, x1, y))| (Point::new(*x0, *y), Point::new(*x1, *y + 40.0)))
        }
    }

    #[test]
    fn finish_to_start_path_shape() {
        let options = GanttOptions::default();
        let router = RelationRouter::new(&options);
        let lane = Boundary { min: 0.0, max: 500.0 };
        let source = Endpoints {
            start: Point::new(100.0, 30.0),
            end: Point::new(200.0, 30.0),
        };
        let target = Endpoints {
            start: Point::new(250.0, 90.0),
            end: Point::new(300.0, 90.0),
        };
        let ins = router.route(source, target, RelationKind::FinishToStart, lane);

        assert_eq!(ins[0], Instruction::BeginPath);
        // Leaves the finish edge 5px above centre towards the max lane.
        assert_eq!(ins[1], Instruction::MoveTo { x: 200.0, y: 25.0 });
        assert_eq!(ins[2], Instruction::LineTo { x: 495.0, y: 25.0 });
        // Crossing to the min lane happens because the anchors differ.
        assert!(ins.iter().any(|i| matches!(i, Instruction::LineTo { x, .. } if *x == 10.0)));
        // Ends on the target start edge with an arrowhead pointing at it.
        assert_eq!(ins[ins.len() - 2], Instruction::LineTo { x: 250.0, y: 95.0 });
        assert_eq!(
            ins[ins.len() - 1],
            Instruction::Triangle {
                a: Point::new(245.0, 90.0),
                b: Point::new(250.0, 95.0),
                c: Point::new(245.0, 100.0),
            }
        );
    }

    #[test]
    fn same_anchor_kinds_skip_the_crossing() {
        let options = GanttOptions::default();
        let router = RelationRouter::new(&options);
        let lane = Boundary { min: 0.0, max: 500.0 };
        let a = Endpoints {
            start: Point::new(100.0, 30.0),
            end: Point::new(200.0, 30.0),
        };
        let b = Endpoints {
            start: Point::new(250.0, 90.0),
            end: Point::new(300.0, 90.0),
        };
        let ss = router.route(a, b, RelationKind::StartToStart, lane);
        let fs = router.route(a, b, RelationKind::FinishToStart, lane);
        assert_eq!(ss.len(), 8);
        assert_eq!(fs.len(), 12);
        // Every point of a start-to-start path stays on the min side of the bars.
        assert!(ss
            .iter()
            .flat_map(|i| i.points())
            .all(|p| p.x <= 250.0));
    }

    #[test]
    fn skips_self_and_dangling_relations() {
        let options = GanttOptions::default();
        let router = RelationRouter::new(&options);
        let tasks = vec![
            Task::new("a", "A")
                .with_relation("a", RelationKind::FinishToStart)
                .with_relation("ghost", RelationKind::FinishToStart),
        ];
        let layout = [("a", (100.0, 200.0, 10.0))];
        let routing = router.route_all(&tasks, bars(&layout), Boundary { min: 100.0, max: 200.0 });
        assert!(routing.relations.is_empty());
        assert!(routing.lanes.is_empty());
    }

    #[test]
    fn shared_target_and_kind_reuse_one_lane() {
        let options = GanttOptions::default();
        let router = RelationRouter::new(&options);
        let tasks = vec![
            Task::new("a", "A").with_relation("c", RelationKind::FinishToStart),
            Task::new("b", "B").with_relation("c", RelationKind::FinishToStart),
            Task::new("c", "C"),
        ];
        let layout = [
            ("a", (100.0, 200.0, 10.0)),
            ("b", (120.0, 220.0, 70.0)),
            ("c", (300.0, 400.0, 130.0)),
        ];
        let routing = router.route_all(&tasks, bars(&layout), Boundary { min: 100.0, max: 400.0 });
        let ac = routing.get("a#c#FS").unwrap();
        let bc = routing.get("b#c#FS").unwrap();
        assert_eq!(ac.lane, bc.lane);
        assert_eq!(ac.lane, Boundary { min: 80.0, max: 420.0 });
        assert_eq!(routing.lanes.len(), 1);
    }

    #[test]
    fn distinct_pairs_get_distinct_lanes() {
        let options = GanttOptions::default();
        let router = RelationRouter::new(&options);
        let tasks = vec![
            Task::new("a", "A")
                .with_relation("b", RelationKind::FinishToStart)
                .with_relation("c", RelationKind::FinishToStart),
            Task::new("b", "B"),
            Task::new("c", "C"),
        ];
        let layout = [
            ("a", (100.0, 200.0, 10.0)),
            ("b", (300.0, 400.0, 70.0)),
            ("c", (300.0, 400.0, 130.0)),
        ];
        let routing = router.route_all(&tasks, bars(&layout), Boundary { min: 100.0, max: 400.0 });
        let ab = routing.get("a#b#FS").unwrap().lane;
        let ac = routing.get("a#c#FS").unwrap().lane;
        assert_eq!(ab, Boundary { min: 80.0, max: 420.0 });
        assert_eq!(ac, Boundary { min: 70.0, max: 430.0 });
    }

    #[test]
    fn finish_only_kinds_widen_only_the_max_side() {
        let options = GanttOptions::default();
        let router = RelationRouter::new(&options);
        let tasks = vec![
            Task::new("a", "A")
                .with_relation("b", RelationKind::FinishToFinish)
                .with_relation("c", RelationKind::StartToStart)
                .with_relation("d", RelationKind::FinishToFinish),
            Task::new("b", "B"),
            Task::new("c", "C"),
            Task::new("d", "D"),
        ];
        let layout = [
            ("a", (100.0, 200.0, 10.0)),
            ("b", (300.0, 400.0, 70.0)),
            ("c", (300.0, 400.0, 130.0)),
            ("d", (300.0, 400.0, 190.0)),
        ];
        let routing = router.route_all(&tasks, bars(&layout), Boundary { min: 100.0, max: 400.0 });
        assert_eq!(routing.get("a#b#FF").unwrap().lane, Boundary { min: 80.0, max: 420.0 });
        assert_eq!(routing.get("a#c#SS").unwrap().lane, Boundary { min: 80.0, max: 430.0 });
        assert_eq!(routing.get("a#d#FF").unwrap().lane, Boundary { min: 70.0, max: 430.0 });
    }
}
