//! Per-granularity layout: label rows, date header, bar geometry and routed
//! relations, rebuilt wholesale on every pass.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::instruction::{hit_test, Geometry, Instruction, Point};
use super::router::{Boundary, LaneRegistry, RelationRouter, RoutedRelation, Routing};
use super::text::{fit_text, TextMeasure};
use super::time_scale::{self, DateHeader};
use super::tree::{OperationStore, TaskTree};
use crate::model::{ChartZone, Duration, GanttOptions, Granularity, Header, Task};

/// Inner padding on both sides of a label cell.
pub const COLUMN_PADDING: f32 = 10.0;
/// Room left of the first column's text for the expand/collapse symbol.
pub const FIRST_COLUMN_PADDING: f32 = 20.0;
pub const TOOLTIP_MIN_WIDTH: f32 = 200.0;
pub const TOOLTIP_MAX_WIDTH: f32 = 400.0;
/// Horizontal text inset inside the tooltip box.
pub const TOOLTIP_TEXT_INSET: f32 = 10.0;

const MISSING_CELL: &str = "N/A";

/// Tooltip and click payload of one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarData {
    /// Task id for the main duration, `"<task>#<duration>"` otherwise.
    pub key: String,
    pub task_id: String,
    pub duration_id: String,
    pub title: String,
    pub description: String,
    /// Fill colour.
    pub class: String,
    pub start_date: String,
    pub end_date: String,
    pub percentage: String,
    pub tooltip_width: f32,
}

impl BarData {
    pub fn headline(&self) -> String {
        format!("{} {}", self.title, self.percentage)
    }
}

/// Payload of one label-column row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowData {
    pub task_id: String,
    pub title: String,
}

pub type BarGeometry = Geometry<BarData>;
pub type RowGeometry = Geometry<RowData>;

/// Geometry key of a duration bar.
pub fn bar_key(task: &Task, duration: &Duration, is_main: bool) -> String {
    if is_main {
        task.id.clone()
    } else {
        format!("{}#{}", task.id, duration.id)
    }
}

/// Layout of one granularity.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    granularity: Granularity,
    options: GanttOptions,
    headers: Vec<Header>,
    timezone: Option<ChartZone>,

    visible: Vec<String>,
    window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    date_header: DateHeader,
    boundary: Boundary,
    slots: usize,
    rows: Vec<RowGeometry>,
    bars: Vec<BarGeometry>,
    bar_index: HashMap<String, usize>,
    routing: Routing,
}

impl LayoutEngine {
    pub fn new(
        granularity: Granularity,
        headers: Vec<Header>,
        options: GanttOptions,
        timezone: Option<ChartZone>,
    ) -> Self {
        Self {
            granularity,
            options,
            headers,
            timezone,
            visible: Vec::new(),
            window: None,
            date_header: DateHeader::default(),
            boundary: Boundary::EMPTY,
            slots: 0,
            rows: Vec::new(),
            bars: Vec::new(),
            bar_index: HashMap::new(),
            routing: Routing::default(),
        }
    }

    /// Recompute everything from the tree's current visible set.
    ///
    /// `today` anchors the date window when no visible duration is drawable.
    pub fn layout(&mut self, tree: &TaskTree, measure: &dyn TextMeasure, today: DateTime<Utc>) {
        let flat = tree.flatten();
        self.reset();
        self.visible = flat.visible.iter().map(|t| t.id.clone()).collect();
        self.slots = flat.slots;

        self.lay_out_rows(&flat.visible, tree.operations(), measure);
        let (min, max) = flat.window.unwrap_or((today, today));
        self.lay_out_bars(&flat.visible, min, max, measure);

        let routing = RelationRouter::new(&self.options).route_all(
            flat.visible.iter().copied(),
            |id| self.bar(id).map(|bar| (bar.start, bar.end)),
            self.boundary,
        );
        self.routing = routing;

        debug!(
            granularity = %self.granularity,
            rows = self.rows.len(),
            bars = self.bars.len(),
            relations = self.routing.relations.len(),
            units = self.date_header.total_units,
            "layout pass complete"
        );
    }

    fn reset(&mut self) {
        self.visible.clear();
        self.window = None;
        self.date_header = DateHeader::default();
        self.boundary = Boundary::EMPTY;
        self.slots = 0;
        self.rows.clear();
        self.bars.clear();
        self.bar_index.clear();
        self.routing = Routing::default();
    }

    fn lay_out_rows(&mut self, visible: &[&Task], ops: &OperationStore, measure: &dyn TextMeasure) {
        let column_width = self.options.column_width;
        let mut y = 0.0;

        for task in visible {
            let height = self.options.box_height * task.bar_slots() as f32;
            let text_y = y + height / 2.0;
            let mut x = 0.0;
            let mut instructions = Vec::with_capacity(self.headers.len() * 3);

            for (i, header) in self.headers.iter().enumerate() {
                let (width, left, symbol) = if i == 0 {
                    (
                        column_width * 2.0,
                        COLUMN_PADDING + ops.indent(&task.id),
                        ops.symbol(&task.id).glyph(),
                    )
                } else {
                    (column_width, COLUMN_PADDING, "")
                };
                let cell = task
                    .data
                    .get(&header.id)
                    .map(String::as_str)
                    .filter(|s| !s.is_empty())
                    .unwrap_or(MISSING_CELL);
                let text = fit_text(measure, width - (left + COLUMN_PADDING), cell);

                instructions.push(Instruction::Rect {
                    x,
                    y,
                    width,
                    height,
                });
                instructions.push(Instruction::text(symbol, left + x - FIRST_COLUMN_PADDING, text_y));
                instructions.push(Instruction::text(text, left + x, text_y));
                x += width;
            }

            self.rows.push(Geometry {
                start: Point::new(0.0, y),
                end: Point::new(column_width * 2.0, y + height),
                instructions,
                data: RowData {
                    task_id: task.id.clone(),
                    title: task.name.clone(),
                },
            });
            y += height;
        }
    }

    fn lay_out_bars(
        &mut self,
        visible: &[&Task],
        min: DateTime<Utc>,
        max: DateTime<Utc>,
        measure: &dyn TextMeasure,
    ) {
        let g = self.granularity;
        let (min, max) = time_scale::pad_window(min, max, g, self.timezone);
        self.window = Some((min, max));
        self.date_header = time_scale::header(g, min, max, self.timezone);

        let step = self.options.bar_height + self.options.bar_vertical_residue;
        let mut y = self.options.bar_vertical_residue / 2.0;

        for task in visible {
            let mut drawn = false;
            for (idx, duration) in task.durations().enumerate() {
                let (Some(start), Some(end)) = (duration.start, duration.end) else {
                    continue;
                };
                let (start_x, end_x) = time_scale::bar_extent(
                    min,
                    start,
                    end,
                    g,
                    self.timezone,
                    self.minimum_bar_width(),
                );
                self.boundary.include(start_x, end_x);

                let bar = self.build_bar(task, duration, idx == 0, start_x, end_x, y, measure);
                self.bar_index.insert(bar.data.key.clone(), self.bars.len());
                self.bars.push(bar);
                y += step;
                drawn = true;
            }
            if !drawn {
                y += step;
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build_bar(
        &self,
        task: &Task,
        duration: &Duration,
        is_main: bool,
        start_x: f32,
        end_x: f32,
        y: f32,
        measure: &dyn TextMeasure,
    ) -> BarGeometry {
        let o = &self.options;
        let width = end_x - start_x;
        let label = fit_text(
            measure,
            width - o.bar_horizontal_residue * 2.0,
            &format!("{} | {}", task.name, duration.name),
        );
        let instructions = vec![
            Instruction::BeginPath,
            Instruction::move_to(Point::new(start_x + o.curve_radius, y)),
            Instruction::Box {
                x: start_x,
                y,
                width,
                height: o.bar_height,
                radius: o.curve_radius,
            },
            Instruction::ClosePath,
            Instruction::Fill,
            Instruction::Stroke,
            Instruction::text(label, start_x + o.bar_horizontal_residue, y + o.bar_height / 2.0),
        ];

        let start_date = time_scale::format_instant(duration.start, self.timezone);
        let end_date = time_scale::format_instant(duration.end, self.timezone);
        let percentage = format!("{} %", duration.percentage);
        let widest = [
            format!("{} | {} {}", task.name, duration.name, percentage),
            format!("Start Date: {start_date}"),
            format!("End Date: {end_date}"),
        ]
        .iter()
        .map(|line| measure.text_width(line))
        .fold(0.0_f32, f32::max);
        let tooltip_width =
            (widest + TOOLTIP_TEXT_INSET * 2.0).clamp(TOOLTIP_MIN_WIDTH, TOOLTIP_MAX_WIDTH);

        Geometry {
            start: Point::new(start_x, y),
            end: Point::new(end_x, y + o.bar_height),
            instructions,
            data: BarData {
                key: bar_key(task, duration, is_main),
                task_id: task.id.clone(),
                duration_id: duration.id.clone(),
                title: task.name.clone(),
                description: duration.name.clone(),
                class: duration.class.clone(),
                start_date,
                end_date,
                percentage,
                tooltip_width,
            },
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn unit_width(&self) -> f32 {
        self.granularity.unit_width()
    }

    pub fn options(&self) -> &GanttOptions {
        &self.options
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn timezone(&self) -> Option<ChartZone> {
        self.timezone
    }

    /// Ids of the visible tasks, in display order.
    pub fn visible(&self) -> &[String] {
        &self.visible
    }

    /// Padded date window of the last pass.
    pub fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.window
    }

    pub fn date_header(&self) -> &DateHeader {
        &self.date_header
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Stacked bar slots of all visible rows.
    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn rows(&self) -> &[RowGeometry] {
        &self.rows
    }

    pub fn bars(&self) -> &[BarGeometry] {
        &self.bars
    }

    pub fn bar(&self, key: &str) -> Option<&BarGeometry> {
        self.bar_index.get(key).map(|&idx| &self.bars[idx])
    }

    pub fn row(&self, task_id: &str) -> Option<&RowGeometry> {
        self.rows.iter().find(|r| r.data.task_id == task_id)
    }

    pub fn relations(&self) -> &[RoutedRelation] {
        &self.routing.relations
    }

    /// Routed relation by `"<source>#<target>#<kind>"` key.
    pub fn relation(&self, key: &str) -> Option<&RoutedRelation> {
        self.routing.get(key)
    }

    pub fn lanes(&self) -> &LaneRegistry {
        &self.routing.lanes
    }

    pub fn minimum_bar_width(&self) -> f32 {
        self.options.bar_vertical_residue
    }

    /// Width of the full timeline.
    pub fn content_width(&self) -> f32 {
        self.date_header.total_units as f32 * self.unit_width()
    }

    /// Height of the full label column.
    pub fn content_height(&self) -> f32 {
        self.slots as f32 * self.options.box_height
    }

    /// Bar under a point in chart-local coordinates.
    pub fn bar_at(&self, p: Point) -> Option<&BarGeometry> {
        hit_test(&self.bars, p)
    }

    /// Label row under a point in label-column-local coordinates.
    pub fn row_at(&self, p: Point) -> Option<&RowGeometry> {
        hit_test(&self.rows, p)
    }
}
