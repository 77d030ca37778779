//! Paints one frame of a laid-out chart into the four clipped regions.

use super::surface::{interpret, rounded_rect, Surface, TextAlign};
use crate::layout::engine::{BarGeometry, COLUMN_PADDING, FIRST_COLUMN_PADDING};
use crate::layout::{fit_text, LayoutEngine, Point, Region, Regions, Scroll, Size, TextMeasure};
use crate::model::{GanttOptions, Header, RelationColors};

pub const RELATION_LINE_WIDTH: f32 = 2.0;
pub const GRID_LINE_WIDTH: f32 = 1.5;

pub const TOOLTIP_OFFSET_X: f32 = 100.0;
pub const TOOLTIP_OFFSET_Y: f32 = 65.0;
pub const TOOLTIP_HEIGHT: f32 = 55.0;
pub const TOOLTIP_RADIUS: f32 = 2.0;
pub const TOOLTIP_TRIANGLE: f32 = 5.0;
const TOOLTIP_BG: &str = "#000000";
const TOOLTIP_FONT: &str = "10px Arial";
const TOOLTIP_LINE_STEP: f32 = 15.0;

/// Fill of bars whose duration has no class.
pub const DEFAULT_BAR_FILL: &str = "#90caf9";

/// Everything one frame needs besides the layout itself.
pub struct FrameState<'a> {
    pub regions: &'a Regions,
    pub scroll: &'a Scroll,
    pub canvas: Size,
    /// Hovered bar and the pointer position on the canvas.
    pub tooltip: Option<(Point, &'a BarGeometry)>,
}

pub struct Painter<'a> {
    options: &'a GanttOptions,
    colors: &'a RelationColors,
    measure: &'a dyn TextMeasure,
}

impl<'a> Painter<'a> {
    pub fn new(
        options: &'a GanttOptions,
        colors: &'a RelationColors,
        measure: &'a dyn TextMeasure,
    ) -> Self {
        Self {
            options,
            colors,
            measure,
        }
    }

    fn reset_styles(&self, surface: &mut dyn Surface) {
        surface.set_fill_style(&self.options.canvas_bg);
        surface.set_stroke_style(&self.options.line_color);
        surface.set_text_color(&self.options.font_color);
        surface.set_font(&self.options.font);
        surface.set_line_width(1.0);
        surface.set_text_align(TextAlign::Left);
    }

    /// Clip to `region`, move the origin to it shifted by `(sx, sy)` of scroll.
    fn in_region(
        surface: &mut dyn Surface,
        region: Region,
        sx: f32,
        sy: f32,
        draw: impl FnOnce(&mut dyn Surface),
    ) {
        surface.save();
        surface.clip(region);
        surface.translate(region.x - sx, region.y - sy);
        draw(surface);
        surface.restore();
    }

    pub fn clear(&self, surface: &mut dyn Surface, regions: &Regions) {
        surface.clear(Region::new(
            0.0,
            0.0,
            regions.chart.x + regions.chart.width,
            regions.chart.y + regions.chart.height,
        ));
    }

    /// The whole frame.
    pub fn paint(&self, surface: &mut dyn Surface, engine: &LayoutEngine, frame: &FrameState<'_>) {
        let regions = frame.regions;
        let scroll = frame.scroll;
        let height = frame.canvas.height;

        self.clear(surface, regions);
        self.reset_styles(surface);

        Self::in_region(surface, regions.header, 0.0, 0.0, |s| {
            self.draw_headers(s, engine.headers(), regions.header)
        });
        Self::in_region(surface, regions.dates, scroll.x, 0.0, |s| {
            self.draw_date_headers(s, engine)
        });
        Self::in_region(surface, regions.labels, 0.0, scroll.y, |s| {
            self.draw_rows(s, engine, regions.labels.width, height)
        });
        Self::in_region(surface, regions.chart, scroll.x, scroll.y, |s| {
            self.draw_bars(s, engine, height);
            self.draw_relations(s, engine);
        });

        if let Some((position, bar)) = frame.tooltip {
            self.draw_tooltip(surface, position, bar);
        }
    }

    pub fn draw_headers(&self, surface: &mut dyn Surface, headers: &[Header], region: Region) {
        surface.set_fill_style(&self.options.header_bg);
        surface.fill_rect(0.0, 0.0, region.width, region.height);
        surface.set_fill_style(&self.options.canvas_bg);

        let mut x = 0.0;
        for (i, header) in headers.iter().enumerate() {
            let (width, left) = if i == 0 {
                (self.options.column_width * 2.0, COLUMN_PADDING + FIRST_COLUMN_PADDING)
            } else {
                (self.options.column_width, COLUMN_PADDING)
            };
            surface.stroke_rect(x, 0.0, width, region.height);
            let text = fit_text(self.measure, width - (left + COLUMN_PADDING), &header.name);
            surface.fill_text(&text, x + left, region.height / 2.0);
            x += width;
        }
    }

    pub fn draw_date_headers(&self, surface: &mut dyn Surface, engine: &LayoutEngine) {
        let header = engine.date_header();
        let unit = engine.unit_width();
        let h = self.options.header_height;

        surface.set_fill_style(&self.options.header_bg);
        surface.fill_rect(0.0, 0.0, header.total_units as f32 * unit, h);
        surface.set_fill_style(&self.options.canvas_bg);
        surface.set_text_align(TextAlign::Center);
        for (i, label) in header.labels.iter().enumerate() {
            let x = i as f32 * unit;
            surface.stroke_rect(x, 0.0, unit, h);
            surface.fill_text(label, x + unit / 2.0, h / 2.0);
        }
        surface.set_text_align(TextAlign::Left);
    }

    pub fn draw_rows(&self, surface: &mut dyn Surface, engine: &LayoutEngine, width: f32, height: f32) {
        surface.fill_rect(0.0, 0.0, width, engine.content_height().max(height));
        for row in engine.rows() {
            interpret(&row.instructions, surface);
        }
    }

    /// Grid, row separators and duration bars.
    pub fn draw_bars(&self, surface: &mut dyn Surface, engine: &LayoutEngine, height: f32) {
        let width = engine.content_width();
        let chart_height = engine.content_height().max(height);
        surface.fill_rect(0.0, 0.0, width, chart_height);

        surface.set_line_width(GRID_LINE_WIDTH);
        for i in 0..=engine.date_header().total_units {
            let x = i as f32 * engine.unit_width();
            surface.begin_path();
            surface.move_to(x, 0.0);
            surface.line_to(x, chart_height);
            surface.stroke();
        }
        for row in engine.rows() {
            surface.begin_path();
            surface.move_to(0.0, row.end.y);
            surface.line_to(width, row.end.y);
            surface.stroke();
        }
        surface.set_line_width(1.0);

        for bar in engine.bars() {
            let fill = if bar.data.class.is_empty() {
                DEFAULT_BAR_FILL
            } else {
                bar.data.class.as_str()
            };
            surface.set_fill_style(fill);
            interpret(&bar.instructions, surface);
        }
        surface.set_fill_style(&self.options.canvas_bg);
    }

    pub fn draw_relations(&self, surface: &mut dyn Surface, engine: &LayoutEngine) {
        surface.set_line_width(RELATION_LINE_WIDTH);
        for relation in engine.relations() {
            let color = self.colors.color(relation.kind);
            surface.set_stroke_style(color);
            surface.set_fill_style(color);
            interpret(&relation.instructions, surface);
        }
        surface.set_stroke_style(&self.options.line_color);
        surface.set_fill_style(&self.options.canvas_bg);
        surface.set_line_width(1.0);
    }

    /// Box above-left of `position` with a pointer triangle down to it.
    pub fn draw_tooltip(&self, surface: &mut dyn Surface, position: Point, bar: &BarGeometry) {
        let left = position.x - TOOLTIP_OFFSET_X;
        let top = position.y - TOOLTIP_OFFSET_Y;
        let base = position.y - (TOOLTIP_OFFSET_Y - TOOLTIP_HEIGHT);

        surface.set_fill_style(TOOLTIP_BG);
        surface.set_stroke_style(TOOLTIP_BG);
        rounded_rect(
            surface,
            left,
            top,
            bar.data.tooltip_width,
            TOOLTIP_HEIGHT,
            TOOLTIP_RADIUS,
        );
        surface.fill();
        surface.begin_path();
        surface.move_to(position.x, position.y);
        surface.line_to(position.x - TOOLTIP_TRIANGLE, base);
        surface.line_to(position.x + TOOLTIP_TRIANGLE, base);
        surface.close_path();
        surface.fill();

        surface.set_text_color(&self.options.line_color);
        surface.set_font(TOOLTIP_FONT);
        let x = left + COLUMN_PADDING;
        let lines = [
            bar.data.headline(),
            format!("Start Date: {}", bar.data.start_date),
            format!("End Date: {}", bar.data.end_date),
        ];
        for (i, line) in lines.iter().enumerate() {
            surface.fill_text(line, x, top + TOOLTIP_LINE_STEP * (i as f32 + 1.0));
        }

        self.reset_styles(surface);
    }
}
