//! egui backends for the engine's drawing and text measuring seams.

use egui::epaint::{PathShape, PathStroke};
use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, Vec2};
use gantt_canvas::layout::{Region, Size, TextMeasure};
use gantt_canvas::render::{Surface, TextAlign};

use crate::ui::theme;

/// Line segments used to approximate one curve.
const CURVE_SEGMENTS: usize = 8;

/// Measures with egui's font atlas.
pub struct EguiMeasure {
    ctx: egui::Context,
    font: FontId,
}

impl EguiMeasure {
    pub fn new(ctx: egui::Context, font: &str) -> Self {
        Self {
            ctx,
            font: theme::chart_font(font),
        }
    }
}

impl TextMeasure for EguiMeasure {
    fn text_width(&self, text: &str) -> f32 {
        self.ctx.fonts(|fonts| {
            fonts
                .layout_no_wrap(text.to_owned(), self.font.clone(), Color32::WHITE)
                .size()
                .x
        })
    }
}

#[derive(Clone)]
struct State {
    offset: Vec2,
    clip: Rect,
    fill: Color32,
    stroke: Color32,
    text: Color32,
    line_width: f32,
    font: FontId,
    align: TextAlign,
}

#[derive(Default)]
struct SubPath {
    points: Vec<Pos2>,
    closed: bool,
}

/// A [`Surface`] that turns canvas calls into egui shapes, relative to the
/// top-left corner of the allocated chart rect.
pub struct EguiSurface {
    painter: Painter,
    origin: Pos2,
    background: Color32,
    /// egui tessellates at this ratio; rectangles snap to its pixel grid.
    pixel_ratio: f32,
    state: State,
    stack: Vec<State>,
    path: Vec<SubPath>,
}

impl EguiSurface {
    pub fn new(painter: Painter, origin: Pos2, background: Color32) -> Self {
        let clip = painter.clip_rect();
        Self {
            painter,
            origin,
            background,
            pixel_ratio: 1.0,
            state: State {
                offset: Vec2::ZERO,
                clip,
                fill: Color32::BLACK,
                stroke: Color32::BLACK,
                text: Color32::BLACK,
                line_width: 1.0,
                font: FontId::proportional(theme::DEFAULT_FONT_SIZE),
                align: TextAlign::Left,
            },
            stack: Vec::new(),
            path: Vec::new(),
        }
    }

    fn pos(&self, x: f32, y: f32) -> Pos2 {
        self.origin + self.state.offset + Vec2::new(x, y)
    }

    fn rect(&self, x: f32, y: f32, width: f32, height: f32) -> Rect {
        let min = self.pos(x, y);
        let max = min + Vec2::new(width, height);
        Rect::from_min_max(
            snap(min, self.pixel_ratio),
            snap(max, self.pixel_ratio),
        )
    }

    fn stroke_style(&self) -> Stroke {
        Stroke::new(self.state.line_width, self.state.stroke)
    }

    /// Last point of the open sub-path in surface coordinates.
    fn current(&self) -> Option<Pos2> {
        self.path.last()?.points.last().copied()
    }

    fn push_point(&mut self, p: Pos2) {
        match self.path.last_mut() {
            Some(sub) if !sub.closed => sub.points.push(p),
            _ => self.path.push(SubPath {
                points: vec![p],
                closed: false,
            }),
        }
    }
}

impl Surface for EguiSurface {
    fn set_backing_size(&mut self, _size: Size, pixel_ratio: f32) {
        // egui owns the framebuffer; only the ratio matters here.
        self.pixel_ratio = pixel_ratio.max(f32::EPSILON);
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
            self.painter.set_clip_rect(self.state.clip);
        }
    }

    fn clip(&mut self, region: Region) {
        let rect = self.rect(region.x, region.y, region.width, region.height);
        self.state.clip = self.state.clip.intersect(rect);
        self.painter.set_clip_rect(self.state.clip);
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.state.offset += Vec2::new(dx, dy);
    }

    fn clear(&mut self, region: Region) {
        let rect = self.rect(region.x, region.y, region.width, region.height);
        self.painter.rect_filled(rect, 0.0, self.background);
    }

    fn set_fill_style(&mut self, color: &str) {
        self.state.fill = theme::color_or(color, self.state.fill);
    }

    fn set_stroke_style(&mut self, color: &str) {
        self.state.stroke = theme::color_or(color, self.state.stroke);
    }

    fn set_text_color(&mut self, color: &str) {
        self.state.text = theme::color_or(color, self.state.text);
    }

    fn set_line_width(&mut self, width: f32) {
        self.state.line_width = width;
    }

    fn set_font(&mut self, font: &str) {
        self.state.font = theme::chart_font(font);
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.state.align = align;
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn close_path(&mut self) {
        if let Some(sub) = self.path.last_mut() {
            sub.closed = true;
        }
    }

    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.pos(x, y);
        self.path.push(SubPath {
            points: vec![p],
            closed: false,
        });
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.pos(x, y);
        self.push_point(p);
    }

    fn arc_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) {
        let corner = self.pos(x1, y1);
        let end = self.pos(x2, y2);
        let Some(start) = self.current() else {
            self.push_point(corner);
            return;
        };
        for p in arc_points(start, corner, end, radius) {
            self.push_point(p);
        }
    }

    fn quadratic_curve_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        let control = self.pos(cx, cy);
        let end = self.pos(x, y);
        let Some(start) = self.current() else {
            self.push_point(end);
            return;
        };
        for i in 1..=CURVE_SEGMENTS {
            let t = i as f32 / CURVE_SEGMENTS as f32;
            let u = 1.0 - t;
            let p = start.to_vec2() * (u * u) + control.to_vec2() * (2.0 * u * t) + end.to_vec2() * (t * t);
            self.push_point(p.to_pos2());
        }
    }

    fn fill(&mut self) {
        for sub in self.path.iter().filter(|sub| sub.points.len() >= 3) {
            self.painter.add(Shape::Path(PathShape {
                points: sub.points.clone(),
                closed: true,
                fill: self.state.fill,
                stroke: PathStroke::NONE,
            }));
        }
    }

    fn stroke(&mut self) {
        let stroke = self.stroke_style();
        for sub in self.path.iter().filter(|sub| sub.points.len() >= 2) {
            let shape = if sub.closed {
                Shape::closed_line(sub.points.clone(), stroke)
            } else {
                Shape::line(sub.points.clone(), stroke)
            };
            self.painter.add(shape);
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let rect = self.rect(x, y, width, height);
        self.painter.rect_filled(rect, 0.0, self.state.fill);
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let rect = self.rect(x, y, width, height);
        self.painter.rect_stroke(rect, 0.0, self.stroke_style());
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        let anchor = match self.state.align {
            TextAlign::Left => Align2::LEFT_CENTER,
            TextAlign::Center => Align2::CENTER_CENTER,
        };
        self.painter.text(
            self.pos(x, y),
            anchor,
            text,
            self.state.font.clone(),
            self.state.text,
        );
    }
}

/// Round `p` to the nearest device pixel.
fn snap(p: Pos2, pixel_ratio: f32) -> Pos2 {
    Pos2::new(
        (p.x * pixel_ratio).round() / pixel_ratio,
        (p.y * pixel_ratio).round() / pixel_ratio,
    )
}

/// Points of a canvas `arcTo`: a line to the first tangent point followed by
/// the arc of `radius` that rounds the corner at `corner`.
fn arc_points(start: Pos2, corner: Pos2, end: Pos2, radius: f32) -> Vec<Pos2> {
    let v1 = (start - corner).normalized();
    let v2 = (end - corner).normalized();
    let cos = v1.dot(v2).clamp(-1.0, 1.0);
    let theta = cos.acos();
    if radius <= 0.0 || !theta.is_finite() || theta < 1e-4 || (std::f32::consts::PI - theta) < 1e-4 {
        return vec![corner];
    }

    let tangent = radius / (theta / 2.0).tan();
    let t1 = corner + v1 * tangent;
    let t2 = corner + v2 * tangent;
    let center = corner + (v1 + v2).normalized() * (radius / (theta / 2.0).sin());

    let a1 = (t1 - center).angle();
    let a2 = (t2 - center).angle();
    let mut sweep = a2 - a1;
    while sweep > std::f32::consts::PI {
        sweep -= std::f32::consts::TAU;
    }
    while sweep < -std::f32::consts::PI {
        sweep += std::f32::consts::TAU;
    }

    let mut points = Vec::with_capacity(CURVE_SEGMENTS + 1);
    points.push(t1);
    for i in 1..=CURVE_SEGMENTS {
        let a = a1 + sweep * i as f32 / CURVE_SEGMENTS as f32;
        points.push(center + Vec2::angled(a) * radius);
    }
    points
}
