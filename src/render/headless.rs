//! In-memory [`Host`] and [`Surface`] for driving the engine without a window.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::host::{FrameId, Host, Listener, TimerId};
use super::surface::{Surface, TextAlign};
use crate::layout::{Region, Size};

/// Host whose frames and timers only fire when the caller says so.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    size: Size,
    pixel_ratio: f32,
    today: DateTime<Utc>,
    next_id: u64,
    frames: BTreeSet<FrameId>,
    timers: BTreeMap<TimerId, Duration>,
    listeners: BTreeSet<Listener>,
}

impl HeadlessHost {
    pub fn new(size: Size, today: DateTime<Utc>) -> Self {
        Self {
            size,
            pixel_ratio: 1.0,
            today,
            next_id: 0,
            frames: BTreeSet::new(),
            timers: BTreeMap::new(),
            listeners: BTreeSet::new(),
        }
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }

    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn pending_timers(&self) -> Vec<(TimerId, Duration)> {
        self.timers.iter().map(|(id, d)| (*id, *d)).collect()
    }

    /// Remove and return the oldest pending timer.
    pub fn take_timer(&mut self) -> Option<TimerId> {
        let id = *self.timers.keys().next()?;
        self.timers.remove(&id);
        Some(id)
    }

    /// Mark the oldest pending frame as delivered.
    pub fn take_frame(&mut self) -> Option<FrameId> {
        self.frames.pop_first()
    }

    pub fn is_listening(&self, listener: Listener) -> bool {
        self.listeners.contains(&listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl Host for HeadlessHost {
    fn request_frame(&mut self) -> FrameId {
        let id = FrameId(self.next());
        self.frames.insert(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        self.frames.remove(&id);
    }

    fn start_timer(&mut self, delay: Duration) -> TimerId {
        let id = TimerId(self.next());
        self.timers.insert(id, delay);
        id
    }

    fn cancel_timer(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }

    fn listen(&mut self, listener: Listener) {
        self.listeners.insert(listener);
    }

    fn unlisten(&mut self, listener: Listener) {
        self.listeners.remove(&listener);
    }

    fn canvas_size(&self) -> Size {
        self.size
    }

    fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    fn now(&self) -> DateTime<Utc> {
        self.today
    }
}

/// One recorded [`Surface`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Save,
    Restore,
    Clip(Region),
    Translate(f32, f32),
    Clear(Region),
    FillStyle(String),
    StrokeStyle(String),
    TextColor(String),
    LineWidth(f32),
    Font(String),
    TextAlign(TextAlign),
    BeginPath,
    ClosePath,
    MoveTo(f32, f32),
    LineTo(f32, f32),
    ArcTo(f32, f32, f32, f32, f32),
    QuadraticCurveTo(f32, f32, f32, f32),
    Fill,
    Stroke,
    FillRect(f32, f32, f32, f32),
    StrokeRect(f32, f32, f32, f32),
    FillText(String, f32, f32),
}

/// Surface that only records what was drawn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingSurface {
    pub calls: Vec<Call>,
    /// Display size and pixel ratio of the last frame.
    pub backing: Option<(Size, f32)>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every string passed to `fill_text`, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::FillText(text, _, _) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl Surface for RecordingSurface {
    fn set_backing_size(&mut self, size: Size, pixel_ratio: f32) {
        self.backing = Some((size, pixel_ratio));
    }
    fn save(&mut self) {
        self.calls.push(Call::Save);
    }
    fn restore(&mut self) {
        self.calls.push(Call::Restore);
    }
    fn clip(&mut self, region: Region) {
        self.calls.push(Call::Clip(region));
    }
    fn translate(&mut self, dx: f32, dy: f32) {
        self.calls.push(Call::Translate(dx, dy));
    }
    fn clear(&mut self, region: Region) {
        self.calls.push(Call::Clear(region));
    }
    fn set_fill_style(&mut self, color: &str) {
        self.calls.push(Call::FillStyle(color.to_string()));
    }
    fn set_stroke_style(&mut self, color: &str) {
        self.calls.push(Call::StrokeStyle(color.to_string()));
    }
    fn set_text_color(&mut self, color: &str) {
        self.calls.push(Call::TextColor(color.to_string()));
    }
    fn set_line_width(&mut self, width: f32) {
        self.calls.push(Call::LineWidth(width));
    }
    fn set_font(&mut self, font: &str) {
        self.calls.push(Call::Font(font.to_string()));
    }
    fn set_text_align(&mut self, align: TextAlign) {
        self.calls.push(Call::TextAlign(align));
    }
    fn begin_path(&mut self) {
        self.calls.push(Call::BeginPath);
    }
    fn close_path(&mut self) {
        self.calls.push(Call::ClosePath);
    }
    fn move_to(&mut self, x: f32, y: f32) {
        self.calls.push(Call::MoveTo(x, y));
    }
    fn line_to(&mut self, x: f32, y: f32) {
        self.calls.push(Call::LineTo(x, y));
    }
    fn arc_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) {
        self.calls.push(Call::ArcTo(x1, y1, x2, y2, radius));
    }
    fn quadratic_curve_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        self.calls.push(Call::QuadraticCurveTo(cx, cy, x, y));
    }
    fn fill(&mut self) {
        self.calls.push(Call::Fill);
    }
    fn stroke(&mut self) {
        self.calls.push(Call::Stroke);
    }
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.calls.push(Call::FillRect(x, y, width, height));
    }
    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.calls.push(Call::StrokeRect(x, y, width, height));
    }
    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        self.calls.push(Call::FillText(text.to_string(), x, y));
    }
}
