use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use gantt_canvas::layout::Size;
use gantt_canvas::render::{FrameId, Host, Listener, TimerId};

/// Engine host backed by the egui event loop.
///
/// Frames map onto `request_repaint`; the chart widget asks
/// [`EguiHost::take_frame`] each pass whether the engine wants to paint.
pub struct EguiHost {
    ctx: egui::Context,
    size: Size,
    next_id: u64,
    frame: Option<FrameId>,
    timers: HashMap<TimerId, Instant>,
    listeners: HashSet<Listener>,
}

impl EguiHost {
    pub fn new(ctx: egui::Context) -> Self {
        Self {
            ctx,
            size: Size::new(0.0, 0.0),
            next_id: 0,
            frame: None,
            timers: HashMap::new(),
            listeners: HashSet::new(),
        }
    }

    /// Returns `true` when the size actually changed.
    pub fn set_canvas_size(&mut self, size: Size) -> bool {
        let changed = self.size != size;
        self.size = size;
        changed
    }

    pub fn take_frame(&mut self) -> Option<FrameId> {
        self.frame.take()
    }

    pub fn is_listening(&self, listener: Listener) -> bool {
        self.listeners.contains(&listener)
    }

    /// Remove and return every timer whose deadline has passed.
    pub fn due_timers(&mut self) -> Vec<TimerId> {
        let now = Instant::now();
        let due: Vec<TimerId> = self
            .timers
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, _)| *id)
            .collect();
        for id in &due {
            self.timers.remove(id);
        }
        due
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl Host for EguiHost {
    fn pixel_ratio(&self) -> f32 {
        self.ctx.pixels_per_point()
    }

    fn request_frame(&mut self) -> FrameId {
        let id = FrameId(self.next());
        self.frame = Some(id);
        self.ctx.request_repaint();
        id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        if self.frame == Some(id) {
            self.frame = None;
        }
    }

    fn start_timer(&mut self, delay: Duration) -> TimerId {
        let id = TimerId(self.next());
        self.timers.insert(id, Instant::now() + delay);
        self.ctx.request_repaint_after(delay);
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
}
