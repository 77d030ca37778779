use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::layout::Size;

/// Handle of a scheduled repaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

/// Handle of a pending delayed callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Input streams the engine subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Listener {
    Wheel,
    PointerMove,
    Click,
}

impl Listener {
    pub const ALL: [Listener; 3] = [Listener::Wheel, Listener::PointerMove, Listener::Click];
}

/// Event loop services of the embedding window.
///
/// The host calls back into the engine: `frame()` when a requested frame is
/// due, `timer_fired()` when a timer elapses, and the input methods for every
/// subscribed listener.
pub trait Host {
    fn request_frame(&mut self) -> FrameId;
    fn cancel_frame(&mut self, id: FrameId);
    fn start_timer(&mut self, delay: Duration) -> TimerId;
    fn cancel_timer(&mut self, id: TimerId);
    fn listen(&mut self, listener: Listener);
    fn unlisten(&mut self, listener: Listener);
    /// Display size of the drawing surface.
    fn canvas_size(&self) -> Size;

    /// Device pixels per canvas pixel.
    fn pixel_ratio(&self) -> f32 {
        1.0
    }

    /// Anchor for charts without any scheduled duration.
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
