//! Painting laid-out charts and driving them from a host event loop.

pub mod gantt;
pub mod headless;
pub mod host;
pub mod painter;
pub mod surface;

pub use gantt::{BarClick, GanttEngine, TOOLTIP_HIDE_DELAY};
pub use headless::{Call, HeadlessHost, RecordingSurface};
pub use host::{FrameId, Host, Listener, TimerId};
pub use painter::{FrameState, Painter};
pub use surface::{interpret, Surface, TextAlign};
