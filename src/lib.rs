//! Gantt chart layout, dependency routing and canvas rendering.
//!
//! Tasks go into a [`render::GanttEngine`], which lays them out once per
//! [`model::Granularity`], routes their relations, and replays the resulting
//! [`layout::Instruction`] lists onto any [`render::Surface`].

pub mod error;
pub mod io;
pub mod layout;
pub mod model;
pub mod render;

pub use error::{GanttError, Result};
