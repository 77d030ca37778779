//! Geometry: everything between the task list and the drawing surface.

pub mod engine;
pub mod instruction;
pub mod router;
pub mod text;
pub mod time_scale;
pub mod tree;
pub mod viewport;

pub use engine::{BarData, BarGeometry, LayoutEngine, RowData, RowGeometry};
pub use instruction::{hit_test, Geometry, Instruction, Point};
pub use router::{Boundary, LaneRegistry, RelationRouter, RoutedRelation};
pub use text::{fit_text, FixedAdvance, TextMeasure};
pub use time_scale::{position, DateHeader};
pub use tree::{Operation, OperationStore, Symbol, TaskTree, ROOT_KEY};
pub use viewport::{Region, RegionKind, Regions, Scroll, Size};
