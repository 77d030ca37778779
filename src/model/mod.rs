pub mod options;
pub mod project;
pub mod task;
pub mod timeline;

pub use options::{parse_timezone, ChartZone, GanttOptions, RelationColors};
pub use project::ChartDocument;
pub use task::{Anchor, Duration, Header, Relation, RelationKind, Task, MAIN_DURATION_ID};
pub use timeline::Granularity;
