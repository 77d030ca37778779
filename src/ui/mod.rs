pub mod gantt_chart;
pub mod host;
pub mod surface;
pub mod theme;
pub mod toolbar;
