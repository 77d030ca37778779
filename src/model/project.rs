use serde::{Deserialize, Serialize};

use super::options::{parse_timezone, ChartZone, GanttOptions, RelationColors};
use super::task::{Header, Task};
use crate::error::GanttError;

/// Everything `render()` needs, in one serializable document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartDocument {
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub options: GanttOptions,
    #[serde(default)]
    pub relation_colors: RelationColors,
    /// `UTC`, a `±HH:MM` offset or an IANA zone name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl ChartDocument {
    pub fn new(headers: Vec<Header>, tasks: Vec<Task>) -> Self {
        Self {
            headers,
            tasks,
            ..Default::default()
        }
    }

    /// Resolve the configured timezone, if any.
    pub fn zone(&self) -> Result<Option<ChartZone>, GanttError> {
        self.timezone.as_deref().map(parse_timezone).transpose()
    }
}
