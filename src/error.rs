use std::path::PathBuf;

/// Errors surfaced by the engine and its loaders.
///
/// Malformed chart data (dangling relations, half-scheduled durations, inverted
/// bars) is repaired during layout and never reported here.
#[derive(Debug, thiserror::Error)]
pub enum GanttError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("CSV is missing required columns (found {found:?}); need an id or name column")]
    MissingColumns { found: Vec<String> },
    #[error("no valid tasks found in CSV ({skipped} rows skipped)")]
    EmptyImport { skipped: usize },
    #[error("unknown relation type '{0}', expected one of FS, SS, FF, SF")]
    UnknownRelationKind(String),
    #[error("unknown granularity '{0}', expected day, week, month, quarter or year")]
    UnknownGranularity(String),
    #[error("invalid timezone '{0}', expected UTC, a ±HH:MM offset or an IANA zone name")]
    InvalidTimezone(String),
    #[error("invalid date '{0}'")]
    InvalidDate(String),
    #[error("the chart has not been rendered yet; call render() first")]
    NotRendered,
}

pub type Result<T, E = GanttError> = std::result::Result<T, E>;
