use std::path::Path;

use tracing::info;

use crate::error::{GanttError, Result};
use crate::model::ChartDocument;

/// Save a chart document as pretty-printed JSON.
pub fn save_document(document: &ChartDocument, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(document)?;
    std::fs::write(path, json).map_err(|source| GanttError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), tasks = document.tasks.len(), "saved chart");
    Ok(())
}

/// Load a chart document from a JSON file.
pub fn load_document(path: &Path) -> Result<ChartDocument> {
    let json = std::fs::read_to_string(path).map_err(|source| GanttError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document: ChartDocument = serde_json::from_str(&json)?;
    // Reject a bad timezone at load time rather than on first render.
    document.zone()?;
    info!(path = %path.display(), tasks = document.tasks.len(), "loaded chart");
    Ok(document)
}
