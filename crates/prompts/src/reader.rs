use bench_core::{BenchError, Result};
use std::path::Path;
use tokio::fs;

pub const LABEL_DELIMITER: char = ',';

pub struct LabelReader;

impl LabelReader {
    /// Read a comma-separated label file. Duplicates and empty entries are kept.
    pub async fn read_labels(path: &Path) -> Result<Vec<String>> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| BenchError::file_access(path, e))?;

        let labels = parse_labels(&content);
        tracing::debug!(path = %path.display(), count = labels.len(), "Loaded labels");
        Ok(labels)
    }
}

pub fn parse_labels(content: &str) -> Vec<String> {
    content
        .split(LABEL_DELIMITER)
        .map(|label| label.trim().to_string())
        .collect()
}
