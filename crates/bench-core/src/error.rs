use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, BenchError>;

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("Credential not found: environment variable {var} is not set")]
    MissingCredential { var: &'static str },

    #[error("Failed to access file {path:?}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Image generation failed: {0}")]
    Generation(String),

    #[error("Model inference failed: {0}")]
    Inference(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Column length mismatch: dataset has {rows} rows but {values} analysis values")]
    Alignment { rows: usize, values: usize },
}

impl BenchError {
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileAccess {
            path: path.into(),
            source,
        }
    }

    /// Errors that must abort a run before any generation or upload work starts.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential { .. } | Self::FileAccess { .. } | Self::InvalidConfig(_)
        )
    }
}
