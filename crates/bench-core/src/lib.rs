pub mod config;
pub mod error;
pub mod types;

pub use config::{
    AnalysisConfig, BatchConfig, BenchConfig, DeviceKind, PipelineConfig, Precision,
    PromptConfig, PromptMode, PublishConfig,
};
pub use error::{BenchError, Result};
pub use types::{AnalysisRecord, Demographics, EncodedRecord, FaceRegion, NO_FACE_HUE, RepoId};

/// Environment variable holding the hub write token.
pub const TOKEN_ENV_VAR: &str = "HF_TOKEN";
