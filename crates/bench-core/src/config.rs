use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{BenchError, Result};
use crate::types::RepoId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    pub prompts: PromptConfig,
    pub pipeline: PipelineConfig,
    pub batching: BatchConfig,
    pub publish: PublishConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PromptMode {
    Designation,     // One prompt per designation
    RaceDesignation, // Race x designation
    Demographic,     // Race x designation x sex
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    #[default]
    Float16,
    Float32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Cuda,
    Mps,
    Cpu,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceKind::Cuda => "cuda",
            DeviceKind::Mps => "mps",
            DeviceKind::Cpu => "cpu",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    pub label_file: PathBuf,
    pub mode: PromptMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub model_id: String,
    pub precision: Precision,
    pub device_preference: Vec<DeviceKind>,
    pub server_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub batch_size: usize,
    pub iteration_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    pub dataset_repo: RepoId,
    pub artifact_prefix: String,
    pub output_dir: PathBuf,
    pub repo_workdir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub source_repo: RepoId,
    pub face_service_url: String,
    pub detector_backend: String,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self::benchmark()
    }
}

impl BenchConfig {
    /// Benchmark images: one prompt per designation, many samples per prompt.
    pub fn benchmark() -> Self {
        Self {
            prompts: PromptConfig {
                label_file: PathBuf::from("labels.txt"),
                mode: PromptMode::Designation,
            },
            pipeline: PipelineConfig {
                model_id: "SG161222/RealVisXL_V4.0".to_string(),
                precision: Precision::Float16,
                device_preference: vec![DeviceKind::Cuda, DeviceKind::Mps, DeviceKind::Cpu],
                server_url: "http://localhost:7860".to_string(),
            },
            batching: BatchConfig {
                batch_size: 1,
                iteration_count: 1000,
            },
            publish: PublishConfig {
                dataset_repo: RepoId::from_parts(
                    "ririye",
                    "Generated-LoRA-Input-Images-for-Mitigating-Bias",
                ),
                artifact_prefix: "lora-input-data".to_string(),
                output_dir: PathBuf::from("."),
                repo_workdir: PathBuf::from("hub"),
            },
            analysis: AnalysisConfig {
                source_repo: RepoId::from_parts(
                    "ririye",
                    "Benchmark-Images-for-Stable-Diffusion-Bias",
                ),
                face_service_url: "http://localhost:5005".to_string(),
                detector_backend: "opencv".to_string(),
            },
        }
    }

    /// Fine-tuning inputs: every designation crossed with every race, one sample each.
    pub fn finetune() -> Self {
        let mut config = Self::benchmark();
        config.prompts = PromptConfig {
            label_file: PathBuf::from("gpt4_labels.txt"),
            mode: PromptMode::RaceDesignation,
        };
        config.pipeline.model_id = "runwayml/stable-diffusion-v1-5".to_string();
        config.batching = BatchConfig {
            batch_size: 100,
            iteration_count: 1,
        };
        config
    }

    /// Load a JSON config file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| BenchError::file_access(path, e))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| BenchError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batching.batch_size == 0 {
            return Err(BenchError::InvalidConfig("batch_size must be positive".into()));
        }
        if self.batching.iteration_count == 0 {
            return Err(BenchError::InvalidConfig(
                "iteration_count must be positive".into(),
            ));
        }
        if self.pipeline.device_preference.is_empty() {
            return Err(BenchError::InvalidConfig(
                "device_preference must name at least one device".into(),
            ));
        }
        if self.pipeline.model_id.trim().is_empty() {
            return Err(BenchError::InvalidConfig("model_id is empty".into()));
        }
        Ok(())
    }
}
