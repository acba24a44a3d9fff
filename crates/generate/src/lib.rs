pub mod batch;
pub mod client;
pub mod device;
pub mod metrics;
pub mod record;

pub use batch::{BatchDriver, BatchOutput, BatchSink, RunSummary, plan_batches};
pub use client::{DiffusionClient, ImageGenerator, decode_image};
pub use device::{ComputeProbe, SystemProbe, select_device};
pub use metrics::{MetricsSnapshot, RunMetrics};
pub use record::ImageRecord;

use bench_core::{PipelineConfig, Result};

/// Generate one image for `prompt` and wrap it with a fresh identifier.
pub async fn generate_record<G: ImageGenerator>(prompt: &str, generator: &G) -> Result<ImageRecord> {
    let image = generator.generate(prompt).await?;
    Ok(ImageRecord::new(image, prompt.to_string()))
}

/// Generate one record per prompt, in order.
pub async fn generate_records<G: ImageGenerator>(
    prompts: &[String],
    generator: &G,
) -> Result<Vec<ImageRecord>> {
    let mut records = Vec::with_capacity(prompts.len());
    for prompt in prompts {
        records.push(generate_record(prompt, generator).await?);
    }
    Ok(records)
}

/// Build the pipeline handle once, on the best device the host offers.
pub fn set_up_pipeline(config: &PipelineConfig, probe: &impl ComputeProbe) -> DiffusionClient {
    let device = select_device(&config.device_preference, probe);
    tracing::info!(
        model = %config.model_id,
        precision = ?config.precision,
        device = %device,
        "Pipeline configured"
    );
    DiffusionClient::from_config(config, device)
}
