use bench_core::{BatchConfig, BenchError, Result};
use tracing::info;

use crate::client::ImageGenerator;
use crate::metrics::{RunMetrics, TimedOperation};
use crate::record::ImageRecord;

/// Everything generated for one batch of prompts.
#[derive(Debug)]
pub struct BatchOutput {
    pub number: usize, // 1-based
    pub total: usize,
    pub records: Vec<ImageRecord>,
}

/// Receives each finished batch. Ownership of the records moves to the sink.
#[allow(async_fn_in_trait)]
pub trait BatchSink {
    async fn accept(&mut self, batch: BatchOutput) -> Result<()>;
}

/// Split prompts into contiguous batches of `batch_size`; the last may be shorter.
pub fn plan_batches(prompts: &[String], batch_size: usize) -> Result<Vec<&[String]>> {
    if batch_size == 0 {
        return Err(BenchError::InvalidConfig("batch_size must be positive".into()));
    }
    Ok(prompts.chunks(batch_size).collect())
}

pub struct BatchDriver {
    batch_size: usize,
    iteration_count: usize,
    metrics: RunMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: usize,
    pub images: usize,
}

impl BatchDriver {
    pub fn new(config: &BatchConfig) -> Result<Self> {
        if config.batch_size == 0 || config.iteration_count == 0 {
            return Err(BenchError::InvalidConfig(
                "batch_size and iteration_count must be positive".into(),
            ));
        }
        Ok(Self {
            batch_size: config.batch_size,
            iteration_count: config.iteration_count,
            metrics: RunMetrics::new(),
        })
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Generate every batch in order and hand each one to `sink`.
    /// The first generation or sink error aborts the run.
    pub async fn run<G, S>(&self, prompts: &[String], generator: &G, sink: &mut S) -> Result<RunSummary>
    where
        G: ImageGenerator,
        S: BatchSink,
    {
        let batches = plan_batches(prompts, self.batch_size)?;
        let total = batches.len();
        let mut images = 0;

        info!(
            prompts = prompts.len(),
            batch_size = self.batch_size,
            batches = total,
            iterations = self.iteration_count,
            "Starting generation run"
        );

        for (idx, batch_prompts) in batches.into_iter().enumerate() {
            let number = idx + 1;
            let mut records = Vec::with_capacity(batch_prompts.len() * self.iteration_count);

            for iteration in 1..=self.iteration_count {
                info!(
                    "Generating batch {}/{} with prompt iteration {}/{}...",
                    number, total, iteration, self.iteration_count
                );
                for prompt in batch_prompts {
                    let timer = TimedOperation::start();
                    let record = crate::generate_record(prompt, generator).await?;
                    self.metrics.record_image(timer.elapsed());
                    records.push(record);
                }
            }

            images += records.len();
            let timer = TimedOperation::start();
            sink.accept(BatchOutput {
                number,
                total,
                records,
            })
            .await?;
            self.metrics.record_batch(timer.elapsed());
            info!(batch = number, total, "Batch handed off");
        }

        Ok(RunSummary {
            batches: total,
            images,
        })
    }
}
