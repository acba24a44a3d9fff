pub mod download;
pub mod hub;
pub mod merge;
pub mod parquet_io;

pub use download::{ShardSet, download_dataset, load_shards, partition_shards};
pub use hub::{DatasetStore, HubCredentials, HubRepository};
pub use merge::{DatasetRow, analysis_columns, append_analysis_columns, dataset_rows};
pub use parquet_io::{
    encode_png, encode_records, image_schema, read_batches, read_image_records, read_schema,
    write_batches, write_image_records,
};

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use bench_core::{AnalysisRecord, BenchError, Result, TOKEN_ENV_VAR};
use generate::{BatchOutput, BatchSink, ImageRecord};
use std::path::PathBuf;
use tracing::info;

pub const ANALYSIS_COMMIT_MESSAGE: &str = "Update dataset with new columns";

pub fn generation_commit_message(file_name: &str) -> String {
    format!("Add {} through data generation", file_name)
}

/// Serializes records to Parquet and pushes the file to a dataset store.
pub struct Publisher<S> {
    store: S,
    output_dir: PathBuf,
    artifact_prefix: String,
}

impl<S: DatasetStore> Publisher<S> {
    pub fn new(store: S, output_dir: PathBuf, artifact_prefix: String) -> Self {
        Self {
            store,
            output_dir,
            artifact_prefix,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn batch_file_name(&self, batch_number: usize) -> String {
        format!("{}-batch-{}.parquet", self.artifact_prefix, batch_number)
    }

    fn require_credential(&self) -> Result<()> {
        match self.store.credential() {
            Some(_) => Ok(()),
            None => Err(BenchError::MissingCredential { var: TOKEN_ENV_VAR }),
        }
    }

    /// Encode, write and push one artifact. The credential is checked before
    /// any encoding or file I/O; the written file is kept if the push fails.
    pub async fn publish_records(&self, records: Vec<ImageRecord>, file_name: &str) -> Result<PathBuf> {
        self.require_credential()?;

        let encoded = encode_records(records)?;
        let path = self.prepare_path(file_name).await?;
        write_image_records(&encoded, &path)?;
        info!(rows = encoded.len(), path = %path.display(), "Wrote parquet artifact");

        let url = self
            .store
            .publish_file(&path, &generation_commit_message(file_name))
            .await?;
        info!("Parquet file {} successfully pushed to: {}", file_name, url);
        Ok(path)
    }

    /// Append analysis columns to a downloaded dataset and push it back.
    pub async fn publish_analysis(
        &self,
        schema: &Schema,
        batches: &[RecordBatch],
        analysis: &[AnalysisRecord],
        file_name: &str,
    ) -> Result<PathBuf> {
        self.require_credential()?;

        let (merged_schema, merged) = append_analysis_columns(schema, batches, analysis)?;
        let path = self.prepare_path(file_name).await?;
        write_batches(&path, merged_schema, &merged)?;

        self.store.publish_file(&path, ANALYSIS_COMMIT_MESSAGE).await?;
        Ok(path)
    }

    async fn prepare_path(&self, file_name: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| BenchError::file_access(&self.output_dir, e))?;
        Ok(self.output_dir.join(file_name))
    }
}

impl<S: DatasetStore> BatchSink for Publisher<S> {
    async fn accept(&mut self, batch: BatchOutput) -> Result<()> {
        let file_name = self.batch_file_name(batch.number);
        self.publish_records(batch.records, &file_name).await?;
        Ok(())
    }
}

