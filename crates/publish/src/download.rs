use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use bench_core::{BenchError, RepoId, Result};
use hf_hub::api::tokio::ApiBuilder;
use hf_hub::{Repo, RepoType};
use std::path::PathBuf;
use tracing::info;

use crate::hub::HubCredentials;
use crate::merge::HUE_COLUMN;
use crate::parquet_io::{read_batches, read_schema};

/// Fetch every Parquet shard of a dataset repository into the local hub cache.
/// Paths come back sorted by their name in the repository.
pub async fn download_dataset(
    repo: &RepoId,
    credentials: Option<&HubCredentials>,
) -> Result<Vec<PathBuf>> {
    let api = ApiBuilder::new()
        .with_progress(false)
        .with_token(credentials.map(|c| c.token().to_string()))
        .build()
        .map_err(|e| BenchError::Publish(format!("failed building hf-hub client: {}", e)))?;

    let repo_api = api.repo(Repo::new(repo.to_string(), RepoType::Dataset));
    let info = repo_api
        .info()
        .await
        .map_err(|e| BenchError::Publish(format!("failed reading {} info: {}", repo, e)))?;

    let mut shards: Vec<String> = info
        .siblings
        .into_iter()
        .map(|entry| entry.rfilename)
        .filter(|name| name.ends_with(".parquet"))
        .collect();
    shards.sort();

    if shards.is_empty() {
        return Err(BenchError::Publish(format!(
            "dataset {} has no parquet files",
            repo
        )));
    }

    let mut paths = Vec::with_capacity(shards.len());
    for shard in &shards {
        info!(dataset = %repo, shard = %shard, "Downloading shard");
        let path = repo_api
            .get(shard)
            .await
            .map_err(|e| BenchError::Publish(format!("failed downloading {}: {}", shard, e)))?;
        paths.push(path);
    }
    Ok(paths)
}

/// Downloaded shards, split by whether an analysis pass already appended
/// its columns. Both lists keep the input order.
#[derive(Debug, Default)]
pub struct ShardSet {
    pub source: Vec<PathBuf>,
    pub analysed: Vec<PathBuf>,
}

pub fn partition_shards(paths: Vec<PathBuf>) -> Result<ShardSet> {
    let mut shards = ShardSet::default();
    for path in paths {
        if read_schema(&path)?.column_with_name(HUE_COLUMN).is_some() {
            shards.analysed.push(path);
        } else {
            shards.source.push(path);
        }
    }
    Ok(shards)
}

/// Load shards in order as one logical table.
pub fn load_shards(paths: &[PathBuf]) -> Result<(SchemaRef, Vec<RecordBatch>)> {
    let mut schema: Option<SchemaRef> = None;
    let mut batches = Vec::new();

    for path in paths {
        let (shard_schema, shard_batches) = read_batches(path)?;
        match &schema {
            None => schema = Some(shard_schema),
            Some(first) if first.fields() != shard_schema.fields() => {
                return Err(BenchError::Serialization(format!(
                    "{} has a different schema than the first shard",
                    path.display()
                )));
            }
            Some(_) => {}
        }
        batches.extend(shard_batches);
    }

    let schema = schema.ok_or_else(|| BenchError::Serialization("no shards to load".into()))?;
    Ok((schema, batches))
}
