use analysis::{DeepFaceClient, FaceAnalyzer};
use anyhow::{Context, Result, bail};
use bench_core::{BenchConfig, RepoId};
use curate::{CollageOptions, DEFAULT_EXCISED_WORDS, TrainingLayout};
use generate::{BatchDriver, SystemProbe, set_up_pipeline};
use publish::{HubCredentials, HubRepository, Publisher, ShardSet};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;
use tracing::{info, warn};

/// Credential is resolved before prompts are read or the pipeline is built.
pub async fn generate(config: &BenchConfig) -> Result<()> {
    let credentials = HubCredentials::from_env().context("cannot publish generated images")?;

    let prompts = prompts::load_prompts(&config.prompts)
        .await
        .context("failed to load prompts")?;
    if prompts.is_empty() {
        bail!("label file {} produced no prompts", config.prompts.label_file.display());
    }

    let pipeline = set_up_pipeline(&config.pipeline, &SystemProbe);
    let store = HubRepository::new(
        config.publish.dataset_repo.clone(),
        config.publish.repo_workdir.clone(),
        Some(credentials),
    );
    let mut publisher = Publisher::new(
        store,
        config.publish.output_dir.clone(),
        config.publish.artifact_prefix.clone(),
    );

    let driver = BatchDriver::new(&config.batching)?;
    let summary = driver.run(&prompts, &pipeline, &mut publisher).await?;

    let metrics = serde_json::to_string(&driver.metrics().snapshot())?;
    info!(
        batches = summary.batches,
        images = summary.images,
        %metrics,
        "Generation run complete"
    );
    Ok(())
}

pub async fn analyze(config: &BenchConfig) -> Result<()> {
    let credentials = HubCredentials::from_env().context("cannot republish analysed dataset")?;
    let source = &config.analysis.source_repo;

    let shards = download_shards(source, Some(&credentials)).await?;
    let (schema, batches) = publish::load_shards(&shards.source)
        .with_context(|| format!("{} has no unanalysed shards", source))?;
    let rows = publish::dataset_rows(&batches)?;
    info!(dataset = %source, rows = rows.len(), "Loaded dataset");

    let service = DeepFaceClient::new(
        config.analysis.face_service_url.clone(),
        config.analysis.detector_backend.clone(),
    );
    let analyzer = FaceAnalyzer::new(service.clone(), service);
    let records = analyzer
        .analyze_rows(rows.iter().map(|row| row.image.as_slice()))
        .await;

    let faces = records.iter().filter(|r| r.has_face()).count();
    info!(rows = records.len(), faces, "Analysis complete");

    let store = HubRepository::new(
        source.clone(),
        config.publish.repo_workdir.clone(),
        Some(credentials),
    );
    let publisher = Publisher::new(
        store,
        config.publish.output_dir.clone(),
        config.publish.artifact_prefix.clone(),
    );
    let file_name = format!("{}-analysis.parquet", source.name());
    let path = publisher
        .publish_analysis(&schema, &batches, &records, &file_name)
        .await?;

    info!(path = %path.display(), "Dataset successfully updated in the repository: {}", source);
    Ok(())
}

pub fn unpack(source: &Path, target: &Path) -> Result<()> {
    let layout = TrainingLayout::new(target);
    let rows = curate::unpack_for_training(source, &layout)?;
    if rows == 0 {
        warn!(source = %source.display(), "No parquet rows found");
    }
    info!(rows, images = %layout.image_dir().display(), "Unpacked training data");
    Ok(())
}

pub fn excise(dir: &Path) -> Result<()> {
    curate::excise_captions(dir, DEFAULT_EXCISED_WORDS)?;
    Ok(())
}

pub async fn collage(config: &BenchConfig, options: &CollageOptions, seed: Option<u64>) -> Result<()> {
    let source = &config.analysis.source_repo;
    let shards = download_shards(source, HubCredentials::from_env().ok().as_ref()).await?;
    let (_, batches) = publish::load_shards(&shards.source)?;
    let rows = publish::dataset_rows(&batches)?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let saved = curate::save_prompt_collages(&rows, options, &mut rng)?;

    info!(collages = saved.len(), dir = %options.output_dir.display(), "Saved collages");
    Ok(())
}

pub async fn report(config: &BenchConfig, output: &Path) -> Result<()> {
    let source = &config.analysis.source_repo;
    let shards = download_shards(source, HubCredentials::from_env().ok().as_ref()).await?;
    let (_, batches) = publish::load_shards(&shards.analysed)
        .with_context(|| format!("{} has not been analysed yet", source))?;
    let records = publish::analysis_columns(&batches)?;

    let report = curate::hue_report(&records);
    curate::save_report(&report, &output.join("hue_report.json"))?;
    if report.by_race.is_empty() {
        warn!("No faces found, skipping plot");
    } else {
        curate::plot_hue_by_race(&report, &output.join("hue_by_race.png"))?;
    }

    info!(
        rows = report.total_rows,
        faceless = report.faceless_rows,
        races = report.by_race.len(),
        dir = %output.display(),
        "Saved hue report"
    );
    Ok(())
}

/// Public datasets are readable without a token, so callers that only read
/// pass whatever credential is available.
async fn download_shards(repo: &RepoId, credentials: Option<&HubCredentials>) -> Result<ShardSet> {
    let paths = publish::download_dataset(repo, credentials).await?;
    Ok(publish::partition_shards(paths)?)
}
