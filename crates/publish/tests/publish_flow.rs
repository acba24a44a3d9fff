use bench_core::{AnalysisRecord, BenchError, FaceRegion, RepoId, Result};
use generate::{BatchOutput, BatchSink, ImageRecord};
use image::{DynamicImage, Rgb, RgbImage};
use publish::{
    DatasetStore, HubCredentials, HubRepository, Publisher, dataset_rows, load_shards,
    read_image_records,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

struct FakeStore {
    credentials: Option<HubCredentials>,
    fail: bool,
    pushed: Mutex<Vec<(PathBuf, String)>>,
}

impl FakeStore {
    fn with_token() -> Self {
        Self {
            credentials: Some(HubCredentials::from_lookup(|_| Some("hf_test".into())).unwrap()),
            fail: false,
            pushed: Mutex::new(Vec::new()),
        }
    }

    fn without_token() -> Self {
        Self {
            credentials: None,
            ..Self::with_token()
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_token()
        }
    }
}

impl DatasetStore for FakeStore {
    fn credential(&self) -> Option<&HubCredentials> {
        self.credentials.as_ref()
    }

    async fn publish_file(&self, local_path: &Path, commit_message: &str) -> Result<String> {
        if self.fail {
            return Err(BenchError::Publish("connection reset".into()));
        }
        self.pushed
            .lock()
            .unwrap()
            .push((local_path.to_path_buf(), commit_message.to_string()));
        Ok("https://example.invalid/datasets/owner/name".into())
    }
}

fn records(prompts: &[&str]) -> Vec<ImageRecord> {
    prompts
        .iter()
        .map(|p| {
            let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([9, 99, 199])));
            ImageRecord::new(image, p.to_string())
        })
        .collect()
}

#[tokio::test]
async fn missing_token_fails_before_any_file_io() {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("out");
    let publisher = Publisher::new(FakeStore::without_token(), output_dir.clone(), "data".into());

    let err = publisher
        .publish_records(records(&["a"]), "data-batch-1.parquet")
        .await
        .unwrap_err();

    assert!(err.is_configuration());
    assert!(!output_dir.exists());
}

#[tokio::test]
async fn unset_token_env_stops_hub_batch_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("out");
    let credentials = HubCredentials::from_lookup(|_| None).ok();
    let store = HubRepository::new(
        RepoId::parse("owner/name").unwrap(),
        dir.path().join("hub"),
        credentials,
    );
    let mut publisher = Publisher::new(store, output_dir.clone(), "lora-input-data".into());

    let err = publisher
        .accept(BatchOutput {
            number: 1,
            total: 1,
            records: records(&["a", "b"]),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, BenchError::MissingCredential { var: "HF_TOKEN" }));
    assert!(!output_dir.exists());
    assert!(!dir.path().join("hub").exists());
}

#[tokio::test]
async fn published_file_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let publisher = Publisher::new(FakeStore::with_token(), dir.path().to_path_buf(), "data".into());

    let input = records(&["An individual nurse.", "An individual teacher."]);
    let expected: Vec<(String, String)> = input
        .iter()
        .map(|r| (r.prompt.clone(), r.uuid.to_string()))
        .collect();

    let path = publisher
        .publish_records(input, "data-batch-1.parquet")
        .await
        .unwrap();

    let rows = read_image_records(&path).unwrap();
    let got: Vec<(String, String)> = rows.iter().map(|r| (r.prompt.clone(), r.uuid.clone())).collect();
    assert_eq!(got, expected);
    assert!(rows.iter().all(|r| image::load_from_memory(&r.image).is_ok()));

    let pushed = publisher.store().pushed.lock().unwrap();
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0].1, "Add data-batch-1.parquet through data generation");
}

#[tokio::test]
async fn push_failure_keeps_local_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let publisher = Publisher::new(FakeStore::failing(), dir.path().to_path_buf(), "data".into());

    let err = publisher
        .publish_records(records(&["a", "b"]), "data-batch-3.parquet")
        .await
        .unwrap_err();

    assert!(matches!(err, BenchError::Publish(_)));
    let local = dir.path().join("data-batch-3.parquet");
    assert_eq!(read_image_records(&local).unwrap().len(), 2);
}

#[tokio::test]
async fn batch_sink_names_files_by_batch_number() {
    let dir = tempfile::tempdir().unwrap();
    let mut publisher =
        Publisher::new(FakeStore::with_token(), dir.path().to_path_buf(), "lora-input-data".into());

    publisher
        .accept(BatchOutput {
            number: 2,
            total: 5,
            records: records(&["x"]),
        })
        .await
        .unwrap();

    assert!(dir.path().join("lora-input-data-batch-2.parquet").exists());
}

#[tokio::test]
async fn analysis_columns_republished() {
    let dir = tempfile::tempdir().unwrap();
    let publisher = Publisher::new(FakeStore::with_token(), dir.path().to_path_buf(), "data".into());
    let source = publisher
        .publish_records(records(&["p1", "p2"]), "source.parquet")
        .await
        .unwrap();

    let (schema, batches) = load_shards(&[source]).unwrap();
    assert_eq!(dataset_rows(&batches).unwrap().len(), 2);

    let analysis = vec![
        AnalysisRecord {
            hue: 24.5,
            face: Some(FaceRegion { x: 0, y: 0, w: 2, h: 2 }),
            race: "white".into(),
            gender: "Man".into(),
        },
        AnalysisRecord::empty(),
    ];
    let path = publisher
        .publish_analysis(&schema, &batches, &analysis, "analyzed.parquet")
        .await
        .unwrap();

    let (merged_schema, merged) = load_shards(&[path]).unwrap();
    let names: Vec<&str> = merged_schema.fields().iter().map(|f| f.name().as_str()).collect();
    assert_eq!(
        names,
        vec!["image", "prompt", "uuid", "hue", "race_prediction", "sex_prediction"]
    );
    assert_eq!(merged.iter().map(|b| b.num_rows()).sum::<usize>(), 2);

    let pushed = publisher.store().pushed.lock().unwrap();
    assert_eq!(pushed.last().unwrap().1, "Update dataset with new columns");
}
