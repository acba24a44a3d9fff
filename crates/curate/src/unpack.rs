use anyhow::{Context, Result};
use publish::{dataset_rows, read_batches};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// Directory layout a LoRA trainer reads from: images with sibling captions
/// under `img/1_unbias`, plus empty `log` and `model` directories.
#[derive(Debug, Clone)]
pub struct TrainingLayout {
    root: PathBuf,
}

impl TrainingLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn image_dir(&self) -> PathBuf {
        self.root.join("img").join("1_unbias")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join("log")
    }

    pub fn model_dir(&self) -> PathBuf {
        self.root.join("model")
    }

    pub fn create(&self) -> Result<()> {
        for dir in [self.log_dir(), self.model_dir(), self.image_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}

/// `.parquet` files directly inside `dir`, sorted by file name.
pub fn parquet_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
        let is_parquet = entry.path().extension().is_some_and(|ext| ext == "parquet");
        if entry.file_type().is_file() && is_parquet {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Write every row of every shard in `parquet_dir` as `{n}.png` + `{n}.txt`,
/// numbered from 1 across shards. Returns the number of rows written.
pub fn unpack_for_training(parquet_dir: &Path, layout: &TrainingLayout) -> Result<usize> {
    layout.create()?;
    let target = layout.image_dir();
    let mut written = 0;

    for path in parquet_files(parquet_dir)? {
        let (_, batches) =
            read_batches(&path).with_context(|| format!("failed to read {}", path.display()))?;

        for row in dataset_rows(&batches)? {
            written += 1;
            let image_path = target.join(format!("{}.png", written));
            let caption_path = target.join(format!("{}.txt", written));
            fs::write(&image_path, &row.image)
                .with_context(|| format!("failed to write {}", image_path.display()))?;
            fs::write(&caption_path, row.prompt.as_bytes())
                .with_context(|| format!("failed to write {}", caption_path.display()))?;
        }

        info!(shard = %path.display(), rows = written, "Unpacked shard");
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_core::EncodedRecord;
    use publish::write_image_records;

    fn record(prompt: &str, byte: u8) -> EncodedRecord {
        EncodedRecord {
            image: vec![byte; 4],
            prompt: prompt.to_string(),
            uuid: format!("uuid-{}", byte),
        }
    }

    #[test]
    fn test_layout_paths() {
        let layout = TrainingLayout::new("/data/set");
        assert_eq!(layout.image_dir(), PathBuf::from("/data/set/img/1_unbias"));
        assert_eq!(layout.log_dir(), PathBuf::from("/data/set/log"));
        assert_eq!(layout.model_dir(), PathBuf::from("/data/set/model"));
    }

    #[test]
    fn test_unpack_numbers_rows_across_sorted_shards() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();

        write_image_records(&[record("third", 3)], &source.path().join("b.parquet")).unwrap();
        write_image_records(
            &[record("first", 1), record("second", 2)],
            &source.path().join("a.parquet"),
        )
        .unwrap();
        fs::write(source.path().join("notes.txt"), "ignored").unwrap();

        let layout = TrainingLayout::new(target.path());
        let count = unpack_for_training(source.path(), &layout).unwrap();
        assert_eq!(count, 3);

        let images = layout.image_dir();
        assert_eq!(fs::read_to_string(images.join("1.txt")).unwrap(), "first");
        assert_eq!(fs::read_to_string(images.join("3.txt")).unwrap(), "third");
        assert_eq!(fs::read(images.join("2.png")).unwrap(), vec![2; 4]);
        assert!(!images.join("4.png").exists());
        assert!(layout.log_dir().is_dir());
        assert!(layout.model_dir().is_dir());
    }

    #[test]
    fn test_empty_directory_still_creates_layout() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        let layout = TrainingLayout::new(target.path().join("out"));

        assert_eq!(unpack_for_training(source.path(), &layout).unwrap(), 0);
        assert!(layout.image_dir().is_dir());
    }
}
