use anyhow::{Context, Result};
use image::{RgbImage, imageops};
use publish::DatasetRow;
use rand::Rng;
use rand::seq::index::sample;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const PROMPT_PREFIXES: &[&str] = &["An individual ", "Generate an image of a singular "];

#[derive(Debug, Clone)]
pub struct CollageOptions {
    pub images_per_prompt: usize,
    pub max_columns: u32,
    pub output_dir: PathBuf,
}

impl Default for CollageOptions {
    fn default() -> Self {
        Self {
            images_per_prompt: 25,
            max_columns: 5,
            output_dir: PathBuf::from("collages"),
        }
    }
}

/// Tile images left to right, top to bottom. Every cell is sized to the
/// largest image and the canvas is always `max_columns` cells wide.
pub fn create_collage(images: &[RgbImage], max_columns: u32) -> Option<RgbImage> {
    if images.is_empty() || max_columns == 0 {
        return None;
    }

    let cell_width = images.iter().map(|i| i.width()).max()?;
    let cell_height = images.iter().map(|i| i.height()).max()?;
    let rows = (images.len() as u32).div_ceil(max_columns);

    let mut collage = RgbImage::new(max_columns * cell_width, rows * cell_height);
    for (idx, img) in images.iter().enumerate() {
        let idx = idx as u32;
        let x = (idx % max_columns) * cell_width;
        let y = (idx / max_columns) * cell_height;
        imageops::replace(&mut collage, img, x as i64, y as i64);
    }

    Some(collage)
}

/// Directory name for a prompt: the designation with the template wording removed.
pub fn designation_slug(prompt: &str) -> String {
    let mut rest = prompt;
    for prefix in PROMPT_PREFIXES {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped;
            break;
        }
    }
    if let Some(end) = rest.find("generated") {
        rest = &rest[..end];
    }

    let slug = rest
        .trim()
        .trim_end_matches(['.', ','])
        .replace(['/', '\\'], "-");

    if slug.is_empty() {
        "unlabelled".to_string()
    } else {
        slug
    }
}

/// First `collage_{NNN}.png` in `dir` that does not exist yet.
pub fn next_collage_path(dir: &Path) -> PathBuf {
    (0u32..)
        .map(|n| dir.join(format!("collage_{:03}.png", n)))
        .find(|path| !path.exists())
        .unwrap_or_else(|| dir.join("collage.png"))
}

/// One collage per unique prompt, built from a random sample of that
/// prompt's images. Returns the paths written.
pub fn save_prompt_collages<R: Rng + ?Sized>(
    rows: &[DatasetRow],
    options: &CollageOptions,
    rng: &mut R,
) -> Result<Vec<PathBuf>> {
    let mut by_prompt: BTreeMap<&str, Vec<&DatasetRow>> = BTreeMap::new();
    for row in rows {
        by_prompt.entry(row.prompt.as_str()).or_default().push(row);
    }

    let mut saved = Vec::new();

    for (prompt, prompt_rows) in by_prompt {
        let amount = options.images_per_prompt.min(prompt_rows.len());
        let images: Vec<RgbImage> = sample(rng, prompt_rows.len(), amount)
            .iter()
            .filter_map(|idx| match image::load_from_memory(&prompt_rows[idx].image) {
                Ok(img) => Some(img.to_rgb8()),
                Err(e) => {
                    warn!(prompt, error = %e, "Skipping undecodable image");
                    None
                }
            })
            .collect();

        let Some(collage) = create_collage(&images, options.max_columns) else {
            continue;
        };

        let dir = options.output_dir.join(designation_slug(prompt));
        fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

        let path = next_collage_path(&dir);
        collage
            .save(&path)
            .with_context(|| format!("failed to save {}", path.display()))?;

        info!(prompt, images = images.len(), path = %path.display(), "Saved collage");
        saved.push(path);
    }

    Ok(saved)
}
