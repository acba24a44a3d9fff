use bench_core::{Demographics, FaceRegion, Result};
use image::RgbImage;

/// Locates faces. Order of the returned regions is the detector's own.
#[allow(async_fn_in_trait)]
pub trait FaceDetector {
    async fn detect_faces(&self, image: &RgbImage) -> Result<Vec<FaceRegion>>;
}

/// Predicts the dominant race and gender for the person in an image.
#[allow(async_fn_in_trait)]
pub trait DemographicClassifier {
    async fn classify(&self, image: &RgbImage) -> Result<Demographics>;
}
