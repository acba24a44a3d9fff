pub mod deepface;
pub mod hue;
pub mod models;

pub use deepface::DeepFaceClient;
pub use hue::{crop_region, mean_hue, pixel_hue};
pub use models::{DemographicClassifier, FaceDetector};

use bench_core::{AnalysisRecord, Demographics, FaceRegion, NO_FACE_HUE};
use image::RgbImage;
use tracing::{info, warn};

/// Mean hue inside the first detected face.
///
/// Returns `(-1.0, None)` when the detector finds nothing, fails, or the
/// first region falls outside the image. The first region is taken in the
/// detector's own order; no size or confidence tie-break is applied.
pub async fn average_hue_in_face<D: FaceDetector>(
    image: &RgbImage,
    detector: &D,
) -> (f64, Option<FaceRegion>) {
    let faces = match detector.detect_faces(image).await {
        Ok(faces) => faces,
        Err(e) => {
            warn!(error = %e, "Face detection failed, treating image as faceless");
            return (NO_FACE_HUE, None);
        }
    };

    let Some(face) = faces.first().copied() else {
        return (NO_FACE_HUE, None);
    };

    match crop_region(image, &face).as_ref().and_then(mean_hue) {
        Some(hue) => (hue, Some(face)),
        None => {
            warn!(?face, "Face region lies outside the image");
            (NO_FACE_HUE, None)
        }
    }
}

/// Demographic labels for the full image; empty strings on any failure.
pub async fn demographics_or_empty<C: DemographicClassifier>(
    image: &RgbImage,
    classifier: &C,
) -> Demographics {
    match classifier.classify(image).await {
        Ok(demographics) => demographics,
        Err(e) => {
            warn!(error = %e, "Error occurred during demographic analysis");
            Demographics::default()
        }
    }
}

pub struct FaceAnalyzer<D, C> {
    detector: D,
    classifier: C,
}

impl<D: FaceDetector, C: DemographicClassifier> FaceAnalyzer<D, C> {
    pub fn new(detector: D, classifier: C) -> Self {
        Self {
            detector,
            classifier,
        }
    }

    pub async fn analyze_image(&self, image: &RgbImage) -> AnalysisRecord {
        let (hue, face) = average_hue_in_face(image, &self.detector).await;
        let demographics = demographics_or_empty(image, &self.classifier).await;

        AnalysisRecord {
            hue,
            face,
            race: demographics.race,
            gender: demographics.gender,
        }
    }

    /// One record per encoded image, in input order. Images that fail to
    /// decode get an empty record instead of aborting the pass.
    pub async fn analyze_rows<'a, I>(&self, images: I) -> Vec<AnalysisRecord>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut records = Vec::new();

        for (idx, bytes) in images.into_iter().enumerate() {
            let record = match image::load_from_memory(bytes) {
                Ok(decoded) => self.analyze_image(&decoded.to_rgb8()).await,
                Err(e) => {
                    warn!(row = idx, error = %e, "Could not decode image");
                    AnalysisRecord::empty()
                }
            };
            records.push(record);

            if (idx + 1) % 100 == 0 {
                info!(rows = idx + 1, "Analyzed rows");
            }
        }

        records
    }
}
