use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bench_core::{BenchError, Demographics, FaceRegion, Result};
use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::models::{DemographicClassifier, FaceDetector};

/// Client for a DeepFace REST service.
#[derive(Clone)]
pub struct DeepFaceClient {
    base_url: String,
    detector_backend: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct RepresentRequest<'a> {
    img: String,
    detector_backend: &'a str,
    enforce_detection: bool,
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    img: String,
    actions: [&'a str; 2],
    detector_backend: &'a str,
    enforce_detection: bool,
    silent: bool,
}

#[derive(Deserialize)]
struct RepresentResponse {
    results: Vec<RepresentResult>,
}

#[derive(Deserialize)]
struct RepresentResult {
    facial_area: FacialArea,
    #[serde(default)]
    face_confidence: Option<f64>,
}

#[derive(Deserialize)]
struct FacialArea {
    x: i64,
    y: i64,
    w: i64,
    h: i64,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    results: Vec<AnalyzeResult>,
}

#[derive(Deserialize)]
struct AnalyzeResult {
    dominant_race: String,
    dominant_gender: String,
}

impl DeepFaceClient {
    pub fn new(base_url: String, detector_backend: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            detector_backend,
            client: reqwest::Client::new(),
        }
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(&self, path: &str, body: &B) -> Result<R> {
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| BenchError::Inference(format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(BenchError::Inference(format!(
                "{} returned {}: {}",
                path, status, text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| BenchError::Inference(format!("malformed {} response: {}", path, e)))
    }
}

impl FaceDetector for DeepFaceClient {
    async fn detect_faces(&self, image: &RgbImage) -> Result<Vec<FaceRegion>> {
        let request = RepresentRequest {
            img: data_url(image)?,
            detector_backend: &self.detector_backend,
            enforce_detection: false,
        };
        let response: RepresentResponse = self.post("represent", &request).await?;
        Ok(faces_from_results(response.results))
    }
}

impl DemographicClassifier for DeepFaceClient {
    async fn classify(&self, image: &RgbImage) -> Result<Demographics> {
        let request = AnalyzeRequest {
            img: data_url(image)?,
            actions: ["race", "gender"],
            detector_backend: &self.detector_backend,
            enforce_detection: false,
            silent: true,
        };
        let response: AnalyzeResponse = self.post("analyze", &request).await?;

        let first = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| BenchError::Inference("analyze returned no results".into()))?;

        Ok(Demographics {
            race: first.dominant_race,
            gender: first.dominant_gender,
        })
    }
}

// With detection not enforced the service reports the whole frame at zero
// confidence when it finds nothing; those entries are not faces.
fn faces_from_results(results: Vec<RepresentResult>) -> Vec<FaceRegion> {
    results
        .into_iter()
        .filter(|r| r.face_confidence.is_none_or(|c| c > 0.0))
        .map(|r| FaceRegion {
            x: r.facial_area.x.max(0) as u32,
            y: r.facial_area.y.max(0) as u32,
            w: r.facial_area.w.max(0) as u32,
            h: r.facial_area.h.max(0) as u32,
        })
        .collect()
}

fn data_url(image: &RgbImage) -> Result<String> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| BenchError::Inference(format!("failed to encode image: {}", e)))?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
}
