use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bench_core::{BenchError, DeviceKind, PipelineConfig, Precision, Result};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Anything that turns a prompt into an image.
#[allow(async_fn_in_trait)]
pub trait ImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<DynamicImage>;
}

/// Client for a local text-to-image inference server.
///
/// The pipeline settings are fixed when the client is built and sent with
/// every request, so the server can keep one loaded pipeline per setting.
#[derive(Clone)]
pub struct DiffusionClient {
    base_url: String,
    model: String,
    precision: Precision,
    device: DeviceKind,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    precision: Precision,
    device: DeviceKind,
}

#[derive(Deserialize)]
struct GenerateResponse {
    image: String, // base64 PNG
}

impl DiffusionClient {
    pub fn new(base_url: String, model: String, precision: Precision, device: DeviceKind) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            precision,
            device,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &PipelineConfig, device: DeviceKind) -> Self {
        Self::new(
            config.server_url.clone(),
            config.model_id.clone(),
            config.precision,
            device,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn device(&self) -> DeviceKind {
        self.device
    }
}

impl ImageGenerator for DiffusionClient {
    async fn generate(&self, prompt: &str) -> Result<DynamicImage> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            precision: self.precision,
            device: self.device,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BenchError::Generation(format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(BenchError::Generation(format!(
                "diffusion server returned {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| BenchError::Generation(format!("malformed response: {}", e)))?;

        decode_image(&body.image)
    }
}

pub fn decode_image(encoded: &str) -> Result<DynamicImage> {
    // Servers commonly prefix a data URL header.
    let payload = encoded
        .split_once("base64,")
        .map(|(_, data)| data)
        .unwrap_or(encoded);

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| BenchError::Generation(format!("image is not valid base64: {}", e)))?;

    image::load_from_memory(&bytes)
        .map_err(|e| BenchError::Generation(format!("image could not be decoded: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn encoded_png() -> String {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 3, Rgb([10, 20, 30])));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        STANDARD.encode(bytes)
    }

    #[test]
    fn test_decode_plain_and_data_url() {
        let encoded = encoded_png();
        let img = decode_image(&encoded).unwrap();
        assert_eq!((img.width(), img.height()), (2, 3));

        let with_header = format!("data:image/png;base64,{}", encoded);
        assert!(decode_image(&with_header).is_ok());
    }

    #[test]
    fn test_decode_garbage_is_generation_error() {
        let err = decode_image("not base64 at all!").unwrap_err();
        assert!(matches!(err, BenchError::Generation(_)));

        let err = decode_image(&STANDARD.encode(b"plain text")).unwrap_err();
        assert!(matches!(err, BenchError::Generation(_)));
    }

    #[test]
    fn test_request_wire_format() {
        let request = GenerateRequest {
            model: "SG161222/RealVisXL_V4.0",
            prompt: "An individual nurse.",
            precision: Precision::Float16,
            device: DeviceKind::Cuda,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["precision"], "float16");
        assert_eq!(json["device"], "cuda");
        assert_eq!(json["model"], "SG161222/RealVisXL_V4.0");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = DiffusionClient::new(
            "http://localhost:7860/".into(),
            "m".into(),
            Precision::Float32,
            DeviceKind::Cpu,
        );
        assert_eq!(client.base_url, "http://localhost:7860");
    }
}
