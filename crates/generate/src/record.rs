use image::DynamicImage;
use uuid::Uuid;

/// A generated image together with the prompt that produced it.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub uuid: Uuid,
    pub image: DynamicImage,
    pub prompt: String,
}

impl ImageRecord {
    pub fn new(image: DynamicImage, prompt: String) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            image,
            prompt,
        }
    }
}
