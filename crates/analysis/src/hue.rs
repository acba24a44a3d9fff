use bench_core::FaceRegion;
use image::{Rgb, RgbImage, imageops};

/// Hue of one RGB pixel in degrees, `[0, 360)`. Greys have hue 0.
pub fn pixel_hue(pixel: &Rgb<u8>) -> f64 {
    let [r, g, b] = pixel.0.map(|c| c as f64 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    if delta == 0.0 {
        return 0.0;
    }

    let hue = if max == r {
        60.0 * ((g - b) / delta)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    if hue < 0.0 { hue + 360.0 } else { hue }
}

/// Arithmetic mean of the hue channel over every pixel, `None` for an empty image.
pub fn mean_hue(image: &RgbImage) -> Option<f64> {
    let count = image.width() as u64 * image.height() as u64;
    if count == 0 {
        return None;
    }
    let total: f64 = image.pixels().map(pixel_hue).sum();
    Some(total / count as f64)
}

/// Crop `region` out of `image`, clamped to the image bounds.
/// Returns `None` when nothing of the region lies inside the image.
pub fn crop_region(image: &RgbImage, region: &FaceRegion) -> Option<RgbImage> {
    let (width, height) = image.dimensions();
    if region.x >= width || region.y >= height {
        return None;
    }
    let w = region.w.min(width - region.x);
    let h = region.h.min(height - region.y);
    if w == 0 || h == 0 {
        return None;
    }
    Some(imageops::crop_imm(image, region.x, region.y, w, h).to_image())
}
