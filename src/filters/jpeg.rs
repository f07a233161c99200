use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageFormat, Rgb32FImage};

use crate::error::{FrameError, Result};
use crate::video::types::Frame;

/// Encode a normalized image as JPEG at `quality` (truncated to an integer
/// in 1..=100) and decode it again.
pub fn jpeg_round_trip(image: &Rgb32FImage, quality: f64) -> Result<Rgb32FImage> {
    let quality = (quality.floor() as i64).clamp(1, 100) as u8;
    let (width, height) = image.dimensions();

    let pixels: Vec<u8> = image
        .iter()
        .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();

    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, quality)
        .encode(&pixels, width, height, ColorType::Rgb8)
        .map_err(|e| FrameError::JpegFailed {
            reason: format!("encode at quality {}: {}", quality, e),
        })?;

    let decoded = image::load_from_memory_with_format(&encoded, ImageFormat::Jpeg).map_err(|e| {
        FrameError::JpegFailed {
            reason: format!("decode: {}", e),
        }
    })?;

    Ok(Frame::new(decoded.to_rgb8()).to_normalized())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_keeps_size_and_range() {
        let mut frame = Frame::new_filled(33, 17, [200, 40, 90]);
        frame.set_pixel(5, 5, [0, 255, 0]);

        let out = jpeg_round_trip(&frame.to_normalized(), 75.9).unwrap();
        assert_eq!(out.dimensions(), (33, 17));
        assert!(out.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_flat_image_survives() {
        let frame = Frame::new_filled(16, 16, [128, 128, 128]);
        let out = jpeg_round_trip(&frame.to_normalized(), 90.0).unwrap();
        let back = Frame::from_normalized(&out);
        let p = back.get_pixel(8, 8);
        assert!((p[0] as i32 - 128).abs() <= 3);
    }
}
