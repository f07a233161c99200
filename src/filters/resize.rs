use image::imageops::FilterType;
use image::Rgb32FImage;

/// Size after dividing by `scale`, truncated, never below 1×1
pub fn scaled_size(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = (width as f64 / scale).floor().max(1.0) as u32;
    let h = (height as f64 / scale).floor().max(1.0) as u32;
    (w, h)
}

/// Linear resize of a normalized image. Downscaling widens the filter to the
/// scale factor, so fine detail is averaged rather than aliased.
pub fn resize_linear(image: &Rgb32FImage, width: u32, height: u32) -> Rgb32FImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    image::imageops::resize(image, width, height, FilterType::Triangle)
}
