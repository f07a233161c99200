use std::fmt;

use image::imageops::FilterType;
use image::{ImageBuffer, Rgb, Rgb32FImage, RgbImage};
use serde::{Deserialize, Serialize};

/// Represents a single video frame
///
/// This is a simple wrapper around an 8-bit RGB image buffer (height × width × 3,
/// RGB order) with the conversions the degradation pipeline needs.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_fn(width, height, |_, _| Rgb(color));
        Self { buffer }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// `(width, height)`
    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        self.buffer.put_pixel(x, y, Rgb(color));
    }

    /// Raw interleaved RGB bytes, row-major
    pub fn as_rgb_bytes(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Create a frame from raw RGB bytes
    pub fn from_rgb_bytes(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        ImageBuffer::from_raw(width, height, data).map(|buffer| Self { buffer })
    }

    /// Convert to float RGB normalized to `[0, 1]`
    pub fn to_normalized(&self) -> Rgb32FImage {
        let (width, height) = self.dimensions();
        let data = self.buffer.as_raw().iter().map(|&v| v as f32 / 255.0).collect();
        // Same length as the source buffer, so this cannot fail.
        ImageBuffer::from_raw(width, height, data)
            .unwrap_or_else(|| ImageBuffer::new(width, height))
    }

    /// Convert a normalized float image back to 8-bit by scaling and truncating
    pub fn from_normalized(image: &Rgb32FImage) -> Self {
        let (width, height) = image.dimensions();
        let buffer = ImageBuffer::from_fn(width, height, |x, y| {
            let p = image.get_pixel(x, y).0;
            Rgb([to_u8(p[0]), to_u8(p[1]), to_u8(p[2])])
        });
        Self { buffer }
    }

    /// Pad to `width × height` by replicating the last row and column.
    /// Returns a clone when no padding is needed.
    pub fn padded_to(&self, width: u32, height: u32) -> Self {
        if (width, height) == self.dimensions() {
            return self.clone();
        }

        let max_x = self.width().saturating_sub(1);
        let max_y = self.height().saturating_sub(1);
        let buffer = ImageBuffer::from_fn(width, height, |x, y| {
            *self.buffer.get_pixel(x.min(max_x), y.min(max_y))
        });
        Self { buffer }
    }

    /// Keep the top-left `width × height` region
    pub fn cropped_to(&self, width: u32, height: u32) -> Self {
        if (width, height) == self.dimensions() {
            return self.clone();
        }

        let buffer = image::imageops::crop_imm(&self.buffer, 0, 0, width, height).to_image();
        Self { buffer }
    }

    /// Resize so that the larger side equals `max_dimension`, keeping the aspect ratio
    pub fn fit_to_max_dimension(&self, max_dimension: u32) -> Self {
        let (width, height) = self.dimensions();
        let longest = width.max(height);
        if longest == max_dimension || longest == 0 {
            return self.clone();
        }

        let ratio = max_dimension as f64 / longest as f64;
        let target_w = ((width as f64 * ratio).round() as u32).max(1);
        let target_h = ((height as f64 * ratio).round() as u32).max(1);

        // Use high-quality Lanczos3 filter for smooth resizing
        let buffer =
            image::imageops::resize(&self.buffer, target_w, target_h, FilterType::Lanczos3);
        Self { buffer }
    }

    /// Save the frame as a PNG file
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), image::ImageError> {
        self.buffer.save(path)
    }
}

fn to_u8(value: f32) -> u8 {
    (value * 255.0).clamp(0.0, 255.0) as u8
}

/// Video codecs the transcode degrader can simulate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoCodec {
    #[serde(rename = "libx264")]
    Libx264,
    #[serde(rename = "libx265")]
    Libx265,
    #[serde(rename = "libvpx-vp9")]
    LibvpxVp9,
    #[serde(rename = "mpeg2video")]
    Mpeg2Video,
    #[serde(rename = "mpeg4")]
    Mpeg4,
}

impl VideoCodec {
    /// FFmpeg encoder name
    pub fn encoder_name(&self) -> &'static str {
        match self {
            Self::Libx264 => "libx264",
            Self::Libx265 => "libx265",
            Self::LibvpxVp9 => "libvpx-vp9",
            Self::Mpeg2Video => "mpeg2video",
            Self::Mpeg4 => "mpeg4",
        }
    }

    /// Frame width and height must be multiples of this before encoding.
    ///
    /// yuv420p needs even sizes everywhere; x265 works on 8×8 coding units and
    /// the MPEG family on 16×16 macroblocks.
    pub fn alignment(&self) -> u32 {
        match self {
            Self::Libx264 | Self::LibvpxVp9 => 2,
            Self::Libx265 => 8,
            Self::Mpeg2Video | Self::Mpeg4 => 16,
        }
    }

    /// Whether the x264/x265 `preset` option applies
    pub fn is_x26x(&self) -> bool {
        matches!(self, Self::Libx264 | Self::Libx265)
    }

    /// Smallest `(width, height)` at or above the given size that the codec accepts
    pub fn compatible_size(&self, width: u32, height: u32) -> (u32, u32) {
        let align = self.alignment();
        (align_up(width, align), align_up(height, align))
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.encoder_name())
    }
}

fn align_up(value: u32, align: u32) -> u32 {
    value.max(1).div_ceil(align) * align
}
