//! Additive Gaussian noise.

use image::Rgb32FImage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::error::{FrameError, Result};
use crate::video::types::Frame;

fn noise_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn normal(stddev: f64) -> Result<Normal<f64>> {
    Normal::new(0.0, stddev).map_err(|e| {
        FrameError::InvalidNoise {
            details: format!("stddev {}: {}", stddev, e),
        }
        .into()
    })
}

/// Add zero-mean Gaussian noise with the given standard deviation to every
/// channel of a normalized image, clipping to `[0, 1]`.
///
/// The same `seed` always produces the same noise field.
pub fn add_gaussian_noise(image: &mut Rgb32FImage, stddev: f64, seed: Option<u64>) -> Result<()> {
    let normal = normal(stddev)?;
    let mut rng = noise_rng(seed);

    for v in image.iter_mut() {
        let noisy = *v as f64 + normal.sample(&mut rng);
        *v = noisy.clamp(0.0, 1.0) as f32;
    }
    Ok(())
}

/// Standard deviation of noise at `snr_db` relative to a unit signal
pub fn snr_to_stddev(snr_db: f64) -> f64 {
    10f64.powf(-snr_db / 20.0)
}

/// Add Gaussian noise at the given SNR (dB) to an 8-bit frame.
///
/// Works in `[0, 1]`, clips, and truncates back to 8-bit.
pub fn add_snr_noise(frame: &Frame, snr_db: f64, seed: Option<u64>) -> Result<Frame> {
    let normal = normal(snr_to_stddev(snr_db))?;
    let mut rng = noise_rng(seed);

    let data = frame
        .as_rgb_bytes()
        .iter()
        .map(|&v| {
            let noisy = (v as f64 / 255.0 + normal.sample(&mut rng)).clamp(0.0, 1.0);
            (noisy * 255.0) as u8
        })
        .collect();

    Frame::from_rgb_bytes(frame.width(), frame.height(), data).ok_or_else(|| {
        FrameError::InvalidDimensions {
            width: frame.width(),
            height: frame.height(),
        }
        .into()
    })
}
