use image::{ImageBuffer, Rgb32FImage};

use crate::filters::kernel::{gaussian_1d, Kernel};
use crate::video::types::Frame;

/// Map an out-of-range coordinate back inside `0..len` by mirroring around
/// the edge pixels without repeating them (`gfedcb|abcdefgh|gfedcba`).
fn reflect_101(mut i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    // Loop covers kernels wider than the image.
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }
    i as usize
}

/// Source index for every output position and kernel tap along one axis
fn tap_indices(len: usize, kernel_size: usize) -> Vec<usize> {
    let anchor = (kernel_size / 2) as isize;
    let mut indices = Vec::with_capacity(len * kernel_size);
    for pos in 0..len as isize {
        for tap in 0..kernel_size as isize {
            indices.push(reflect_101(pos + tap - anchor, len));
        }
    }
    indices
}

/// 2D correlation of a float RGB image with `kernel` (kernel not flipped),
/// reflect-101 border
pub fn filter_2d(image: &Rgb32FImage, kernel: &Kernel) -> Rgb32FImage {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);
    let size = kernel.size();

    let xs = tap_indices(w, size);
    let ys = tap_indices(h, size);
    let src = image.as_raw();

    let mut out = vec![0.0f32; src.len()];
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; 3];
            for ky in 0..size {
                let row = ys[y * size + ky] * w;
                for kx in 0..size {
                    let weight = kernel.get(ky, kx);
                    if weight == 0.0 {
                        continue;
                    }
                    let idx = (row + xs[x * size + kx]) * 3;
                    acc[0] += weight * src[idx];
                    acc[1] += weight * src[idx + 1];
                    acc[2] += weight * src[idx + 2];
                }
            }
            let o = (y * w + x) * 3;
            out[o..o + 3].copy_from_slice(&acc);
        }
    }

    ImageBuffer::from_raw(width, height, out).unwrap_or_else(|| ImageBuffer::new(width, height))
}

/// Separable Gaussian blur of an 8-bit frame, rounded back to 8-bit.
///
/// A non-positive `sigma` is derived from `size`.
pub fn gaussian_blur(frame: &Frame, size: usize, sigma: f64) -> Frame {
    let taps = gaussian_1d(size, sigma);
    let size = taps.len();
    let (width, height) = frame.dimensions();
    let (w, h) = (width as usize, height as usize);

    let xs = tap_indices(w, size);
    let ys = tap_indices(h, size);
    let src = frame.as_rgb_bytes();

    let mut horizontal = vec![0.0f32; src.len()];
    for y in 0..h {
        for x in 0..w {
            let o = (y * w + x) * 3;
            for (k, &weight) in taps.iter().enumerate() {
                let idx = (y * w + xs[x * size + k]) * 3;
                for c in 0..3 {
                    horizontal[o + c] += weight * src[idx + c] as f32;
                }
            }
        }
    }

    let mut out = vec![0u8; src.len()];
    for y in 0..h {
        for x in 0..w {
            let o = (y * w + x) * 3;
            let mut acc = [0.0f32; 3];
            for (k, &weight) in taps.iter().enumerate() {
                let idx = (ys[y * size + k] * w + x) * 3;
                for c in 0..3 {
                    acc[c] += weight * horizontal[idx + c];
                }
            }
            for c in 0..3 {
                out[o + c] = acc[c].round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    Frame::from_rgb_bytes(width, height, out).unwrap_or_else(|| frame.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::kernel::bivariate_gaussian;

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(2, 5), 2);
        // Wider than the image.
        assert_eq!(reflect_101(-9, 3), 1);
        assert_eq!(reflect_101(-4, 1), 0);
    }

    #[test]
    fn test_identity_kernel_keeps_image() {
        let frame = Frame::new_filled(9, 7, [10, 128, 250]);
        let mut float = frame.to_normalized();
        float.put_pixel(3, 3, image::Rgb([0.5, 0.25, 1.0]));

        let out = filter_2d(&float, &Kernel::identity(5));
        assert_eq!(out, float);
    }

    #[test]
    fn test_normalized_kernel_keeps_flat_image_flat() {
        let float = Frame::new_filled(12, 10, [100, 100, 100]).to_normalized();
        let out = filter_2d(&float, &bivariate_gaussian(41, 2.0, 1.0, 0.7));
        for p in out.pixels() {
            assert!((p[0] - 100.0 / 255.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_gaussian_blur_smooths_an_edge() {
        let mut frame = Frame::new_filled(20, 20, [0, 0, 0]);
        for y in 0..20 {
            for x in 10..20 {
                frame.set_pixel(x, y, [255, 255, 255]);
            }
        }

        let blurred = gaussian_blur(&frame, 13, 2.0);
        assert_eq!(blurred.dimensions(), (20, 20));
        let left = blurred.get_pixel(9, 10)[0];
        let right = blurred.get_pixel(10, 10)[0];
        assert!(left > 0 && left < 128, "left of edge is {}", left);
        assert!(right > 128 && right < 255, "right of edge is {}", right);
        // Far from the edge nothing changes.
        assert_eq!(blurred.get_pixel(0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_gaussian_blur_flat_frame_unchanged() {
        let frame = Frame::new_filled(8, 5, [37, 99, 201]);
        assert_eq!(gaussian_blur(&frame, 13, 3.0), frame);
    }
}
