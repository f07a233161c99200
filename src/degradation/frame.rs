use crate::degradation::params::DegradationParams;
use crate::degradation::params_v2::DegradationParamsV2;
use crate::error::Result;
use crate::filters::{
    add_gaussian_noise, add_snr_noise, filter_2d, gaussian_blur, jpeg_round_trip, resize_linear,
    scaled_size,
};
use crate::video::types::Frame;

/// Side length of the fixed Gaussian blur kernel in the second pipeline
pub const BLUR_KERNEL_SIZE_V2: usize = 13;

/// Signal-to-noise ratio (dB) of the second pipeline's noise
pub const NOISE_SNR_DB_V2: f64 = 50.0;

/// Degrade one frame: blur, downsample, noise, JPEG, then upsample back to
/// the original size. Only flagged steps run; resizing happens in pairs.
///
/// Work is done on a `[0, 1]` float copy and truncated back to 8-bit. With
/// no step enabled the frame is returned unchanged.
pub fn apply_frame_degradation(frame: &Frame, params: &DegradationParams) -> Result<Frame> {
    if !params.degrades_frames() {
        return Ok(frame.clone());
    }

    let (width, height) = frame.dimensions();
    let mut lq = frame.to_normalized();

    if params.should_add_blur {
        lq = filter_2d(&lq, &params.blur_kernel);
    }

    if params.should_down_sample {
        let (w, h) = scaled_size(width, height, params.scale);
        lq = resize_linear(&lq, w, h);
    }

    if params.should_add_noise {
        add_gaussian_noise(&mut lq, params.sigma / 255.0, params.noise_seed)?;
    }

    if params.should_add_jpeg_compression {
        lq = jpeg_round_trip(&lq, params.jpeg_quality)?;
    }

    if params.should_down_sample {
        lq = resize_linear(&lq, width, height);
    }

    Ok(Frame::from_normalized(&lq))
}

/// Second-pipeline frame degradation: fixed 13×13 Gaussian blur, then light
/// sensor-style noise.
pub fn apply_frame_degradation_v2(frame: &Frame, params: &DegradationParamsV2) -> Result<Frame> {
    let mut lq = if params.should_add_blur {
        gaussian_blur(frame, BLUR_KERNEL_SIZE_V2, params.blur_sigma as f64)
    } else {
        frame.clone()
    };

    if params.should_add_noise {
        lq = add_snr_noise(&lq, NOISE_SNR_DB_V2, params.noise_seed)?;
    }

    Ok(lq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::bivariate_gaussian;
    use crate::video::{RateControl, VideoCodec};

    fn gradient(width: u32, height: u32) -> Frame {
        let mut frame = Frame::new_filled(width, height, [0, 0, 0]);
        for y in 0..height {
            for x in 0..width {
                let v = ((x * 7 + y * 3) % 256) as u8;
                frame.set_pixel(x, y, [v, 255 - v, v / 2]);
            }
        }
        frame
    }

    fn v2_params() -> DegradationParamsV2 {
        DegradationParamsV2 {
            video_codec: VideoCodec::Libx264,
            video_rate: RateControl::Crf(23),
            should_add_video_compression: true,
            blur_sigma: 2,
            should_add_blur: false,
            should_add_noise: false,
            should_run_video_compression_second_pass: false,
            noise_seed: Some(1),
        }
    }

    #[test]
    fn test_disabled_params_are_identity() {
        let frame = gradient(31, 17);
        let out = apply_frame_degradation(&frame, &DegradationParams::disabled()).unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn test_each_step_keeps_size() {
        let frame = gradient(40, 30);

        let mut blur = DegradationParams::disabled();
        blur.should_add_blur = true;
        blur.blur_kernel = bivariate_gaussian(41, 1.5, 0.7, 0.4);

        let mut down = DegradationParams::disabled();
        down.should_down_sample = true;
        down.scale = 1.7;

        let mut up = DegradationParams::disabled();
        up.should_down_sample = true;
        up.scale = 0.6;

        let mut noise = DegradationParams::disabled();
        noise.should_add_noise = true;
        noise.sigma = 2.0;
        noise.noise_seed = Some(3);

        let mut jpeg = DegradationParams::disabled();
        jpeg.should_add_jpeg_compression = true;
        jpeg.jpeg_quality = 72.3;

        for params in [blur, down, up, noise, jpeg] {
            let out = apply_frame_degradation(&frame, &params).unwrap();
            assert_eq!(out.dimensions(), (40, 30), "scale {}", params.scale);
        }
    }

    #[test]
    fn test_all_steps_together() {
        let frame = gradient(64, 48);
        let mut params = DegradationParams::disabled();
        params.should_add_blur = true;
        params.blur_kernel = bivariate_gaussian(41, 1.0, 1.0, 0.0);
        params.should_down_sample = true;
        params.scale = 1.9;
        params.should_add_noise = true;
        params.sigma = 1.0;
        params.should_add_jpeg_compression = true;
        params.jpeg_quality = 80.0;

        let out = apply_frame_degradation(&frame, &params).unwrap();
        assert_eq!(out.dimensions(), (64, 48));
        assert_ne!(out, frame);
    }

    #[test]
    fn test_seeded_noise_is_deterministic() {
        let frame = gradient(20, 20);
        let mut params = DegradationParams::disabled();
        params.should_add_noise = true;
        params.sigma = 1.5;
        params.noise_seed = Some(99);

        let a = apply_frame_degradation(&frame, &params).unwrap();
        let b = apply_frame_degradation(&frame, &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_v2_without_flags_is_identity() {
        let frame = gradient(16, 16);
        assert_eq!(apply_frame_degradation_v2(&frame, &v2_params()).unwrap(), frame);
    }

    #[test]
    fn test_v2_blur_and_noise() {
        let frame = gradient(32, 24);
        let mut params = v2_params();
        params.should_add_blur = true;
        let blurred = apply_frame_degradation_v2(&frame, &params).unwrap();
        assert_eq!(blurred.dimensions(), (32, 24));
        assert_ne!(blurred, frame);

        params.should_add_noise = true;
        let noisy = apply_frame_degradation_v2(&frame, &params).unwrap();
        assert_eq!(noisy.dimensions(), (32, 24));
        assert_eq!(noisy, apply_frame_degradation_v2(&frame, &params).unwrap());
    }
}
