use serde::{Deserialize, Serialize};

use crate::filters::kernel::{random_mixed_kernel, Kernel, MixedKernelSpec};
use crate::random::{ContinuousSource, DiscreteSource, RandomSources};
use crate::video::{RateControl, VideoCodec};

pub const DOWN_SAMPLE_PROBABILITY: f64 = 0.5;
pub const DOWN_SAMPLE_RANGE: (f64, f64) = (0.5, 2.0);

pub const NOISE_PROBABILITY: f64 = 0.3;
/// Noise sigma on the 0–255 scale
pub const NOISE_SIGMA_RANGE: (f64, f64) = (0.0, 2.0);

pub const JPEG_PROBABILITY: f64 = 0.5;
pub const JPEG_QUALITY_RANGE: (f64, f64) = (70.0, 90.0);

pub const VIDEO_COMPRESSION_PROBABILITY: f64 = 0.5;

/// Codecs and their inclusive bitrate ranges (bits per second)
pub const VIDEO_CODECS: [(VideoCodec, (i64, i64)); 4] = [
    (VideoCodec::Libx264, (15_000, 100_000)),
    (VideoCodec::Libx265, (10_000, 60_000)),
    (VideoCodec::LibvpxVp9, (10_000, 60_000)),
    (VideoCodec::Mpeg4, (15_000, 100_000)),
];

pub const BLUR_PROBABILITY: f64 = 0.5;

/// Which degradation categories the caller allows. A category only applies
/// when it is requested here and its own coin flip also comes up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DegradationToggles {
    pub down_sample: bool,
    pub noise: bool,
    pub image_compression: bool,
    pub video_compression: bool,
    pub blur: bool,
}

impl Default for DegradationToggles {
    fn default() -> Self {
        Self {
            down_sample: true,
            noise: true,
            image_compression: true,
            video_compression: false,
            blur: false,
        }
    }
}

impl DegradationToggles {
    pub fn none() -> Self {
        Self {
            down_sample: false,
            noise: false,
            image_compression: false,
            video_compression: false,
            blur: false,
        }
    }

    pub fn all() -> Self {
        Self {
            down_sample: true,
            noise: true,
            image_compression: true,
            video_compression: true,
            blur: true,
        }
    }
}

/// Randomly drawn degradation settings for one clip (first pipeline)
#[derive(Debug, Clone, PartialEq)]
pub struct DegradationParams {
    pub should_down_sample: bool,
    /// Frames are resized by `1 / scale`
    pub scale: f64,

    pub should_add_noise: bool,
    /// Noise standard deviation on the 0–255 scale
    pub sigma: f64,
    /// Fixed seed for the noise field, set in repeatable mode
    pub noise_seed: Option<u64>,

    pub should_add_jpeg_compression: bool,
    pub jpeg_quality: f64,

    pub should_add_video_compression: bool,
    pub video_codec: VideoCodec,
    pub video_bitrate: u32,

    pub should_add_blur: bool,
    pub blur_kernel: Kernel,
}

impl DegradationParams {
    /// Sample with fresh random sources, seeded deterministically when
    /// `repeatable` is set.
    pub fn new(toggles: &DegradationToggles, repeatable: bool) -> Self {
        let mut sources = RandomSources::new(repeatable);
        Self::sample(toggles, &mut sources)
    }

    /// Sample from the given sources.
    ///
    /// Every value is drawn whether or not its category ends up enabled, and
    /// every coin is flipped whether or not its category was requested, so a
    /// fixed seed yields the same values under any toggles.
    pub fn sample<D, C>(toggles: &DegradationToggles, sources: &mut RandomSources<D, C>) -> Self
    where
        D: DiscreteSource,
        C: ContinuousSource,
    {
        let noise_seed = sources.noise_seed();
        let discrete = &mut sources.discrete;
        let continuous = &mut sources.continuous;

        let should_down_sample = discrete.chance(DOWN_SAMPLE_PROBABILITY) && toggles.down_sample;
        let scale = continuous.uniform(DOWN_SAMPLE_RANGE.0, DOWN_SAMPLE_RANGE.1);

        let should_add_noise = discrete.chance(NOISE_PROBABILITY) && toggles.noise;
        let sigma = continuous.uniform(NOISE_SIGMA_RANGE.0, NOISE_SIGMA_RANGE.1);

        let should_add_jpeg_compression =
            discrete.chance(JPEG_PROBABILITY) && toggles.image_compression;
        let jpeg_quality = continuous.uniform(JPEG_QUALITY_RANGE.0, JPEG_QUALITY_RANGE.1);

        let codec_index = discrete.choose_index(VIDEO_CODECS.len()).min(VIDEO_CODECS.len() - 1);
        let (video_codec, (low, high)) = VIDEO_CODECS[codec_index];
        let video_bitrate = continuous.integer(low, high + 1) as u32;
        let should_add_video_compression =
            discrete.chance(VIDEO_COMPRESSION_PROBABILITY) && toggles.video_compression;

        let should_add_blur = discrete.chance(BLUR_PROBABILITY) && toggles.blur;
        let blur_kernel = random_mixed_kernel(&MixedKernelSpec::default(), continuous);

        Self {
            should_down_sample,
            scale,
            should_add_noise,
            sigma,
            noise_seed,
            should_add_jpeg_compression,
            jpeg_quality,
            should_add_video_compression,
            video_codec,
            video_bitrate,
            should_add_blur,
            blur_kernel,
        }
    }

    /// Parameters that leave every frame untouched
    pub fn disabled() -> Self {
        Self {
            should_down_sample: false,
            scale: 1.0,
            should_add_noise: false,
            sigma: 0.0,
            noise_seed: None,
            should_add_jpeg_compression: false,
            jpeg_quality: 100.0,
            should_add_video_compression: false,
            video_codec: VideoCodec::Libx264,
            video_bitrate: VIDEO_CODECS[0].1.0 as u32,
            should_add_blur: false,
            blur_kernel: Kernel::identity(1),
        }
    }

    /// Whether any per-frame step is enabled
    pub fn degrades_frames(&self) -> bool {
        self.should_add_blur
            || self.should_down_sample
            || self.should_add_noise
            || self.should_add_jpeg_compression
    }

    pub fn rate_control(&self) -> RateControl {
        RateControl::Bitrate(self.video_bitrate)
    }
}
