use crate::random::{ContinuousSource, DiscreteSource, RandomSources};
use crate::video::{RateControl, VideoCodec};

/// Codec weights and the inclusive range of the value each one is driven by:
/// a CRF for the x26x encoders, a bitrate (bits per second) for the rest.
pub const VIDEO_CODECS_V2: [(VideoCodec, f64, (i64, i64)); 4] = [
    (VideoCodec::Libx264, 0.3, (16, 28)),
    (VideoCodec::Libx265, 0.3, (20, 36)),
    (VideoCodec::LibvpxVp9, 0.3, (6_000, 16_000)),
    (VideoCodec::Mpeg2Video, 0.1, (18_000, 40_000)),
];

pub const VIDEO_COMPRESSION_PROBABILITY_V2: f64 = 0.9;
/// Gaussian blur sigma, integer in `[1, 4)`
pub const BLUR_SIGMA_RANGE_V2: (i64, i64) = (1, 4);
pub const BLUR_PROBABILITY_V2: f64 = 0.3;
pub const NOISE_PROBABILITY_V2: f64 = 0.2;
pub const SECOND_PASS_PROBABILITY: f64 = 0.15;

/// CRF of the fixed second-pass re-encode, integer in `[24, 28)`
pub const SECOND_PASS_CRF_RANGE: (i64, i64) = (24, 28);

/// Randomly drawn degradation settings for one clip (second pipeline)
#[derive(Debug, Clone, PartialEq)]
pub struct DegradationParamsV2 {
    pub video_codec: VideoCodec,
    /// CRF or bitrate, whichever the codec is driven by
    pub video_rate: RateControl,
    /// Sampled for reference; the second pipeline always compresses
    pub should_add_video_compression: bool,
    pub blur_sigma: u32,
    pub should_add_blur: bool,
    pub should_add_noise: bool,
    pub should_run_video_compression_second_pass: bool,
    /// Fixed seed for the noise field, set in repeatable mode
    pub noise_seed: Option<u64>,
}

impl DegradationParamsV2 {
    /// Sample with fresh random sources, seeded deterministically when
    /// `repeatable` is set.
    pub fn new(repeatable: bool) -> Self {
        let mut sources = RandomSources::new(repeatable);
        Self::sample(&mut sources)
    }

    pub fn sample<D, C>(sources: &mut RandomSources<D, C>) -> Self
    where
        D: DiscreteSource,
        C: ContinuousSource,
    {
        let noise_seed = sources.noise_seed();
        let discrete = &mut sources.discrete;
        let continuous = &mut sources.continuous;

        let weights = VIDEO_CODECS_V2.map(|(_, weight, _)| weight);
        let index = continuous.weighted_index(&weights).min(VIDEO_CODECS_V2.len() - 1);
        let (video_codec, _, (low, high)) = VIDEO_CODECS_V2[index];

        let value = continuous.integer(low, high + 1) as u32;
        let video_rate = if video_codec.is_x26x() {
            RateControl::Crf(value)
        } else {
            RateControl::Bitrate(value)
        };

        let should_add_video_compression = discrete.chance(VIDEO_COMPRESSION_PROBABILITY_V2);
        let blur_sigma = continuous.integer(BLUR_SIGMA_RANGE_V2.0, BLUR_SIGMA_RANGE_V2.1) as u32;
        let should_add_blur = discrete.chance(BLUR_PROBABILITY_V2);
        let should_add_noise = discrete.chance(NOISE_PROBABILITY_V2);
        let should_run_video_compression_second_pass = discrete.chance(SECOND_PASS_PROBABILITY);

        Self {
            video_codec,
            video_rate,
            should_add_video_compression,
            blur_sigma,
            should_add_blur,
            should_add_noise,
            should_run_video_compression_second_pass,
            noise_seed,
        }
    }

    /// Parameters of the follow-up re-encode: libx264 at a CRF in `[24, 28)`
    /// with blur, noise and further passes switched off. `self` is untouched.
    pub fn second_pass<C: ContinuousSource + ?Sized>(&self, continuous: &mut C) -> Self {
        let crf = continuous.integer(SECOND_PASS_CRF_RANGE.0, SECOND_PASS_CRF_RANGE.1) as u32;
        Self {
            video_codec: VideoCodec::Libx264,
            video_rate: RateControl::Crf(crf),
            should_add_blur: false,
            should_add_noise: false,
            should_run_video_compression_second_pass: false,
            ..self.clone()
        }
    }

    pub fn video_crf(&self) -> Option<u32> {
        match self.video_rate {
            RateControl::Crf(crf) => Some(crf),
            RateControl::Bitrate(_) => None,
        }
    }

    pub fn video_bitrate(&self) -> Option<u32> {
        match self.video_rate {
            RateControl::Bitrate(bitrate) => Some(bitrate),
            RateControl::Crf(_) => None,
        }
    }
}
