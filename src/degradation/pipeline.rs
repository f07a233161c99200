use tracing::{debug, info};

use crate::config::{Config, PipelineVersion};
use crate::degradation::frame::{apply_frame_degradation, apply_frame_degradation_v2};
use crate::degradation::params::DegradationParams;
use crate::degradation::params_v2::DegradationParamsV2;
use crate::error::{DegradeError, Result};
use crate::random::{ContinuousSource, DiscreteSource, RandomSources, RngSource};
use crate::video::{apply_video_compression, Frame};

/// Largest frame side the second pipeline accepts
pub const WORKING_RESOLUTION: u32 = 256;

/// First pipeline: degrade every frame on its own, then optionally run the
/// whole sequence through the sampled codec.
pub fn apply_video_degradation(frames: &[Frame], params: &DegradationParams) -> Result<Vec<Frame>> {
    let degraded = frames
        .iter()
        .map(|frame| apply_frame_degradation(frame, params))
        .collect::<Result<Vec<_>>>()?;

    if params.should_add_video_compression {
        return apply_video_compression(&degraded, params.video_codec, params.rate_control());
    }
    Ok(degraded)
}

/// Second pipeline: run the sequence through the sampled codec, then blur and
/// noise each decoded frame.
///
/// Frames must already be at the working resolution (larger side 256 px);
/// anything else is rejected rather than resized here.
pub fn apply_video_degradation_v2(
    frames: &[Frame],
    params: &DegradationParamsV2,
) -> Result<Vec<Frame>> {
    let Some(first) = frames.first() else {
        return Ok(Vec::new());
    };

    let (width, height) = first.dimensions();
    if width.max(height) != WORKING_RESOLUTION {
        return Err(DegradeError::precondition(format!(
            "video compression degradation expects width/height of {}px, got {}x{}",
            WORKING_RESOLUTION, width, height
        )));
    }

    let compressed = apply_video_compression(frames, params.video_codec, params.video_rate)?;
    compressed
        .iter()
        .map(|frame| apply_frame_degradation_v2(frame, params))
        .collect()
}

/// Second pipeline followed, when `params` asks for it, by the fixed
/// libx264 re-encode derived with [`DegradationParamsV2::second_pass`].
pub fn apply_video_degradation_v2_two_pass<C>(
    frames: &[Frame],
    params: &DegradationParamsV2,
    continuous: &mut C,
) -> Result<Vec<Frame>>
where
    C: ContinuousSource + ?Sized,
{
    let first_pass = apply_video_degradation_v2(frames, params)?;
    if !params.should_run_video_compression_second_pass {
        return Ok(first_pass);
    }

    let second = params.second_pass(continuous);
    debug!("Second pass: {} {:?}", second.video_codec, second.video_rate);
    apply_video_degradation_v2(&first_pass, &second)
}

/// Samples fresh parameters for each clip and runs the configured pipeline.
///
/// Holds no state between clips besides its random sources. Run one
/// `Degrader` per worker to process clips in parallel.
pub struct Degrader<D = RngSource, C = RngSource> {
    config: Config,
    sources: RandomSources<D, C>,
}

impl Degrader {
    /// Create a degrader seeded from the configuration: an explicit seed
    /// wins, then the repeatable flag, then entropy.
    pub fn new(config: Config) -> Result<Self> {
        let sources = match config.sampling.seed {
            Some(seed) => RandomSources::from_seeds(seed, seed.wrapping_add(1))
                .with_noise_seed(seed.wrapping_add(2)),
            None => RandomSources::new(config.sampling.repeatable),
        };
        Self::with_sources(config, sources)
    }
}

impl<D: DiscreteSource, C: ContinuousSource> Degrader<D, C> {
    pub fn with_sources(config: Config, sources: RandomSources<D, C>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, sources })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sample_params(&mut self) -> DegradationParams {
        let params = DegradationParams::sample(&self.config.toggles, &mut self.sources);
        debug!("Sampled params: {:?}", ParamsSummary::V1(&params));
        params
    }

    pub fn sample_params_v2(&mut self) -> DegradationParamsV2 {
        let params = DegradationParamsV2::sample(&mut self.sources);
        debug!("Sampled params: {:?}", ParamsSummary::V2(&params));
        params
    }

    /// Degrade one clip with freshly sampled parameters
    pub fn degrade_clip(&mut self, frames: &[Frame]) -> Result<Vec<Frame>> {
        let degraded = match self.config.pipeline.version {
            PipelineVersion::V1 => {
                let params = self.sample_params();
                apply_video_degradation(frames, &params)?
            }
            PipelineVersion::V2 => {
                let params = self.sample_params_v2();
                if self.config.pipeline.second_pass {
                    let continuous = &mut self.sources.continuous;
                    apply_video_degradation_v2_two_pass(frames, &params, continuous)?
                } else {
                    apply_video_degradation_v2(frames, &params)?
                }
            }
        };

        info!("Degraded clip of {} frames ({:?})", degraded.len(), self.config.pipeline.version);
        Ok(degraded)
    }
}

/// Compact debug view that skips the 41×41 kernel weights
enum ParamsSummary<'a> {
    V1(&'a DegradationParams),
    V2(&'a DegradationParamsV2),
}

impl std::fmt::Debug for ParamsSummary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V1(p) => write!(
                f,
                "down={} scale={:.3} noise={} sigma={:.3} jpeg={} q={:.1} video={} {}@{} blur={}",
                p.should_down_sample,
                p.scale,
                p.should_add_noise,
                p.sigma,
                p.should_add_jpeg_compression,
                p.jpeg_quality,
                p.should_add_video_compression,
                p.video_codec,
                p.video_bitrate,
                p.should_add_blur
            ),
            Self::V2(p) => write!(
                f,
                "{} {:?} blur={} sigma={} noise={} second_pass={}",
                p.video_codec,
                p.video_rate,
                p.should_add_blur,
                p.blur_sigma,
                p.should_add_noise,
                p.should_run_video_compression_second_pass
            ),
        }
    }
}
