//! # Clip-Degrade
//!
//! Synthetic degradation of short video clips for training restoration models.
//!
//! Clean frames go in, plausibly damaged frames of the same count and size come
//! out: blur, resampling, sensor noise, JPEG blocking and real codec artifacts
//! from an in-memory encode/decode round-trip.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clip_degrade::{config::Config, video::FrameDirectory, Degrader};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut config = Config::default();
//! config.sampling.repeatable = true;
//!
//! let clip = FrameDirectory::open("clips/0001")?;
//! let frames = clip.load_frames(Some(config.pipeline.working_resolution))?;
//!
//! let mut degrader = Degrader::new(config)?;
//! let degraded = degrader.degrade_clip(&frames)?;
//! assert_eq!(degraded.len(), frames.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`random`] - Dual random sources driving parameter sampling
//! - [`degradation`] - Parameter samplers and the two pipelines
//! - [`filters`] - Kernels, convolution, noise, JPEG and resampling
//! - [`video`] - Frame type, clip loading and the codec round-trip
//! - [`config`] - Configuration management
//!
//! ## Driving Parameters Directly
//!
//! Sampling and applying are separate, so a fixed set of parameters can be
//! reused or built by hand:
//!
//! ```rust,no_run
//! use clip_degrade::degradation::{apply_video_degradation, DegradationParams, DegradationToggles};
//! use clip_degrade::video::Frame;
//!
//! # fn main() -> clip_degrade::Result<()> {
//! let frames = vec![Frame::new_filled(320, 240, [90, 120, 200]); 8];
//! let params = DegradationParams::new(&DegradationToggles::all(), true);
//! let degraded = apply_video_degradation(&frames, &params)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod degradation;
pub mod error;
pub mod filters;
pub mod random;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    degradation::{DegradationParams, DegradationParamsV2, Degrader},
    error::{DegradeError, Result},
    video::Frame,
};
