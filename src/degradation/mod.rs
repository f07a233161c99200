//! # Degradation Pipelines
//!
//! Two independent pipelines turn clean clips into plausible low-quality
//! training inputs:
//!
//! - **First pipeline** ([`DegradationParams`]): per-frame blur, resize, noise
//!   and JPEG, followed by an optional codec pass over the whole clip.
//! - **Second pipeline** ([`DegradationParamsV2`]): a codec pass at the working
//!   resolution followed by light blur and noise, with an optional fixed
//!   libx264 re-encode.
//!
//! Parameters are sampled once per clip and consumed by one pipeline run.

pub mod frame;
pub mod params;
pub mod params_v2;
pub mod pipeline;

pub use frame::{apply_frame_degradation, apply_frame_degradation_v2};
pub use params::{DegradationParams, DegradationToggles};
pub use params_v2::DegradationParamsV2;
pub use pipeline::{
    apply_video_degradation, apply_video_degradation_v2, apply_video_degradation_v2_two_pass,
    Degrader, WORKING_RESOLUTION,
};
