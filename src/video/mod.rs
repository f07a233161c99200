//! # Video Module
//!
//! Frame type, codec catalogue, and the in-memory codec round-trip used to
//! simulate compression artifacts across a sequence.

pub mod clip;
pub mod types;
pub mod transcode;

#[cfg(feature = "ffmpeg")]
mod ffmpeg_backend;

pub use clip::{find_frame_directories, FrameDirectory};
pub use types::{Frame, VideoCodec};
pub use transcode::{apply_video_compression, RateControl};
