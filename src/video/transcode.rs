// src/video/transcode.rs - Codec round-trip degradation

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, VideoError};
use crate::video::types::{Frame, VideoCodec};

/// Frame rate of the simulated stream. The clip is analysed once and never
/// played back, so any rate works; 1 fps keeps timestamps trivial.
pub const FRAME_RATE: i32 = 1;

/// How the encoder's output size is controlled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateControl {
    /// Target bitrate in bits per second
    Bitrate(u32),
    /// Constant rate factor (quality based, lower is better)
    Crf(u32),
}

impl VideoCodec {
    /// Whether the encoder accepts a `crf` option
    pub fn supports_crf(&self) -> bool {
        matches!(self, Self::Libx264 | Self::Libx265 | Self::LibvpxVp9)
    }
}

/// Encode `frames` with `codec` into an in-memory stream and decode it back.
///
/// Frames are padded to the codec's alignment before encoding and cropped
/// back afterwards, so the output has the input's count and size. All frames
/// must share one size.
///
/// Any encoder failure is returned as is: an unsupported codec or option
/// combination is a configuration error on the caller's side.
pub fn apply_video_compression(
    frames: &[Frame],
    codec: VideoCodec,
    rate: RateControl,
) -> Result<Vec<Frame>> {
    let Some(first) = frames.first() else {
        return Ok(Vec::new());
    };

    validate_rate_control(codec, rate)?;

    let (width, height) = first.dimensions();
    if let Some(odd) = frames.iter().find(|f| f.dimensions() != (width, height)) {
        return Err(VideoError::MixedFrameSizes {
            expected: (width, height),
            found: odd.dimensions(),
        }
        .into());
    }

    let (padded_w, padded_h) = codec.compatible_size(width, height);
    debug!(
        "Compressing {} frames with {} ({:?}), {}x{} padded to {}x{}",
        frames.len(), codec, rate, width, height, padded_w, padded_h
    );

    let padded: Vec<Frame> = frames.iter().map(|f| f.padded_to(padded_w, padded_h)).collect();
    let decoded = round_trip(&padded, codec, rate)?;

    if decoded.len() != frames.len() {
        return Err(VideoError::FrameCountMismatch {
            expected: frames.len(),
            actual: decoded.len(),
        }
        .into());
    }

    Ok(decoded.iter().map(|f| f.cropped_to(width, height)).collect())
}

fn validate_rate_control(codec: VideoCodec, rate: RateControl) -> Result<()> {
    match rate {
        RateControl::Crf(_) if !codec.supports_crf() => Err(VideoError::InvalidOptions {
            codec: codec.to_string(),
            details: "encoder has no crf option, use a bitrate".to_string(),
        }
        .into()),
        RateControl::Bitrate(0) => Err(VideoError::InvalidOptions {
            codec: codec.to_string(),
            details: "bitrate must be positive".to_string(),
        }
        .into()),
        _ => Ok(()),
    }
}

#[cfg(feature = "ffmpeg")]
fn round_trip(frames: &[Frame], codec: VideoCodec, rate: RateControl) -> Result<Vec<Frame>> {
    let stream = super::ffmpeg_backend::encode(frames, codec, rate)?;
    info!(
        "{} stream: {} frames -> {} packets, {} bytes",
        codec,
        frames.len(),
        stream.packet_count(),
        stream.byte_len()
    );
    super::ffmpeg_backend::decode(&stream)
}

#[cfg(not(feature = "ffmpeg"))]
fn round_trip(_frames: &[Frame], codec: VideoCodec, _rate: RateControl) -> Result<Vec<Frame>> {
    info!("Video compression requested but the ffmpeg feature is disabled");
    Err(VideoError::UnsupportedCodec {
        codec: format!("{} (built without the ffmpeg feature)", codec),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DegradeError;

    #[test]
    fn test_empty_sequence_is_empty() {
        let out = apply_video_compression(&[], VideoCodec::Libx264, RateControl::Crf(23)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_mixed_sizes_rejected() {
        let frames = vec![
            Frame::new_filled(16, 16, [0, 0, 0]),
            Frame::new_filled(16, 18, [0, 0, 0]),
        ];
        let err = apply_video_compression(&frames, VideoCodec::Libx264, RateControl::Crf(23))
            .unwrap_err();
        assert!(matches!(err, DegradeError::Video(VideoError::MixedFrameSizes { .. })));
    }

    #[test]
    fn test_crf_on_mpeg_is_invalid() {
        let frames = vec![Frame::new_filled(16, 16, [0, 0, 0])];
        let err = apply_video_compression(&frames, VideoCodec::Mpeg2Video, RateControl::Crf(23))
            .unwrap_err();
        assert!(err.is_configuration_error());

        let err = apply_video_compression(&frames, VideoCodec::Mpeg4, RateControl::Bitrate(0))
            .unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[cfg(feature = "ffmpeg")]
    mod codec_round_trip {
        use super::*;

        fn check_in_range(frames: &[Frame], count: usize, width: u32, height: u32) {
            assert_eq!(frames.len(), count);
            for frame in frames {
                assert_eq!(frame.dimensions(), (width, height));
            }
        }

        #[test]
        fn test_x264_crf_keeps_count_and_size() {
            let frames = vec![Frame::new_filled(256, 256, [120, 60, 200]); 5];
            let out = apply_video_compression(&frames, VideoCodec::Libx264, RateControl::Crf(23))
                .unwrap();
            check_in_range(&out, 5, 256, 256);

            // A flat frame survives lossy coding roughly intact.
            let p = out[2].get_pixel(128, 128);
            assert!((p[0] as i32 - 120).abs() < 24, "red drifted to {}", p[0]);
        }

        #[test]
        fn test_odd_size_is_cropped_back() {
            let frames = vec![Frame::new_filled(255, 257, [30, 30, 30]); 3];
            let out = apply_video_compression(&frames, VideoCodec::Libx264, RateControl::Crf(23))
                .unwrap();
            // 257 rows by 255 columns in, same out.
            check_in_range(&out, 3, 255, 257);
        }

        #[test]
        fn test_bitrate_codecs() {
            let frames = vec![Frame::new_filled(64, 48, [200, 10, 10]); 4];
            for codec in [VideoCodec::Mpeg2Video, VideoCodec::Mpeg4, VideoCodec::LibvpxVp9] {
                let out =
                    apply_video_compression(&frames, codec, RateControl::Bitrate(20_000)).unwrap();
                check_in_range(&out, 4, 64, 48);
            }
        }
    }
}
