// src/video/ffmpeg_backend.rs - In-process encode/decode through libavcodec

use ffmpeg_next as ffmpeg;

use ffmpeg::codec::{self, Id};
use ffmpeg::format::Pixel;
use ffmpeg::software::scaling::{self, flag::Flags};
use ffmpeg::util::error::EAGAIN;
use ffmpeg::util::frame::video::Video;
use ffmpeg::{Dictionary, Packet, Rational};
use tracing::debug;

use crate::error::{Result, VideoError};
use crate::video::transcode::{RateControl, FRAME_RATE};
use crate::video::types::{Frame, VideoCodec};

/// Encoded packets held in memory between the encode and decode halves
pub(crate) struct EncodedStream {
    codec_id: Id,
    packets: Vec<Packet>,
}

impl EncodedStream {
    pub(crate) fn packet_count(&self) -> usize {
        self.packets.len()
    }

    pub(crate) fn byte_len(&self) -> usize {
        self.packets.iter().map(|p| p.size()).sum()
    }
}

pub(crate) fn encode(
    frames: &[Frame],
    codec: VideoCodec,
    rate: RateControl,
) -> Result<EncodedStream> {
    ffmpeg::init().map_err(|e| VideoError::EncodingFailed {
        reason: format!("ffmpeg init failed: {}", e),
    })?;

    let Some(first) = frames.first() else {
        return Err(VideoError::EncodingFailed {
            reason: "no frames to encode".to_string(),
        }
        .into());
    };
    let (width, height) = first.dimensions();

    let encoder_codec = ffmpeg::encoder::find_by_name(codec.encoder_name())
        .ok_or_else(|| VideoError::UnsupportedCodec { codec: codec.to_string() })?;

    let mut encoder = codec::context::Context::new_with_codec(encoder_codec)
        .encoder()
        .video()
        .map_err(|e| invalid_options(codec, e))?;

    encoder.set_width(width);
    encoder.set_height(height);
    encoder.set_format(Pixel::YUV420P);
    encoder.set_time_base(Rational::new(1, FRAME_RATE));
    encoder.set_frame_rate(Some(Rational::new(FRAME_RATE, 1)));
    if let RateControl::Bitrate(bitrate) = rate {
        encoder.set_bit_rate(bitrate as usize);
    }

    let mut encoder = encoder
        .open_with(encoder_options(codec, rate))
        .map_err(|e| invalid_options(codec, e))?;

    let mut to_yuv = scaling::Context::get(
        Pixel::RGB24,
        width,
        height,
        Pixel::YUV420P,
        width,
        height,
        Flags::BILINEAR,
    )
    .map_err(|e| encoding_failed("scaler setup", e))?;

    let mut packets = Vec::new();
    for (index, frame) in frames.iter().enumerate() {
        let rgb = to_video_frame(frame);
        let mut yuv = Video::empty();
        to_yuv.run(&rgb, &mut yuv).map_err(|e| encoding_failed("rgb to yuv", e))?;
        yuv.set_pts(Some(index as i64));
        // Let the encoder pick the picture type.
        yuv.set_kind(ffmpeg::picture::Type::None);

        encoder.send_frame(&yuv).map_err(|e| encoding_failed("send frame", e))?;
        drain(|p| encoder.receive_packet(p), &mut packets)?;
    }

    // Flush frames still buffered for lookahead / B-frames.
    encoder.send_eof().map_err(|e| encoding_failed("flush", e))?;
    drain(|p| encoder.receive_packet(p), &mut packets)?;

    debug!("{} produced {} packets for {} frames", codec, packets.len(), frames.len());

    Ok(EncodedStream {
        codec_id: encoder_codec.id(),
        packets,
    })
}

pub(crate) fn decode(stream: &EncodedStream) -> Result<Vec<Frame>> {
    let decoder_codec =
        ffmpeg::decoder::find(stream.codec_id).ok_or_else(|| VideoError::DecodingFailed {
            reason: format!("no decoder for {:?}", stream.codec_id),
        })?;

    let mut decoder = codec::context::Context::new_with_codec(decoder_codec)
        .decoder()
        .video()
        .map_err(|e| decoding_failed("open decoder", e))?;

    let mut to_rgb: Option<scaling::Context> = None;
    let mut frames = Vec::with_capacity(stream.packets.len());

    for packet in &stream.packets {
        decoder.send_packet(packet).map_err(|e| decoding_failed("send packet", e))?;
        receive_frames(|f| decoder.receive_frame(f), &mut to_rgb, &mut frames)?;
    }

    decoder.send_eof().map_err(|e| decoding_failed("flush", e))?;
    receive_frames(|f| decoder.receive_frame(f), &mut to_rgb, &mut frames)?;

    Ok(frames)
}

/// Pull every frame the decoder has ready. Stops once it asks for more
/// input or reports end of stream; any other error is a decode failure.
fn receive_frames<F>(
    mut receive: F,
    to_rgb: &mut Option<scaling::Context>,
    frames: &mut Vec<Frame>,
) -> Result<()>
where
    F: FnMut(&mut Video) -> std::result::Result<(), ffmpeg::Error>,
{
    let mut decoded = Video::empty();
    loop {
        match receive(&mut decoded) {
            Ok(()) => {}
            Err(e) if is_drained(&e) => return Ok(()),
            Err(e) => return Err(decoding_failed("receive frame", e).into()),
        }

        if to_rgb.is_none() {
            let scaler = scaling::Context::get(
                decoded.format(),
                decoded.width(),
                decoded.height(),
                Pixel::RGB24,
                decoded.width(),
                decoded.height(),
                Flags::BILINEAR,
            )
            .map_err(|e| decoding_failed("scaler setup", e))?;
            *to_rgb = Some(scaler);
        }

        if let Some(scaler) = to_rgb.as_mut() {
            let mut rgb = Video::empty();
            scaler.run(&decoded, &mut rgb).map_err(|e| decoding_failed("yuv to rgb", e))?;
            frames.push(from_video_frame(&rgb)?);
        }
    }
}

/// Collect every packet the encoder has ready, with the same stop rule as
/// [`receive_frames`].
fn drain<F>(mut receive: F, packets: &mut Vec<Packet>) -> Result<()>
where
    F: FnMut(&mut Packet) -> std::result::Result<(), ffmpeg::Error>,
{
    loop {
        let mut packet = Packet::empty();
        match receive(&mut packet) {
            Ok(()) => packets.push(packet),
            Err(e) if is_drained(&e) => return Ok(()),
            Err(e) => return Err(encoding_failed("receive packet", e).into()),
        }
    }
}

/// `EAGAIN` and `Eof` only mean no output is ready
fn is_drained(err: &ffmpeg::Error) -> bool {
    matches!(err, ffmpeg::Error::Eof | ffmpeg::Error::Other { errno: EAGAIN })
}

fn encoder_options(codec: VideoCodec, rate: RateControl) -> Dictionary<'static> {
    let mut options = Dictionary::new();
    if let RateControl::Crf(crf) = rate {
        options.set("crf", &crf.to_string());
    }
    if codec == VideoCodec::Libx265 {
        options.set("x265-params", "log_level=error");
    }
    if codec.is_x26x() {
        options.set("preset", "veryfast");
    }
    if codec == VideoCodec::Mpeg2Video {
        // MPEG-2 only knows broadcast frame rates; 1 fps needs relaxed compliance.
        options.set("strict", "unofficial");
    }
    options
}

fn to_video_frame(frame: &Frame) -> Video {
    let (width, height) = frame.dimensions();
    let mut video = Video::new(Pixel::RGB24, width, height);
    let stride = video.stride(0);
    let row_len = width as usize * 3;

    let dst = video.data_mut(0);
    for (y, row) in frame.as_rgb_bytes().chunks_exact(row_len).enumerate() {
        let offset = y * stride;
        dst[offset..offset + row_len].copy_from_slice(row);
    }
    video
}

fn from_video_frame(video: &Video) -> Result<Frame> {
    let width = video.width();
    let height = video.height();
    let stride = video.stride(0);
    let row_len = width as usize * 3;
    let data = video.data(0);

    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for y in 0..height as usize {
        let offset = y * stride;
        pixels.extend_from_slice(&data[offset..offset + row_len]);
    }

    Frame::from_rgb_bytes(width, height, pixels).ok_or_else(|| {
        VideoError::DecodingFailed {
            reason: format!("decoded frame {}x{} has a short buffer", width, height),
        }
        .into()
    })
}

fn invalid_options(codec: VideoCodec, err: ffmpeg::Error) -> VideoError {
    VideoError::InvalidOptions {
        codec: codec.to_string(),
        details: err.to_string(),
    }
}

fn encoding_failed(stage: &str, err: ffmpeg::Error) -> VideoError {
    VideoError::EncodingFailed {
        reason: format!("{}: {}", stage, err),
    }
}

fn decoding_failed(stage: &str, err: ffmpeg::Error) -> VideoError {
    VideoError::DecodingFailed {
        reason: format!("{}: {}", stage, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DegradeError;

    #[test]
    fn test_drain_stops_on_eagain_and_eof() {
        for stop in [ffmpeg::Error::Other { errno: EAGAIN }, ffmpeg::Error::Eof] {
            let mut calls = 0;
            let mut packets = Vec::new();
            drain(
                |_| {
                    calls += 1;
                    if calls <= 2 { Ok(()) } else { Err(stop) }
                },
                &mut packets,
            )
            .unwrap();
            assert_eq!(packets.len(), 2);
        }
    }

    #[test]
    fn test_drain_surfaces_encoder_failure() {
        let mut packets = Vec::new();
        let err = drain(|_| Err(ffmpeg::Error::InvalidData), &mut packets).unwrap_err();
        assert!(matches!(err, DegradeError::Video(VideoError::EncodingFailed { .. })));
        assert!(packets.is_empty());
    }

    #[test]
    fn test_receive_frames_surfaces_decoder_failure() {
        let mut to_rgb = None;
        let mut frames = Vec::new();
        let err = receive_frames(|_| Err(ffmpeg::Error::InvalidData), &mut to_rgb, &mut frames)
            .unwrap_err();
        assert!(matches!(err, DegradeError::Video(VideoError::DecodingFailed { .. })));
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_receive_frames_waits_for_input() {
        let mut to_rgb = None;
        let mut frames = Vec::new();
        let again = ffmpeg::Error::Other { errno: EAGAIN };
        receive_frames(|_| Err(again), &mut to_rgb, &mut frames).unwrap();
        assert!(frames.is_empty());
        assert!(to_rgb.is_none());
    }
}
