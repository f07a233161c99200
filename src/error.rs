use thiserror::Error;

/// Main error type for the clip-degrade library
#[derive(Error, Debug)]
pub enum DegradeError {
    #[error("Video processing error: {0}")]
    Video(#[from] VideoError),

    #[error("Frame processing error: {0}")]
    Frame(#[from] FrameError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Precondition violated: {details}")]
    Precondition { details: String },

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the video transcode round-trip
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Unsupported video codec: {codec}")]
    UnsupportedCodec { codec: String },

    #[error("Invalid encoder options for {codec}: {details}")]
    InvalidOptions { codec: String, details: String },

    #[error("Video encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Video decoding failed: {reason}")]
    DecodingFailed { reason: String },

    #[error("Decoded {actual} frames but encoded {expected}")]
    FrameCountMismatch { expected: usize, actual: usize },

    #[error("Frames must share one size: expected {expected:?}, found {found:?}")]
    MixedFrameSizes { expected: (u32, u32), found: (u32, u32) },

    #[error("Failed to load clip: {path}")]
    LoadFailed { path: String },
}

/// Errors raised while degrading a single frame
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("JPEG round-trip failed: {reason}")]
    JpegFailed { reason: String },

    #[error("Invalid frame dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid noise parameters: {details}")]
    InvalidNoise { details: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using DegradeError
pub type Result<T> = std::result::Result<T, DegradeError>;

impl DegradeError {
    pub fn precondition<S: Into<String>>(details: S) -> Self {
        Self::Precondition { details: details.into() }
    }

    /// True for errors caused by the caller's choice of options rather than
    /// by the frames themselves. None of them are worth retrying.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Precondition { .. }
                | Self::Video(VideoError::UnsupportedCodec { .. })
                | Self::Video(VideoError::InvalidOptions { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_errors_are_configuration_errors() {
        let err: DegradeError = VideoError::UnsupportedCodec { codec: "libfoo".to_string() }.into();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("libfoo"));

        let err: DegradeError = VideoError::FrameCountMismatch { expected: 5, actual: 4 }.into();
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_precondition_message() {
        let err = DegradeError::precondition("max dimension must be 256");
        assert!(err.is_configuration_error());
        assert_eq!(err.to_string(), "Precondition violated: max dimension must be 256");
    }
}
