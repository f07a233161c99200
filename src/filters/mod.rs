//! # Filters
//!
//! Image-processing primitives used by the frame degraders: blur kernels,
//! 2D correlation, Gaussian noise, JPEG round-trips and linear resizing.

pub mod convolve;
pub mod jpeg;
pub mod kernel;
pub mod noise;
pub mod resize;

pub use convolve::{filter_2d, gaussian_blur};
pub use jpeg::jpeg_round_trip;
pub use kernel::{bivariate_gaussian, random_mixed_kernel, Kernel, KernelKind, MixedKernelSpec};
pub use noise::{add_gaussian_noise, add_snr_noise};
pub use resize::{resize_linear, scaled_size};
