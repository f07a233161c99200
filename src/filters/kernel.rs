use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::random::ContinuousSource;

/// Square 2D kernel stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    size: usize,
    weights: Vec<f32>,
}

impl Kernel {
    /// Kernel that leaves an image unchanged
    pub fn identity(size: usize) -> Self {
        let size = size | 1;
        let mut weights = vec![0.0; size * size];
        weights[(size / 2) * size + size / 2] = 1.0;
        Self { size, weights }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.weights[row * self.size + col]
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn sum(&self) -> f32 {
        self.weights.iter().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelKind {
    /// Same sigma on both axes, no rotation
    Isotropic,
    /// Independent sigmas and a random rotation
    Anisotropic,
}

/// Distribution the mixed blur kernel is drawn from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixedKernelSpec {
    pub kinds: Vec<KernelKind>,
    pub probabilities: Vec<f64>,
    pub size: usize,
    pub sigma_x_range: (f64, f64),
    pub sigma_y_range: (f64, f64),
    pub rotation_range: (f64, f64),
}

impl Default for MixedKernelSpec {
    fn default() -> Self {
        Self {
            kinds: vec![KernelKind::Isotropic, KernelKind::Anisotropic],
            probabilities: vec![0.5, 0.5],
            size: 41,
            sigma_x_range: (0.0, 2.0),
            sigma_y_range: (0.0, 2.0),
            rotation_range: (-PI, PI),
        }
    }
}

/// Sigmas below this collapse the kernel to a single tap. It keeps the
/// inverse covariance finite when a range starts at zero.
const MIN_SIGMA: f64 = 1e-3;

/// Normalized bivariate Gaussian kernel.
///
/// `rotation` turns the principal axes (radians). The covariance is
/// `R · diag(σx², σy²) · Rᵀ`.
pub fn bivariate_gaussian(size: usize, sigma_x: f64, sigma_y: f64, rotation: f64) -> Kernel {
    let size = size | 1;
    let half = (size / 2) as f64;

    let sx2 = sigma_x.max(MIN_SIGMA).powi(2);
    let sy2 = sigma_y.max(MIN_SIGMA).powi(2);
    let (sin, cos) = rotation.sin_cos();

    // Inverse covariance, written out for the 2×2 case.
    let inv_a = cos * cos / sx2 + sin * sin / sy2;
    let inv_b = cos * sin * (1.0 / sx2 - 1.0 / sy2);
    let inv_d = sin * sin / sx2 + cos * cos / sy2;

    let mut weights = Vec::with_capacity(size * size);
    for row in 0..size {
        let y = row as f64 - half;
        for col in 0..size {
            let x = col as f64 - half;
            let quad = inv_a * x * x + 2.0 * inv_b * x * y + inv_d * y * y;
            weights.push((-0.5 * quad).exp());
        }
    }

    let total: f64 = weights.iter().sum();
    let weights = weights.into_iter().map(|w| (w / total) as f32).collect();
    Kernel { size, weights }
}

/// Draw a blur kernel from `spec`: pick a kind by weight, then its sigmas and
/// rotation, all from the continuous stream.
pub fn random_mixed_kernel<C>(spec: &MixedKernelSpec, rng: &mut C) -> Kernel
where
    C: ContinuousSource + ?Sized,
{
    let index = rng.weighted_index(&spec.probabilities);
    let kind = spec.kinds.get(index).copied().unwrap_or(KernelKind::Isotropic);

    match kind {
        KernelKind::Isotropic => {
            let sigma = rng.uniform(spec.sigma_x_range.0, spec.sigma_x_range.1);
            bivariate_gaussian(spec.size, sigma, sigma, 0.0)
        }
        KernelKind::Anisotropic => {
            let sigma_x = rng.uniform(spec.sigma_x_range.0, spec.sigma_x_range.1);
            let sigma_y = rng.uniform(spec.sigma_y_range.0, spec.sigma_y_range.1);
            let rotation = rng.uniform(spec.rotation_range.0, spec.rotation_range.1);
            bivariate_gaussian(spec.size, sigma_x, sigma_y, rotation)
        }
    }
}

/// Normalized 1D Gaussian taps.
///
/// A non-positive `sigma` is derived from the size the way OpenCV does it.
pub fn gaussian_1d(size: usize, sigma: f64) -> Vec<f32> {
    let size = size | 1;
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8
    };

    let center = (size as f64 - 1.0) / 2.0;
    let taps: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = taps.iter().sum();
    taps.into_iter().map(|t| (t / total) as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::testing::ScriptedSource;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_bivariate_is_normalized_and_symmetric() {
        let kernel = bivariate_gaussian(41, 1.5, 1.5, 0.0);
        assert_eq!(kernel.size(), 41);
        assert!(approx(kernel.sum(), 1.0));
        assert!(approx(kernel.get(20, 10), kernel.get(10, 20)));
        assert!(approx(kernel.get(0, 0), kernel.get(40, 40)));

        let peak = kernel.get(20, 20);
        assert!(kernel.weights().iter().all(|&w| w <= peak));
    }

    #[test]
    fn test_tiny_sigma_collapses_to_identity() {
        let kernel = bivariate_gaussian(7, 0.0, 0.0, 0.3);
        assert!(approx(kernel.get(3, 3), 1.0));
        assert!(approx(kernel.sum(), 1.0));
    }

    #[test]
    fn test_anisotropic_rotation() {
        // Wide along x, narrow along y.
        let flat = bivariate_gaussian(21, 4.0, 0.5, 0.0);
        assert!(flat.get(10, 14) > flat.get(14, 10));

        // A quarter turn swaps the axes.
        let turned = bivariate_gaussian(21, 4.0, 0.5, PI / 2.0);
        assert!(turned.get(14, 10) > turned.get(10, 14));
    }

    #[test]
    fn test_random_mixed_kernel_draw_order() {
        let spec = MixedKernelSpec::default();

        let mut iso = ScriptedSource::new().weighted(&[0]).uniforms(&[0.5]);
        let kernel = random_mixed_kernel(&spec, &mut iso);
        assert_eq!(iso.calls, vec!["weighted_index", "uniform"]);
        assert_eq!(kernel, bivariate_gaussian(41, 1.0, 1.0, 0.0));

        let mut aniso = ScriptedSource::new().weighted(&[1]).uniforms(&[0.25, 0.75, 0.5]);
        let kernel = random_mixed_kernel(&spec, &mut aniso);
        assert_eq!(aniso.calls, vec!["weighted_index", "uniform", "uniform", "uniform"]);
        assert_eq!(kernel, bivariate_gaussian(41, 0.5, 1.5, 0.0));
    }

    #[test]
    fn test_gaussian_1d() {
        let taps = gaussian_1d(13, 2.0);
        assert_eq!(taps.len(), 13);
        assert!(approx(taps.iter().sum(), 1.0));
        assert!(approx(taps[0], taps[12]));
        assert!(taps[6] > taps[5]);

        let derived = gaussian_1d(5, 0.0);
        assert_eq!(derived.len(), 5);
        assert!(approx(derived.iter().sum(), 1.0));
    }

    #[test]
    fn test_identity_kernel_is_odd() {
        let kernel = Kernel::identity(4);
        assert_eq!(kernel.size(), 5);
        assert_eq!(kernel.get(2, 2), 1.0);
        assert!(approx(kernel.sum(), 1.0));
    }
}
