//! # Random Sources
//!
//! Parameter sampling draws from two independent streams: a discrete one for
//! booleans and uniform choices, and a continuous one for ranged numbers and
//! weighted choices. Keeping them apart means toggling a degradation on or off
//! never shifts the values drawn for the others.
//!
//! Both streams sit behind traits so tests can script exact draws.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed of the discrete stream in repeatable mode
pub const REPEATABLE_DISCRETE_SEED: u64 = 42;

/// Seed of the continuous stream in repeatable mode
pub const REPEATABLE_CONTINUOUS_SEED: u64 = 4242;

/// Seed used for noise generation in repeatable mode
pub const REPEATABLE_NOISE_SEED: u64 = 424242;

/// Source of booleans and uniform discrete choices
pub trait DiscreteSource {
    /// Uniform draw in `[0, 1)`
    fn random(&mut self) -> f64;

    /// Uniform index in `0..len`
    fn choose_index(&mut self, len: usize) -> usize;

    /// Bernoulli draw that is true with probability `p`
    fn chance(&mut self, p: f64) -> bool {
        self.random() < p
    }
}

/// Source of ranged numeric draws and weighted choices
pub trait ContinuousSource {
    /// Uniform float in `[low, high)`
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// Uniform integer in `[low, high)`
    fn integer(&mut self, low: i64, high: i64) -> i64;

    /// Index drawn with probability proportional to `weights`
    fn weighted_index(&mut self, weights: &[f64]) -> usize;
}

/// Adapter implementing both source traits for any `rand` generator
#[derive(Debug, Clone)]
pub struct RngSource<R = StdRng> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> DiscreteSource for RngSource<R> {
    fn random(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn choose_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }
}

impl<R: Rng> ContinuousSource for RngSource<R> {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..high)
    }

    fn integer(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..high)
    }

    fn weighted_index(&mut self, weights: &[f64]) -> usize {
        // Degenerate weight tables fall back to the first entry.
        WeightedIndex::new(weights)
            .map(|dist| dist.sample(&mut self.rng))
            .unwrap_or(0)
    }
}

/// The pair of streams a sampler draws from, plus the noise seed used when
/// sampling is repeatable
#[derive(Debug, Clone)]
pub struct RandomSources<D = RngSource, C = RngSource> {
    pub discrete: D,
    pub continuous: C,
    noise_seed: Option<u64>,
}

impl RandomSources {
    /// Create sources seeded from entropy, or from fixed seeds when
    /// `repeatable` is set so the same parameters come out on every run.
    pub fn new(repeatable: bool) -> Self {
        if repeatable {
            Self::from_seeds(REPEATABLE_DISCRETE_SEED, REPEATABLE_CONTINUOUS_SEED)
                .with_noise_seed(REPEATABLE_NOISE_SEED)
        } else {
            Self::with_sources(RngSource::from_entropy(), RngSource::from_entropy())
        }
    }

    /// Create sources from explicit seeds. Noise stays unseeded unless
    /// [`with_noise_seed`](Self::with_noise_seed) is also called.
    pub fn from_seeds(discrete_seed: u64, continuous_seed: u64) -> Self {
        Self::with_sources(RngSource::seeded(discrete_seed), RngSource::seeded(continuous_seed))
    }
}

impl<D: DiscreteSource, C: ContinuousSource> RandomSources<D, C> {
    pub fn with_sources(discrete: D, continuous: C) -> Self {
        Self {
            discrete,
            continuous,
            noise_seed: None,
        }
    }

    pub fn with_noise_seed(mut self, seed: u64) -> Self {
        self.noise_seed = Some(seed);
        self
    }

    pub fn noise_seed(&self) -> Option<u64> {
        self.noise_seed
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;

    use super::{ContinuousSource, DiscreteSource};

    /// Source replaying queued values; panics when a queue runs dry so a test
    /// notices an unexpected extra draw.
    #[derive(Debug, Default)]
    pub struct ScriptedSource {
        pub randoms: VecDeque<f64>,
        pub indices: VecDeque<usize>,
        pub uniforms: VecDeque<f64>,
        pub integers: VecDeque<i64>,
        pub weighted: VecDeque<usize>,
        pub calls: Vec<&'static str>,
    }

    impl ScriptedSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn randoms(mut self, values: &[f64]) -> Self {
            self.randoms.extend(values);
            self
        }

        pub fn indices(mut self, values: &[usize]) -> Self {
            self.indices.extend(values);
            self
        }

        pub fn uniforms(mut self, values: &[f64]) -> Self {
            self.uniforms.extend(values);
            self
        }

        pub fn integers(mut self, values: &[i64]) -> Self {
            self.integers.extend(values);
            self
        }

        pub fn weighted(mut self, values: &[usize]) -> Self {
            self.weighted.extend(values);
            self
        }
    }

    impl DiscreteSource for ScriptedSource {
        fn random(&mut self) -> f64 {
            self.calls.push("random");
            self.randoms.pop_front().expect("scripted random exhausted")
        }

        fn choose_index(&mut self, _len: usize) -> usize {
            self.calls.push("choose_index");
            self.indices.pop_front().expect("scripted index exhausted")
        }
    }

    impl ContinuousSource for ScriptedSource {
        fn uniform(&mut self, low: f64, high: f64) -> f64 {
            self.calls.push("uniform");
            // Scripted values are fractions of the requested range.
            let t = self.uniforms.pop_front().expect("scripted uniform exhausted");
            low + t * (high - low)
        }

        fn integer(&mut self, _low: i64, _high: i64) -> i64 {
            self.calls.push("integer");
            self.integers.pop_front().expect("scripted integer exhausted")
        }

        fn weighted_index(&mut self, _weights: &[f64]) -> usize {
            self.calls.push("weighted_index");
            self.weighted.pop_front().expect("scripted weighted index exhausted")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeatable_sources_agree() {
        let mut a = RandomSources::new(true);
        let mut b = RandomSources::new(true);

        for _ in 0..16 {
            assert_eq!(a.discrete.random(), b.discrete.random());
            assert_eq!(a.continuous.uniform(0.5, 2.0), b.continuous.uniform(0.5, 2.0));
        }
        assert_eq!(a.noise_seed(), Some(REPEATABLE_NOISE_SEED));
    }

    #[test]
    fn test_ranges_are_respected() {
        let mut source = RngSource::seeded(7);
        for _ in 0..1000 {
            let v = source.integer(24, 28);
            assert!((24..28).contains(&v));

            let f = source.uniform(70.0, 90.0);
            assert!((70.0..90.0).contains(&f));

            let r = source.random();
            assert!((0.0..1.0).contains(&r));

            assert!(source.choose_index(4) < 4);
        }
    }

    #[test]
    fn test_weighted_index_never_picks_zero_weight() {
        let mut source = RngSource::seeded(11);
        for _ in 0..500 {
            assert_eq!(source.weighted_index(&[0.0, 1.0, 0.0]), 1);
        }
    }

    #[test]
    fn test_degenerate_ranges() {
        let mut source = RngSource::seeded(3);
        assert_eq!(source.integer(5, 5), 5);
        assert_eq!(source.uniform(2.0, 2.0), 2.0);
        assert_eq!(source.weighted_index(&[]), 0);
        assert_eq!(source.choose_index(0), 0);
    }

    #[test]
    fn test_unseeded_sources_have_no_noise_seed() {
        let sources = RandomSources::new(false);
        assert!(sources.noise_seed().is_none());
        assert!(RandomSources::from_seeds(1, 2).noise_seed().is_none());
    }
}
