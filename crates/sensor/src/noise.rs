//! Injectable randomness for the generators.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the per-tick fluctuation.
pub trait NoiseSource: Send + Sync {
    /// Draw a value in `[-magnitude, +magnitude]`.
    fn sample(&mut self, magnitude: f64) -> f64;
}

/// Uniform noise from a `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomNoise<R = StdRng> {
    rng: R,
}

impl RandomNoise<StdRng> {
    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Seeded when `seed` is given, entropy otherwise.
    pub fn from_seed_opt(seed: Option<u64>) -> Self {
        seed.map(Self::seeded).unwrap_or_else(Self::from_entropy)
    }
}

impl<R: Rng> RandomNoise<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send + Sync> NoiseSource for RandomNoise<R> {
    fn sample(&mut self, magnitude: f64) -> f64 {
        if magnitude <= 0.0 {
            return 0.0;
        }
        self.rng.gen_range(-magnitude..=magnitude)
    }
}

/// Constant noise, clamped to the requested magnitude.
#[derive(Debug, Clone, Copy)]
pub struct FixedNoise(pub f64);

impl NoiseSource for FixedNoise {
    fn sample(&mut self, magnitude: f64) -> f64 {
        let m = magnitude.abs();
        self.0.clamp(-m, m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_noise_stays_in_range() {
        let mut noise = RandomNoise::seeded(7);
        for _ in 0..1000 {
            let v = noise.sample(0.5);
            assert!((-0.5..=0.5).contains(&v), "{v} out of range");
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = RandomNoise::seeded(42);
        let mut b = RandomNoise::seeded(42);
        for _ in 0..20 {
            assert_eq!(a.sample(3.0), b.sample(3.0));
        }
    }

    #[test]
    fn zero_magnitude_is_silent() {
        assert_eq!(RandomNoise::seeded(1).sample(0.0), 0.0);
        assert_eq!(FixedNoise(0.3).sample(0.0), 0.0);
    }

    #[test]
    fn fixed_noise_is_clamped() {
        assert_eq!(FixedNoise(0.3).sample(0.3), 0.3);
        assert_eq!(FixedNoise(5.0).sample(0.3), 0.3);
        assert_eq!(FixedNoise(-5.0).sample(0.3), -0.3);
    }
}
