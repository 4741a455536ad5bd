//! Differential-privacy noise and the eligibility decision.

use fintrust_config::PolicyConfig;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use super::Outcome;
use crate::error::EvalError;

/// Source of uniform draws in `[0, 1)`.
pub trait NoiseSource: Send + Sync + std::fmt::Debug {
    fn draw_unit(&self) -> f64;
}

/// CSPRNG-backed draws.
#[derive(Debug)]
pub struct UniformNoise {
    rng: Mutex<ChaCha20Rng>,
}

impl UniformNoise {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(ChaCha20Rng::from_rng(&mut rand::rng())),
        }
    }

    /// Reproducible draws for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha20Rng::seed_from_u64(seed)),
        }
    }
}

impl Default for UniformNoise {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseSource for UniformNoise {
    fn draw_unit(&self) -> f64 {
        self.rng.lock().random::<f64>()
    }
}

/// Always returns the same draw.
#[derive(Debug, Clone, Copy)]
pub struct FixedNoise(f64);

impl FixedNoise {
    /// `draw` is clamped into `[0, 1)`.
    pub fn new(draw: f64) -> Self {
        let draw = if draw.is_nan() { 0.5 } else { draw };
        Self(draw.clamp(0.0, 1.0 - f64::EPSILON))
    }

    /// The midpoint draw, which adds zero noise.
    pub fn centered() -> Self {
        Self(0.5)
    }
}

impl NoiseSource for FixedNoise {
    fn draw_unit(&self) -> f64 {
        self.0
    }
}

/// Threshold and noise parameters for the loan decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrivacyPolicy {
    threshold: f64,
    sensitivity: f64,
    epsilon: f64,
}

impl PrivacyPolicy {
    pub fn new(threshold: f64, sensitivity: f64, epsilon: f64) -> Result<Self, EvalError> {
        if !threshold.is_finite() {
            return Err(EvalError::Policy("threshold must be finite".to_string()));
        }
        if !sensitivity.is_finite() || sensitivity < 0.0 {
            return Err(EvalError::Policy(format!(
                "sensitivity must be finite and >= 0, got {}",
                sensitivity
            )));
        }
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(EvalError::Policy(format!(
                "epsilon must be finite and > 0, got {}",
                epsilon
            )));
        }
        Ok(Self {
            threshold,
            sensitivity,
            epsilon,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Noise for a unit draw: `(u - 0.5) * 2 * sensitivity / epsilon`.
    ///
    /// Bounded by `sensitivity / epsilon` in magnitude.
    pub fn noise(&self, draw: f64) -> f64 {
        (draw - 0.5) * 2.0 * self.sensitivity / self.epsilon
    }

    /// Strictly above the threshold is eligible.
    pub fn outcome(&self, final_score: f64) -> Outcome {
        if final_score > self.threshold {
            Outcome::Eligible
        } else {
            Outcome::Denied
        }
    }

    /// Perturb a raw score and decide on it.
    pub fn decide(&self, raw_score: f64, noise: &dyn NoiseSource) -> (f64, Outcome) {
        let final_score = raw_score + self.noise(noise.draw_unit());
        (final_score, self.outcome(final_score))
    }
}

impl Default for PrivacyPolicy {
    fn default() -> Self {
        let defaults = PolicyConfig::default();
        Self {
            threshold: defaults.threshold,
            sensitivity: defaults.sensitivity,
            epsilon: defaults.epsilon,
        }
    }
}

impl TryFrom<&PolicyConfig> for PrivacyPolicy {
    type Error = EvalError;

    fn try_from(config: &PolicyConfig) -> Result<Self, Self::Error> {
        Self::new(config.threshold, config.sensitivity, config.epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = PrivacyPolicy::default();
        assert_eq!(policy.threshold(), 50_000.0);
        assert_eq!(policy.sensitivity(), 1_000.0);
        assert_eq!(policy.epsilon(), 1.0);
    }

    #[test]
    fn test_noise_formula() {
        let policy = PrivacyPolicy::default();
        assert_eq!(policy.noise(0.5), 0.0);
        assert_eq!(policy.noise(0.0), -1_000.0);
        assert_eq!(policy.noise(0.75), 500.0);

        let tight = PrivacyPolicy::new(50_000.0, 1_000.0, 4.0).unwrap();
        assert_eq!(tight.noise(0.0), -250.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let policy = PrivacyPolicy::default();
        assert_eq!(policy.outcome(50_000.0), Outcome::Denied);
        assert_eq!(policy.outcome(50_000.01), Outcome::Eligible);
        assert_eq!(policy.outcome(49_999.99), Outcome::Denied);
    }

    #[test]
    fn test_decide_is_deterministic_for_fixed_draw() {
        let policy = PrivacyPolicy::default();
        let noise = FixedNoise::new(0.25);
        let first = policy.decide(50_400.0, &noise);
        let second = policy.decide(50_400.0, &noise);
        assert_eq!(first, second);
        assert_eq!(first, (49_900.0, Outcome::Denied));

        assert_eq!(
            policy.decide(50_000.0, &FixedNoise::centered()),
            (50_000.0, Outcome::Denied)
        );
    }

    #[test]
    fn test_uniform_noise_is_bounded_and_reproducible() {
        let policy = PrivacyPolicy::default();
        let a = UniformNoise::seeded(7);
        let b = UniformNoise::seeded(7);
        for _ in 0..1_000 {
            let draw = a.draw_unit();
            assert!((0.0..1.0).contains(&draw));
            assert_eq!(draw, b.draw_unit());
            assert!(policy.noise(draw).abs() <= 1_000.0);
        }
    }

    #[test]
    fn test_fixed_noise_clamps() {
        assert_eq!(FixedNoise::new(-3.0).draw_unit(), 0.0);
        assert!(FixedNoise::new(1.0).draw_unit() < 1.0);
        assert_eq!(FixedNoise::new(f64::NAN).draw_unit(), 0.5);
    }

    #[test]
    fn test_invalid_policy() {
        assert!(matches!(
            PrivacyPolicy::new(f64::INFINITY, 1.0, 1.0),
            Err(EvalError::Policy(_))
        ));
        assert!(matches!(
            PrivacyPolicy::new(1.0, -1.0, 1.0),
            Err(EvalError::Policy(_))
        ));
        assert!(matches!(
            PrivacyPolicy::new(1.0, 1.0, 0.0),
            Err(EvalError::Policy(_))
        ));

        let config = PolicyConfig {
            epsilon: -2.0,
            ..PolicyConfig::default()
        };
        assert!(PrivacyPolicy::try_from(&config).is_err());
    }
}
