//! Motion configuration

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{MotionError, MotionResult};

/// Inclusive range of delays in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange {
        min_ms: 0,
        max_ms: 0,
    };

    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub const fn fixed(ms: u64) -> Self {
        Self::new(ms, ms)
    }

    pub fn is_zero(&self) -> bool {
        self.max_ms == 0
    }

    pub fn validate(&self) -> MotionResult<()> {
        if self.min_ms > self.max_ms {
            return Err(MotionError::InvalidConfig(format!(
                "delay range min {}ms exceeds max {}ms",
                self.min_ms, self.max_ms
            )));
        }
        Ok(())
    }

    /// Uniform draw from the range, sub-millisecond resolution
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min_ms >= self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        let ms = rng.gen_range(self.min_ms as f64..=self.max_ms as f64);
        Duration::from_secs_f64(ms / 1000.0)
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Velocity profile along a path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EasingProfile {
    /// Constant velocity
    Linear,
    /// `3t² − 2t³`, slow at both ends
    Smoothstep,
    /// Symmetric ease-in-out `t^exponent` (exponent >= 1); larger exponents
    /// start and stop harder
    Power { exponent: f64 },
}

impl Default for EasingProfile {
    fn default() -> Self {
        Self::Smoothstep
    }
}

/// Motion synthesis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Perpendicular control-point offset as a fraction of distance (0.0-1.0)
    pub curviness: f64,
    /// Lower bound on curve segments per move
    pub min_samples: usize,
    /// Upper bound on curve segments per move
    pub max_samples: usize,
    /// Target spacing between samples along the chord
    pub pixels_per_sample: f64,
    /// Moves shorter than this use a quadratic curve, longer ones a cubic
    pub quadratic_below_px: f64,
    /// Extra random delay added to each step before renormalization
    pub jitter: DelayRange,
    /// Time reparameterization
    pub easing: EasingProfile,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            curviness: 0.3,
            min_samples: 10,
            max_samples: 200,
            pixels_per_sample: 5.0,
            quadratic_below_px: 50.0,
            jitter: DelayRange::ZERO,
            easing: EasingProfile::Smoothstep,
        }
    }
}

impl MotionConfig {
    pub fn validate(&self) -> MotionResult<()> {
        validate_curviness(self.curviness)?;
        if self.min_samples == 0 {
            return Err(MotionError::InvalidConfig(
                "min_samples must be at least 1".into(),
            ));
        }
        if self.min_samples > self.max_samples {
            return Err(MotionError::InvalidConfig(format!(
                "min_samples {} exceeds max_samples {}",
                self.min_samples, self.max_samples
            )));
        }
        if !(self.pixels_per_sample.is_finite() && self.pixels_per_sample > 0.0) {
            return Err(MotionError::InvalidConfig(format!(
                "pixels_per_sample must be positive, got {}",
                self.pixels_per_sample
            )));
        }
        if !(self.quadratic_below_px.is_finite() && self.quadratic_below_px >= 0.0) {
            return Err(MotionError::InvalidConfig(format!(
                "quadratic_below_px must be non-negative, got {}",
                self.quadratic_below_px
            )));
        }
        self.jitter.validate()?;
        if let EasingProfile::Power { exponent } = self.easing {
            if !(exponent.is_finite() && exponent >= 1.0) {
                return Err(MotionError::InvalidConfig(format!(
                    "power easing exponent must be at least 1.0, got {exponent}"
                )));
            }
        }
        Ok(())
    }
}

/// Curviness must lie in 0.0-1.0
pub fn validate_curviness(curviness: f64) -> MotionResult<()> {
    if (0.0..=1.0).contains(&curviness) {
        Ok(())
    } else {
        Err(MotionError::InvalidConfig(format!(
            "curviness must be within 0.0-1.0, got {curviness}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_defaults_are_valid() {
        let config = MotionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.curviness, 0.3);
        assert_eq!(config.min_samples, 10);
        assert_eq!(config.max_samples, 200);
        assert_eq!(config.jitter, DelayRange::ZERO);
        assert_eq!(config.easing, EasingProfile::Smoothstep);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: MotionConfig = serde_json::from_str(
            r#"{"curviness": 0.0, "easing": {"type": "power", "exponent": 3.0}}"#,
        )
        .unwrap();
        assert_eq!(config.curviness, 0.0);
        assert_eq!(config.easing, EasingProfile::Power { exponent: 3.0 });
        assert_eq!(config.max_samples, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let bad = [
            MotionConfig {
                curviness: 1.5,
                ..Default::default()
            },
            MotionConfig {
                curviness: f64::NAN,
                ..Default::default()
            },
            MotionConfig {
                min_samples: 0,
                ..Default::default()
            },
            MotionConfig {
                min_samples: 300,
                ..Default::default()
            },
            MotionConfig {
                pixels_per_sample: 0.0,
                ..Default::default()
            },
            MotionConfig {
                jitter: DelayRange::new(5, 1),
                ..Default::default()
            },
            MotionConfig {
                easing: EasingProfile::Power { exponent: -1.0 },
                ..Default::default()
            },
            MotionConfig {
                easing: EasingProfile::Power { exponent: 0.5 },
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(MotionError::InvalidConfig(_))),
                "{config:?}"
            );
        }
    }

    #[test]
    fn test_delay_range_sampling() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = DelayRange::new(10, 20);
        for _ in 0..100 {
            let delay = range.sample(&mut rng);
            assert!(delay >= Duration::from_millis(10));
            assert!(delay <= Duration::from_millis(20));
        }
        assert_eq!(DelayRange::fixed(15).sample(&mut rng), Duration::from_millis(15));
        assert_eq!(DelayRange::ZERO.sample(&mut rng), Duration::ZERO);
    }
}
