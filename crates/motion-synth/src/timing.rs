//! Timing and easing
//!
//! Curves are sampled uniformly in the curve parameter `u`. The easing curve
//! describes how far along the path the cursor is at normalized time `t`, so
//! the time at which to hit parameter `u` is the inverse of the easing curve.
//! Where the easing curve is flat (start and end) consecutive samples end up
//! far apart in time, which is what makes the cursor slow down there.

use std::time::Duration;

use rand::Rng;

use crate::{DelayRange, EasingProfile};

/// Forward easing: normalized time to normalized progress
pub fn ease(profile: EasingProfile, t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    match profile {
        EasingProfile::Linear => t,
        EasingProfile::Smoothstep => t * t * (3.0 - 2.0 * t),
        EasingProfile::Power { exponent } => {
            if t < 0.5 {
                0.5 * (2.0 * t).powf(exponent)
            } else {
                1.0 - 0.5 * (2.0 * (1.0 - t)).powf(exponent)
            }
        }
    }
}

/// Inverse easing: normalized progress to normalized time
pub fn ease_inverse(profile: EasingProfile, u: f64) -> f64 {
    if u <= 0.0 {
        return 0.0;
    }
    if u >= 1.0 {
        return 1.0;
    }
    match profile {
        EasingProfile::Linear => u,
        EasingProfile::Smoothstep => 0.5 - ((1.0 - 2.0 * u).asin() / 3.0).sin(),
        EasingProfile::Power { exponent } => {
            let inv = exponent.recip();
            if u < 0.5 {
                0.5 * (2.0 * u).powf(inv)
            } else {
                1.0 - 0.5 * (2.0 * (1.0 - u)).powf(inv)
            }
        }
    }
}

/// Maps curve progress to elapsed time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingModel {
    easing: EasingProfile,
    jitter: DelayRange,
}

impl TimingModel {
    pub fn new(easing: EasingProfile, jitter: DelayRange) -> Self {
        Self { easing, jitter }
    }

    pub fn easing(&self) -> EasingProfile {
        self.easing
    }

    pub fn jitter(&self) -> DelayRange {
        self.jitter
    }

    /// Eased offset for progress `u`, without jitter
    ///
    /// `map(0, d) == 0`, `map(1, d) == d`, strictly increasing in between.
    pub fn map(&self, u: f64, duration: Duration) -> Duration {
        if u <= 0.0 {
            return Duration::ZERO;
        }
        if u >= 1.0 {
            return duration;
        }
        let nanos = duration.as_nanos() as f64;
        Duration::from_nanos((ease_inverse(self.easing, u) * nanos).round() as u64)
    }

    /// Offsets for a whole sequence of progress values
    ///
    /// Jitter lengthens every step by a random amount, then the steps are
    /// rescaled so the sequence still ends exactly at `duration`. For a
    /// non-zero duration the result is strictly increasing as long as there
    /// are no more steps than nanoseconds.
    pub fn offsets<R: Rng + ?Sized>(
        &self,
        params: &[f64],
        duration: Duration,
        rng: &mut R,
    ) -> Vec<Duration> {
        if params.is_empty() {
            return Vec::new();
        }
        if duration.is_zero() {
            return vec![Duration::ZERO; params.len()];
        }

        let total_ns = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        let fractions = self.fractions(params, duration, rng);

        let mut nanos: Vec<u64> = fractions
            .iter()
            .map(|f| (f * total_ns as f64).round() as u64)
            .collect();

        if params[0] <= 0.0 {
            nanos[0] = 0;
        }
        let last = nanos.len() - 1;
        if params[last] >= 1.0 {
            nanos[last] = total_ns;
        }
        enforce_strictly_increasing(&mut nanos);

        let offsets: Vec<Duration> = nanos.into_iter().map(Duration::from_nanos).collect();
        debug_assert!(
            offsets.len() as u128 > duration.as_nanos()
                || offsets.windows(2).all(|w| w[0] < w[1]),
            "eased offsets must be strictly increasing"
        );
        offsets
    }

    /// Normalized cumulative times in [0, 1]
    fn fractions<R: Rng + ?Sized>(
        &self,
        params: &[f64],
        duration: Duration,
        rng: &mut R,
    ) -> Vec<f64> {
        let eased: Vec<f64> = params
            .iter()
            .map(|&u| ease_inverse(self.easing, u))
            .collect();
        if self.jitter.is_zero() || eased.len() < 2 {
            return eased;
        }

        let duration_secs = duration.as_secs_f64();
        let mut cumulative = Vec::with_capacity(eased.len());
        let mut acc = eased[0];
        cumulative.push(acc);
        for w in eased.windows(2) {
            let extra = self.jitter.sample(rng).as_secs_f64() / duration_secs;
            acc += (w[1] - w[0]) + extra;
            cumulative.push(acc);
        }

        let start = cumulative[0];
        let span = acc - start;
        let target_span = eased[eased.len() - 1] - start;
        if span <= 0.0 {
            return eased;
        }
        cumulative
            .into_iter()
            .map(|c| start + (c - start) / span * target_span)
            .collect()
    }
}

impl Default for TimingModel {
    fn default() -> Self {
        Self::new(EasingProfile::default(), DelayRange::ZERO)
    }
}

/// Nudge rounding collisions apart while keeping both ends pinned
fn enforce_strictly_increasing(nanos: &mut [u64]) {
    let len = nanos.len();
    if len < 2 {
        return;
    }
    let last = nanos[len - 1];
    for i in 1..len - 1 {
        if nanos[i] <= nanos[i - 1] {
            nanos[i] = nanos[i - 1] + 1;
        }
    }
    for i in (1..len - 1).rev() {
        if nanos[i] >= nanos[i + 1] {
            nanos[i] = nanos[i + 1].saturating_sub(1);
        }
    }
    nanos[len - 1] = last;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const PROFILES: [EasingProfile; 4] = [
        EasingProfile::Linear,
        EasingProfile::Smoothstep,
        EasingProfile::Power { exponent: 2.0 },
        EasingProfile::Power { exponent: 3.5 },
    ];

    fn uniform_params(n: usize) -> Vec<f64> {
        (0..=n).map(|i| i as f64 / n as f64).collect()
    }

    #[test]
    fn test_inverse_undoes_ease() {
        for profile in PROFILES {
            for i in 1..100 {
                let t = i as f64 / 100.0;
                let back = ease_inverse(profile, ease(profile, t));
                assert!((back - t).abs() < 1e-9, "{profile:?} at {t}: {back}");
            }
        }
    }

    #[test]
    fn test_map_endpoints_exact() {
        let duration = Duration::from_millis(750);
        for profile in PROFILES {
            let model = TimingModel::new(profile, DelayRange::ZERO);
            assert_eq!(model.map(0.0, duration), Duration::ZERO);
            assert_eq!(model.map(1.0, duration), duration);
        }
    }

    #[test]
    fn test_map_strictly_increasing() {
        let duration = Duration::from_millis(500);
        for profile in PROFILES {
            let model = TimingModel::new(profile, DelayRange::ZERO);
            let offsets: Vec<Duration> = uniform_params(200)
                .into_iter()
                .map(|u| model.map(u, duration))
                .collect();
            assert!(offsets.windows(2).all(|w| w[0] < w[1]), "{profile:?}");
        }
    }

    #[test]
    fn test_smoothstep_is_slow_at_the_ends() {
        let model = TimingModel::new(EasingProfile::Smoothstep, DelayRange::ZERO);
        let mut rng = StdRng::seed_from_u64(1);
        let offsets = model.offsets(&uniform_params(20), Duration::from_secs(1), &mut rng);

        let first_step = offsets[1] - offsets[0];
        let middle_step = offsets[11] - offsets[10];
        let last_step = offsets[20] - offsets[19];
        assert!(first_step > middle_step * 2);
        assert!(last_step > middle_step * 2);
    }

    #[test]
    fn test_jitter_keeps_total_duration() {
        let duration = Duration::from_millis(400);
        let model = TimingModel::new(EasingProfile::Smoothstep, DelayRange::new(1, 15));
        let mut rng = StdRng::seed_from_u64(99);
        let params = uniform_params(50);

        let offsets = model.offsets(&params, duration, &mut rng);
        assert_eq!(offsets.len(), params.len());
        assert_eq!(offsets[0], Duration::ZERO);
        assert_eq!(*offsets.last().unwrap(), duration);
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));

        let plain = TimingModel::new(EasingProfile::Smoothstep, DelayRange::ZERO)
            .offsets(&params, duration, &mut rng);
        assert_ne!(offsets, plain);
    }

    #[test]
    fn test_tiny_duration_still_strict() {
        let model = TimingModel::default();
        let mut rng = StdRng::seed_from_u64(3);
        let duration = Duration::from_nanos(25);
        let offsets = model.offsets(&uniform_params(20), duration, &mut rng);
        assert_eq!(offsets[0], Duration::ZERO);
        assert_eq!(offsets[20], duration);
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_zero_duration_offsets() {
        let model = TimingModel::default();
        let mut rng = StdRng::seed_from_u64(3);
        let offsets = model.offsets(&[0.0, 1.0], Duration::ZERO, &mut rng);
        assert_eq!(offsets, vec![Duration::ZERO, Duration::ZERO]);
    }
}
