//! Bézier path generation
//!
//! Interior control points sit on the chord between start and target (at
//! the midpoint for quadratic curves, at 1/3 and 2/3 for cubic ones) and are
//! pushed sideways by an independent uniform draw in
//! `[-curviness * d, +curviness * d]`. The convex hull of the control points,
//! and with it the whole curve, stays inside the rectangle spanned by the
//! chord and that perpendicular band.

use std::time::Duration;

use input_types::{BoundingBox, Point};
use rand::Rng;
use tracing::debug;

use crate::config::validate_curviness;
use crate::{MotionConfig, MotionError, MotionResult, Path, PathSample, TimingModel};

/// Curve degree in use for a move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveKind {
    Linear,
    Quadratic,
    Cubic,
}

/// Ordered control points of a Bézier curve
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPoints {
    Linear([Point; 2]),
    Quadratic([Point; 3]),
    Cubic([Point; 4]),
}

impl ControlPoints {
    pub fn kind(&self) -> CurveKind {
        match self {
            ControlPoints::Linear(_) => CurveKind::Linear,
            ControlPoints::Quadratic(_) => CurveKind::Quadratic,
            ControlPoints::Cubic(_) => CurveKind::Cubic,
        }
    }

    pub fn points(&self) -> &[Point] {
        match self {
            ControlPoints::Linear(p) => p,
            ControlPoints::Quadratic(p) => p,
            ControlPoints::Cubic(p) => p,
        }
    }

    pub fn start(&self) -> Point {
        self.points()[0]
    }

    pub fn end(&self) -> Point {
        let points = self.points();
        points[points.len() - 1]
    }

    /// Box around the control polygon, which contains the whole curve
    pub fn bounding_box(&self) -> BoundingBox {
        let points = self.points();
        let first = BoundingBox::new(points[0], points[0]);
        points[1..].iter().fold(first, |bbox, p| bbox.including(*p))
    }

    /// Point on the curve at parameter `u`
    ///
    /// The endpoints are returned verbatim so `u = 0` and `u = 1` never
    /// pick up floating-point drift from the polynomial.
    pub fn evaluate(&self, u: f64) -> Point {
        if u <= 0.0 {
            return self.start();
        }
        if u >= 1.0 {
            return self.end();
        }

        let v = 1.0 - u;
        match self {
            ControlPoints::Linear([a, b]) => a.lerp(*b, u),
            ControlPoints::Quadratic([a, c, b]) => {
                let (wa, wc, wb) = (v * v, 2.0 * v * u, u * u);
                Point::new(
                    wa * a.x + wc * c.x + wb * b.x,
                    wa * a.y + wc * c.y + wb * b.y,
                )
            }
            ControlPoints::Cubic([a, c1, c2, b]) => {
                let (wa, w1, w2, wb) = (v * v * v, 3.0 * v * v * u, 3.0 * v * u * u, u * u * u);
                Point::new(
                    wa * a.x + w1 * c1.x + w2 * c2.x + wb * b.x,
                    wa * a.y + w1 * c1.y + w2 * c2.y + wb * b.y,
                )
            }
        }
    }
}

/// Builds timed Bézier paths from the ghost position to a target
#[derive(Debug, Clone)]
pub struct PathGenerator {
    config: MotionConfig,
    timing: TimingModel,
}

impl PathGenerator {
    pub fn new(config: MotionConfig) -> MotionResult<Self> {
        config.validate()?;
        let timing = TimingModel::new(config.easing, config.jitter);
        Ok(Self { config, timing })
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn timing(&self) -> &TimingModel {
        &self.timing
    }

    /// Curve segments for a move of `distance` pixels
    pub fn sample_count(&self, distance: f64) -> usize {
        let raw = (distance / self.config.pixels_per_sample).round();
        let raw = if raw.is_finite() && raw > 0.0 {
            raw.min(usize::MAX as f64) as usize
        } else {
            0
        };
        raw.clamp(self.config.min_samples, self.config.max_samples)
    }

    /// Randomized control points for a move
    pub fn control_points<R: Rng + ?Sized>(
        &self,
        start: Point,
        target: Point,
        curviness: f64,
        rng: &mut R,
    ) -> ControlPoints {
        let chord = target - start;
        let distance = chord.length();
        let Some(direction) = chord.normalized() else {
            return ControlPoints::Linear([start, target]);
        };
        let normal = direction.perpendicular();
        let max_offset = curviness * distance;

        let mut anchor = |t: f64| {
            let offset = if max_offset > 0.0 {
                rng.gen_range(-max_offset..=max_offset)
            } else {
                0.0
            };
            start.lerp(target, t) + normal.scale(offset)
        };

        if distance < self.config.quadratic_below_px {
            ControlPoints::Quadratic([start, anchor(0.5), target])
        } else {
            let c1 = anchor(1.0 / 3.0);
            let c2 = anchor(2.0 / 3.0);
            ControlPoints::Cubic([start, c1, c2, target])
        }
    }

    /// Path using the configured curviness
    pub fn generate<R: Rng + ?Sized>(
        &self,
        start: Point,
        target: Point,
        duration: Duration,
        rng: &mut R,
    ) -> MotionResult<Path> {
        self.generate_with(start, target, duration, self.config.curviness, rng)
    }

    /// Path with an explicit curviness for this move
    pub fn generate_with<R: Rng + ?Sized>(
        &self,
        start: Point,
        target: Point,
        duration: Duration,
        curviness: f64,
        rng: &mut R,
    ) -> MotionResult<Path> {
        start.validate()?;
        target.validate()?;
        validate_curviness(curviness)?;
        let duration_ns = u64::try_from(duration.as_nanos())
            .map_err(|_| MotionError::DurationOutOfRange(duration))?;

        let distance = start.distance_to(target);
        if distance == 0.0 {
            if !duration.is_zero() {
                return Err(MotionError::DegenerateMotion);
            }
            return Ok(Path::from_samples(vec![PathSample {
                position: start,
                t_offset: Duration::ZERO,
            }]));
        }

        if duration.is_zero() {
            return Ok(Path::from_samples(vec![
                PathSample {
                    position: start,
                    t_offset: Duration::ZERO,
                },
                PathSample {
                    position: target,
                    t_offset: Duration::ZERO,
                },
            ]));
        }

        let mut segments = self.sample_count(distance);
        if (segments as u64) > duration_ns {
            segments = duration_ns as usize;
        }

        let curve = self.control_points(start, target, curviness, rng);
        let params: Vec<f64> = (0..=segments)
            .map(|i| i as f64 / segments as f64)
            .collect();
        let offsets = self.timing.offsets(&params, duration, rng);

        let samples: Vec<PathSample> = params
            .iter()
            .zip(offsets)
            .map(|(&u, t_offset)| PathSample {
                position: curve.evaluate(u),
                t_offset,
            })
            .collect();

        debug!(
            "Generated {:?} path {} -> {} over {:?} with {} samples",
            curve.kind(),
            start,
            target,
            duration,
            samples.len()
        );
        Ok(Path::from_samples(samples))
    }
}
