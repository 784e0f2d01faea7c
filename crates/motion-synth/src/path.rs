//! Timed point sequences

use std::time::Duration;

use input_types::Point;

/// One point on a curve and when to reach it, relative to motion start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    pub position: Point,
    pub t_offset: Duration,
}

/// Ordered, non-empty samples; first is the start point, last is the target
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    samples: Vec<PathSample>,
}

impl Path {
    pub(crate) fn from_samples(samples: Vec<PathSample>) -> Self {
        debug_assert!(!samples.is_empty(), "paths always hold at least one sample");
        debug_assert!(
            samples.windows(2).all(|w| w[0].t_offset <= w[1].t_offset),
            "path offsets must not go backwards"
        );
        Self { samples }
    }

    pub fn samples(&self) -> &[PathSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn start(&self) -> Point {
        self.samples[0].position
    }

    pub fn end(&self) -> Point {
        self.samples[self.samples.len() - 1].position
    }

    /// Offset of the last sample
    pub fn duration(&self) -> Duration {
        self.samples[self.samples.len() - 1].t_offset
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathSample> {
        self.samples.iter()
    }

    pub fn positions(&self) -> impl Iterator<Item = Point> + '_ {
        self.samples.iter().map(|s| s.position)
    }
}

impl IntoIterator for Path {
    type Item = PathSample;
    type IntoIter = std::vec::IntoIter<PathSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.into_iter()
    }
}
