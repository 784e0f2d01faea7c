//! Ghost cursor state
//!
//! The OS reports the cursor on an integer grid. Re-reading it between
//! synthetic moves would snap every chained move back to whole pixels, so
//! the tracker reads the OS exactly once and from then on only trusts the
//! points that were actually dispatched.

use input_injector::InputBackend;
use input_types::Point;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::MotionResult;

/// Authoritative sub-pixel cursor position
///
/// Reads are free for anyone; writes belong to the dispatcher, which commits
/// each point after the backend accepted it.
#[derive(Debug)]
pub struct GhostTracker {
    position: RwLock<Point>,
}

impl GhostTracker {
    pub fn new(initial: Point) -> MotionResult<Self> {
        initial.validate()?;
        Ok(Self {
            position: RwLock::new(initial),
        })
    }

    /// Seed from the OS-reported cursor position
    pub fn seed_from(backend: &dyn InputBackend) -> MotionResult<Self> {
        let initial = backend.cursor_position()?;
        info!("Ghost cursor seeded at {}", initial);
        Self::new(initial)
    }

    pub fn current(&self) -> Point {
        *self.position.read()
    }

    pub fn commit(&self, point: Point) -> MotionResult<()> {
        point.validate()?;
        *self.position.write() = point;
        debug!("Ghost cursor -> {}", point);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MotionError;
    use input_injector::MockBackend;

    #[test]
    fn test_commit_keeps_sub_pixel_precision() {
        let tracker = GhostTracker::new(Point::new(0.0, 0.0)).unwrap();
        tracker.commit(Point::new(10.125, 20.875)).unwrap();
        assert_eq!(tracker.current(), Point::new(10.125, 20.875));
    }

    #[test]
    fn test_commit_rejects_non_finite() {
        let tracker = GhostTracker::new(Point::new(3.5, 4.5)).unwrap();
        assert!(matches!(
            tracker.commit(Point::new(f64::NAN, 1.0)),
            Err(MotionError::InvalidCoordinate { .. })
        ));
        assert!(tracker.commit(Point::new(1.0, f64::INFINITY)).is_err());
        assert_eq!(tracker.current(), Point::new(3.5, 4.5));
    }

    #[test]
    fn test_seed_reads_os_once() {
        let backend = MockBackend::new(Point::new(41.7, 8.2));
        let tracker = GhostTracker::seed_from(&backend).unwrap();
        assert_eq!(tracker.current(), Point::new(42.0, 8.0));

        // Later OS movement is not picked up
        backend.move_to(Point::new(500.0, 500.0)).unwrap();
        assert_eq!(tracker.current(), Point::new(42.0, 8.0));
    }

    #[test]
    fn test_new_rejects_non_finite_seed() {
        assert!(GhostTracker::new(Point::new(f64::NAN, 0.0)).is_err());
    }
}
