//! Timed event scripts
//!
//! A script is the unit of work the dispatcher executes: a list of input
//! events, each stamped with an offset from the moment execution starts.

use std::time::Duration;

use input_types::{InputEvent, MouseButton, VirtualKeyCode};
use motion_synth::Path;

/// One input event and when to inject it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEvent {
    pub at: Duration,
    pub event: InputEvent,
}

/// Events with non-decreasing offsets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    events: Vec<ScheduledEvent>,
    end: Duration,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// One pointer move per path sample, at the sample's offset
    pub fn from_path(path: &Path) -> Self {
        let mut script = Self::new();
        script.append_path(path);
        script
    }

    /// Offset of the last event, or later if the script ends with a pause
    pub fn end(&self) -> Duration {
        self.end
    }

    pub fn events(&self) -> &[ScheduledEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Schedule `event` at `at`; offsets earlier than the current end are
    /// pushed forward to keep the script ordered
    pub fn push_at(&mut self, at: Duration, event: InputEvent) -> &mut Self {
        let at = at.max(self.end);
        self.events.push(ScheduledEvent { at, event });
        self.end = at;
        self
    }

    /// Schedule `event` `delay` after the current end
    pub fn then(&mut self, delay: Duration, event: InputEvent) -> &mut Self {
        self.push_at(self.end.saturating_add(delay), event)
    }

    /// Extend the end without adding an event
    pub fn pause(&mut self, delay: Duration) -> &mut Self {
        self.end = self.end.saturating_add(delay);
        self
    }

    /// Append a path, shifted so its first sample lands on the current end
    pub fn append_path(&mut self, path: &Path) -> &mut Self {
        let base = self.end;
        for sample in path.iter() {
            self.push_at(
                base.saturating_add(sample.t_offset),
                InputEvent::MouseMove(sample.position),
            );
        }
        self
    }

    /// Press then release `button` `hold` later
    pub fn click(&mut self, button: MouseButton, hold: Duration) -> &mut Self {
        self.then(Duration::ZERO, InputEvent::button_down(button))
            .then(hold, InputEvent::button_up(button))
    }

    /// Press then release `key` `hold` later
    pub fn tap(&mut self, key: VirtualKeyCode, hold: Duration) -> &mut Self {
        self.then(Duration::ZERO, InputEvent::key_down(key))
            .then(hold, InputEvent::key_up(key))
    }

    pub fn into_events(self) -> Vec<ScheduledEvent> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use input_types::Point;
    use motion_synth::{MotionConfig, PathGenerator};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_path_becomes_moves_at_sample_offsets() {
        let generator = PathGenerator::new(MotionConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let path = generator
            .generate(
                Point::new(0.0, 0.0),
                Point::new(120.0, 40.0),
                Duration::from_millis(200),
                &mut rng,
            )
            .unwrap();

        let script = Script::from_path(&path);
        assert_eq!(script.len(), path.len());
        assert_eq!(script.end(), Duration::from_millis(200));
        for (scheduled, sample) in script.events().iter().zip(path.iter()) {
            assert_eq!(scheduled.at, sample.t_offset);
            assert_eq!(scheduled.event, InputEvent::MouseMove(sample.position));
        }
    }

    #[test]
    fn test_builders_chain_from_the_end() {
        let mut script = Script::new();
        script
            .click(MouseButton::Left, Duration::from_millis(30))
            .pause(Duration::from_millis(70))
            .tap(VirtualKeyCode::Enter, Duration::from_millis(10));

        let offsets: Vec<u64> = script
            .events()
            .iter()
            .map(|e| e.at.as_millis() as u64)
            .collect();
        assert_eq!(offsets, vec![0, 30, 100, 110]);
        assert_eq!(script.events()[2].event, InputEvent::key_down(VirtualKeyCode::Enter));
        assert_eq!(script.end(), Duration::from_millis(110));
    }

    #[test]
    fn test_huge_delays_saturate() {
        let mut script = Script::new();
        script
            .click(MouseButton::Left, Duration::MAX)
            .pause(Duration::from_secs(1))
            .tap(VirtualKeyCode::A, Duration::MAX);
        assert_eq!(script.len(), 4);
        assert_eq!(script.events()[1].at, Duration::MAX);
        assert_eq!(script.end(), Duration::MAX);
    }

    #[test]
    fn test_push_at_never_goes_backwards() {
        let mut script = Script::new();
        script.push_at(Duration::from_millis(50), InputEvent::key_down(VirtualKeyCode::A));
        script.push_at(Duration::from_millis(10), InputEvent::key_up(VirtualKeyCode::A));
        assert_eq!(script.events()[1].at, Duration::from_millis(50));
    }
}
