//! Ghost cursor engine
//!
//! Owns one backend, the ghost tracker and the dispatcher. Every public
//! operation builds a [`Script`] and hands it to the dispatcher, so motion,
//! clicks and typing never interleave.

use std::sync::Arc;
use std::time::Duration;

use input_injector::{BackendCapabilities, InputBackend, create_backend};
use input_types::{InputEvent, KeyModifiers, MouseButton, Point, VirtualKeyCode};
use motion_synth::{
    DelayRange, GhostTracker, MotionConfig, MotionError, PathGenerator, validate_curviness,
};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    DispatchError, DispatchResult, DispatchState, Dispatcher, MotionHandle, Outcome, Script,
    hotkey_script, keystrokes, text_script,
};

/// Pause around the curve move in a drag so the press registers first
const DRAG_SETTLE: Duration = Duration::from_millis(50);

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub motion: MotionConfig,
    /// Delay between typed characters when none is given
    pub typing_delay: DelayRange,
    /// Gap between the two clicks of a double click
    pub double_click_gap: Duration,
    /// Fixed RNG seed for reproducible paths; entropy when unset
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            motion: MotionConfig::default(),
            typing_delay: DelayRange::new(30, 90),
            double_click_gap: Duration::from_millis(80),
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> DispatchResult<()> {
        self.motion.validate()?;
        self.typing_delay.validate()?;
        Ok(())
    }
}

pub struct GhostEngine {
    config: EngineConfig,
    capabilities: BackendCapabilities,
    tracker: Arc<GhostTracker>,
    generator: PathGenerator,
    rng: Mutex<StdRng>,
    dispatcher: Dispatcher,
}

impl GhostEngine {
    /// Engine on the native backend for this platform
    pub fn new(config: EngineConfig) -> DispatchResult<Self> {
        let backend = create_backend()?;
        Self::with_backend(Arc::from(backend), config)
    }

    pub fn with_backend(backend: Arc<dyn InputBackend>, config: EngineConfig) -> DispatchResult<Self> {
        config.validate()?;

        if !backend.has_permission() {
            warn!("Input injection permission not granted; jobs will fail until it is");
        }
        let capabilities = backend.capabilities();
        if !capabilities.absolute_positioning {
            warn!("Backend lacks absolute positioning: {:?}", capabilities);
        }

        let tracker = Arc::new(GhostTracker::seed_from(backend.as_ref())?);
        let generator = PathGenerator::new(config.motion.clone())?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let dispatcher = Dispatcher::new(backend, tracker.clone())?;

        info!(
            "Ghost engine ready at {} (sub-pixel: {})",
            tracker.current(),
            capabilities.sub_pixel_positioning
        );

        Ok(Self {
            config,
            capabilities,
            tracker,
            generator,
            rng: Mutex::new(rng),
            dispatcher,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Capabilities queried once at construction
    pub fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    pub fn state(&self) -> DispatchState {
        self.dispatcher.state()
    }

    /// Sub-pixel ghost position, never re-read from the OS
    pub fn current_position(&self) -> Point {
        self.tracker.current()
    }

    pub fn move_to(&self, x: f64, y: f64, duration: Duration) -> DispatchResult<MotionHandle> {
        self.move_to_with(Point::new(x, y), duration, self.config.motion.curviness)
    }

    pub fn move_to_with(
        &self,
        target: Point,
        duration: Duration,
        curviness: f64,
    ) -> DispatchResult<MotionHandle> {
        self.check_move(target, duration, curviness)?;
        self.dispatcher.submit_with(|| {
            let path = self.path_to(target, duration, curviness)?;
            Ok(Script::from_path(&path))
        })
    }

    /// Move by an offset from the ghost position
    pub fn move_by(&self, dx: f64, dy: f64, duration: Duration) -> DispatchResult<MotionHandle> {
        Point::try_new(dx, dy)?;
        check_duration(duration)?;
        if dx == 0.0 && dy == 0.0 && !duration.is_zero() {
            return Err(MotionError::DegenerateMotion.into());
        }
        let curviness = self.config.motion.curviness;
        self.dispatcher.submit_with(|| {
            let current = self.tracker.current();
            let target = Point::try_new(current.x + dx, current.y + dy)?;
            let path = self.path_to(target, duration, curviness)?;
            Ok(Script::from_path(&path))
        })
    }

    /// Press and release `button` at the ghost position
    pub fn click(&self, button: MouseButton, hold: Duration) -> DispatchResult<MotionHandle> {
        let mut script = Script::new();
        script.click(button, hold);
        self.dispatcher.submit(script)
    }

    /// Curve move to the target, then click there
    pub fn click_at(
        &self,
        x: f64,
        y: f64,
        duration: Duration,
        button: MouseButton,
    ) -> DispatchResult<MotionHandle> {
        let target = Point::try_new(x, y)?;
        check_duration(duration)?;
        self.dispatcher.submit_with(|| {
            let mut script = Script::new();
            if self.tracker.current() != target {
                let path = self.path_to(target, duration, self.config.motion.curviness)?;
                script.append_path(&path);
            }
            script.click(button, Duration::ZERO);
            Ok(script)
        })
    }

    pub fn double_click(&self, button: MouseButton) -> DispatchResult<MotionHandle> {
        let mut script = Script::new();
        script
            .click(button, Duration::ZERO)
            .pause(self.config.double_click_gap)
            .click(button, Duration::ZERO);
        self.dispatcher.submit(script)
    }

    /// Press `button`, curve move to the target, release
    pub fn drag_to(
        &self,
        button: MouseButton,
        x: f64,
        y: f64,
        duration: Duration,
    ) -> DispatchResult<MotionHandle> {
        let target = Point::try_new(x, y)?;
        self.check_move(target, duration, self.config.motion.curviness)?;
        self.dispatcher.submit_with(|| {
            let path = self.path_to(target, duration, self.config.motion.curviness)?;
            let mut script = Script::new();
            script
                .then(Duration::ZERO, InputEvent::button_down(button))
                .pause(DRAG_SETTLE)
                .append_path(&path)
                .pause(DRAG_SETTLE)
                .then(Duration::ZERO, InputEvent::button_up(button));
            Ok(script)
        })
    }

    pub fn key_press(&self, key: VirtualKeyCode, hold: Duration) -> DispatchResult<MotionHandle> {
        let mut script = Script::new();
        script.tap(key, hold);
        self.dispatcher.submit(script)
    }

    /// Press a chord; fails with `TooManyKeys` if the backend cannot hold
    /// that many keys at once
    pub fn hotkey(&self, modifiers: KeyModifiers, key: VirtualKeyCode) -> DispatchResult<MotionHandle> {
        self.check_held_keys(modifiers.keys().len() + 1)?;
        self.dispatcher.submit(hotkey_script(modifiers, key))
    }

    /// Type `text` on a US layout as a single job
    ///
    /// Fails with `UnmappableCharacter` before anything is sent if some
    /// character has no key.
    pub fn type_text(&self, text: &str, per_char_delay: DelayRange) -> DispatchResult<MotionHandle> {
        if keystrokes(text)?.iter().any(|stroke| stroke.shift) {
            self.check_held_keys(2)?;
        }
        let script = text_script(text, per_char_delay, &mut *self.rng.lock())?;
        self.dispatcher.submit(script)
    }

    /// Request cancellation of a job; it stops before its next step
    pub fn cancel(&self, handle: &MotionHandle) {
        handle.cancel();
    }

    /// Cancel whatever is running, if anything
    pub fn cancel_current(&self) -> bool {
        self.dispatcher.cancel_current()
    }

    pub fn move_to_blocking(&self, x: f64, y: f64, duration: Duration) -> DispatchResult<Outcome> {
        self.move_to(x, y, duration)?.wait()
    }

    pub fn click_at_blocking(
        &self,
        x: f64,
        y: f64,
        duration: Duration,
        button: MouseButton,
    ) -> DispatchResult<Outcome> {
        self.click_at(x, y, duration, button)?.wait()
    }

    pub fn type_text_blocking(&self, text: &str, per_char_delay: DelayRange) -> DispatchResult<Outcome> {
        self.type_text(text, per_char_delay)?.wait()
    }

    /// Input checks that must not wait for the dispatcher to be free
    ///
    /// The zero-distance check reads the ghost without the dispatcher lock;
    /// `path_to` repeats it against the settled position.
    fn check_move(&self, target: Point, duration: Duration, curviness: f64) -> DispatchResult<()> {
        target.validate()?;
        validate_curviness(curviness)?;
        check_duration(duration)?;
        if !duration.is_zero() && self.tracker.current() == target {
            return Err(MotionError::DegenerateMotion.into());
        }
        Ok(())
    }

    fn check_held_keys(&self, requested: usize) -> DispatchResult<()> {
        match self.capabilities.max_simultaneous_keys {
            Some(limit) if requested > usize::from(limit) => {
                Err(DispatchError::TooManyKeys { requested, limit })
            }
            _ => Ok(()),
        }
    }

    /// Path from the ghost position; call only from inside `submit_with`
    fn path_to(
        &self,
        target: Point,
        duration: Duration,
        curviness: f64,
    ) -> DispatchResult<motion_synth::Path> {
        let start = self.tracker.current();
        let path = self.generator.generate_with(
            start,
            target,
            duration,
            curviness,
            &mut *self.rng.lock(),
        )?;
        Ok(path)
    }
}

fn check_duration(duration: Duration) -> DispatchResult<()> {
    if u64::try_from(duration.as_nanos()).is_err() {
        return Err(MotionError::DurationOutOfRange(duration).into());
    }
    Ok(())
}
