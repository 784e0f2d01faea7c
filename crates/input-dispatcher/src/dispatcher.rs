//! Single-consumer dispatcher
//!
//! One worker thread owns all injection. Jobs arrive over a channel, run one
//! at a time, and report their [`Outcome`] through the job's handle. A job
//! submitted while another is running is rejected with
//! [`DispatchError::Busy`] rather than queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use input_injector::{BackendError, InputBackend};
use input_types::{InputEvent, MouseButton, VirtualKeyCode};
use motion_synth::GhostTracker;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::{CancelToken, DispatchError, DispatchResult, MotionHandle, Outcome, Script};

/// Longest uninterrupted sleep between cancellation checks
const CANCEL_POLL: Duration = Duration::from_millis(5);

/// Dispatcher lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl DispatchState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DispatchState::Completed | DispatchState::Cancelled | DispatchState::Failed
        )
    }
}

impl From<&Outcome> for DispatchState {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Completed { .. } => DispatchState::Completed,
            Outcome::Cancelled { .. } => DispatchState::Cancelled,
            Outcome::Failed { .. } => DispatchState::Failed,
        }
    }
}

struct Job {
    id: u64,
    script: Script,
    cancel: CancelToken,
    reply: oneshot::Sender<Outcome>,
}

/// State shared between submitters and the worker
struct Shared {
    state: Mutex<DispatchState>,
    /// Cancel token of the running job; only touched with `state` locked
    current: Mutex<Option<CancelToken>>,
}

pub struct Dispatcher {
    backend: Arc<dyn InputBackend>,
    tracker: Arc<GhostTracker>,
    shared: Arc<Shared>,
    next_id: AtomicU64,
    job_tx: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl Dispatcher {
    /// Start the worker thread
    pub fn new(backend: Arc<dyn InputBackend>, tracker: Arc<GhostTracker>) -> DispatchResult<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(DispatchState::Idle),
            current: Mutex::new(None),
        });
        let (job_tx, job_rx) = unbounded();

        let worker = Worker {
            backend: backend.clone(),
            tracker: tracker.clone(),
            shared: shared.clone(),
        };
        let handle = std::thread::Builder::new()
            .name("ghost-dispatch".into())
            .spawn(move || worker.run(job_rx))?;

        Ok(Self {
            backend,
            tracker,
            shared,
            next_id: AtomicU64::new(1),
            job_tx: Some(job_tx),
            worker: Some(handle),
        })
    }

    pub fn backend(&self) -> &Arc<dyn InputBackend> {
        &self.backend
    }

    pub fn tracker(&self) -> &Arc<GhostTracker> {
        &self.tracker
    }

    pub fn state(&self) -> DispatchState {
        *self.shared.state.lock()
    }

    pub fn is_running(&self) -> bool {
        self.state() == DispatchState::Running
    }

    /// Submit a prepared script
    pub fn submit(&self, script: Script) -> DispatchResult<MotionHandle> {
        self.submit_with(|| Ok(script))
    }

    /// Build and submit a script atomically
    ///
    /// `build` runs with the state locked and only when the dispatcher is not
    /// running, so anything it reads from the ghost tracker cannot change
    /// before the job starts.
    pub fn submit_with<F>(&self, build: F) -> DispatchResult<MotionHandle>
    where
        F: FnOnce() -> DispatchResult<Script>,
    {
        let mut state = self.shared.state.lock();
        if *state == DispatchState::Running {
            debug!("Rejecting job: dispatcher busy");
            return Err(DispatchError::Busy);
        }

        let script = build()?;
        let job_tx = self.job_tx.as_ref().ok_or(DispatchError::DispatcherStopped)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancelToken::new();
        let (reply, rx) = oneshot::channel();
        let job = Job {
            id,
            script,
            cancel: cancel.clone(),
            reply,
        };

        let steps = job.script.len();
        let previous = *state;
        *state = DispatchState::Running;
        if job_tx.send(job).is_err() {
            *state = previous;
            error!("Dispatcher worker is gone, job {} dropped", id);
            return Err(DispatchError::DispatcherStopped);
        }
        *self.shared.current.lock() = Some(cancel.clone());

        debug!("Job {} submitted: {} steps ({:?} -> Running)", id, steps, previous);
        Ok(MotionHandle::new(id, cancel, rx))
    }

    /// Cancel whatever is running; returns false if nothing was
    pub fn cancel_current(&self) -> bool {
        let _state = self.shared.state.lock();
        match self.shared.current.lock().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.cancel_current();
        self.job_tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Dispatcher worker panicked");
            }
        }
    }
}

/// Inputs pressed by the running job and not yet released
#[derive(Default)]
struct HeldInputs {
    buttons: Vec<MouseButton>,
    keys: Vec<VirtualKeyCode>,
}

impl HeldInputs {
    fn record(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::MouseButton { button, pressed } => {
                self.buttons.retain(|b| *b != button);
                if pressed {
                    self.buttons.push(button);
                }
            }
            InputEvent::Key { key, pressed } => {
                self.keys.retain(|k| *k != key);
                if pressed {
                    self.keys.push(key);
                }
            }
            InputEvent::MouseMove(_) => {}
        }
    }

    /// Release everything in reverse press order, logging failures
    fn release_all(&mut self, backend: &dyn InputBackend) {
        for key in self.keys.drain(..).rev() {
            if let Err(e) = backend.set_key(key, false) {
                warn!("Failed to release key {:?}: {}", key, e);
            }
        }
        for button in self.buttons.drain(..).rev() {
            if let Err(e) = backend.set_button(button, false) {
                warn!("Failed to release button {:?}: {}", button, e);
            }
        }
    }
}

struct Worker {
    backend: Arc<dyn InputBackend>,
    tracker: Arc<GhostTracker>,
    shared: Arc<Shared>,
}

impl Worker {
    fn run(self, jobs: Receiver<Job>) {
        info!("Dispatcher worker started");

        while let Ok(job) = jobs.recv() {
            let started = Instant::now();
            let outcome = self.execute(&job.script, &job.cancel);
            let state = DispatchState::from(&outcome);

            {
                let mut current = self.shared.state.lock();
                *current = state;
                self.shared.current.lock().take();
            }

            info!(
                "Job {} finished in {:?}: {:?}",
                job.id,
                started.elapsed(),
                outcome
            );
            if job.reply.send(outcome).is_err() {
                debug!("Job {} handle dropped before completion", job.id);
            }
        }

        info!("Dispatcher worker stopped");
    }

    fn execute(&self, script: &Script, cancel: &CancelToken) -> Outcome {
        let start = Instant::now();
        let mut held = HeldInputs::default();

        for (step, scheduled) in script.events().iter().enumerate() {
            if !wait_until(start.checked_add(scheduled.at), cancel) {
                held.release_all(self.backend.as_ref());
                return Outcome::Cancelled { steps: step };
            }

            if let Err(error) = self.inject(&scheduled.event) {
                warn!("Step {} of {} failed: {}", step, script.len(), error);
                held.release_all(self.backend.as_ref());
                return Outcome::Failed { steps: step, error };
            }
            held.record(&scheduled.event);
        }

        Outcome::Completed {
            steps: script.len(),
        }
    }

    /// Inject one event; pointer moves are committed to the ghost only
    /// after the backend accepted them
    fn inject(&self, event: &InputEvent) -> Result<(), BackendError> {
        if let InputEvent::MouseMove(point) = *event {
            if !point.is_finite() {
                return Err(BackendError::InvalidCoordinates {
                    x: point.x,
                    y: point.y,
                });
            }
        }

        self.backend.dispatch(event)?;

        if let InputEvent::MouseMove(point) = *event {
            self.tracker
                .commit(point)
                .map_err(|e| BackendError::Platform(e.to_string()))?;
        }
        Ok(())
    }
}

/// Sleep until `deadline` in short slices; false if cancelled first
///
/// A deadline past what `Instant` can represent is never reached, so the
/// wait only ends on cancellation.
fn wait_until(deadline: Option<Instant>, cancel: &CancelToken) -> bool {
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        let remaining = match deadline {
            Some(deadline) if now >= deadline => return true,
            Some(deadline) => deadline - now,
            None => CANCEL_POLL,
        };
        std::thread::sleep(remaining.min(CANCEL_POLL));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use input_injector::MockBackend;
    use input_types::Point;
    use motion_synth::{MotionConfig, PathGenerator};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn setup(start: Point) -> (Arc<MockBackend>, Arc<GhostTracker>, Dispatcher) {
        let backend = Arc::new(MockBackend::new(start));
        let tracker = Arc::new(GhostTracker::seed_from(backend.as_ref()).unwrap());
        let dispatcher = Dispatcher::new(backend.clone(), tracker.clone()).unwrap();
        (backend, tracker, dispatcher)
    }

    fn path_script(from: Point, to: Point, duration: Duration) -> (Script, motion_synth::Path) {
        let generator = PathGenerator::new(MotionConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        let path = generator.generate(from, to, duration, &mut rng).unwrap();
        (Script::from_path(&path), path)
    }

    #[test]
    fn test_runs_script_to_completion() {
        let (backend, tracker, dispatcher) = setup(Point::ORIGIN);
        assert_eq!(dispatcher.state(), DispatchState::Idle);

        let target = Point::new(200.5, 100.25);
        let (script, path) = path_script(Point::ORIGIN, target, Duration::from_millis(60));
        let outcome = dispatcher.submit(script).unwrap().wait().unwrap();

        assert_eq!(outcome, Outcome::Completed { steps: path.len() });
        assert_eq!(dispatcher.state(), DispatchState::Completed);
        assert_eq!(tracker.current(), target);
        assert_eq!(backend.events().len(), path.len());
        assert_eq!(backend.os_position(), (201, 100));
    }

    #[test]
    fn test_empty_script_completes() {
        let (_backend, _tracker, dispatcher) = setup(Point::ORIGIN);
        let outcome = dispatcher.submit(Script::new()).unwrap().wait().unwrap();
        assert_eq!(outcome, Outcome::Completed { steps: 0 });
    }

    #[test]
    fn test_busy_while_running() {
        let (backend, _tracker, dispatcher) = setup(Point::ORIGIN);
        let (script, path) = path_script(
            Point::ORIGIN,
            Point::new(300.0, 0.0),
            Duration::from_millis(300),
        );
        let handle = dispatcher.submit(script).unwrap();

        let (other, _) = path_script(Point::ORIGIN, Point::new(0.0, 300.0), Duration::ZERO);
        assert!(matches!(dispatcher.submit(other), Err(DispatchError::Busy)));
        assert!(dispatcher.is_running());

        let outcome = handle.wait().unwrap();
        assert!(outcome.is_completed());
        assert_eq!(backend.events().len(), path.len());
    }

    #[test]
    fn test_build_error_leaves_state_untouched() {
        let (_backend, _tracker, dispatcher) = setup(Point::ORIGIN);
        let result = dispatcher.submit_with(|| Err(DispatchError::UnmappableCharacter('é')));
        assert!(matches!(result, Err(DispatchError::UnmappableCharacter('é'))));
        assert_eq!(dispatcher.state(), DispatchState::Idle);
    }

    #[test]
    fn test_cancel_current_stops_job() {
        let (backend, _tracker, dispatcher) = setup(Point::ORIGIN);
        let mut script = Script::new();
        script
            .then(Duration::ZERO, InputEvent::key_down(VirtualKeyCode::Shift))
            .then(Duration::from_secs(5), InputEvent::key_up(VirtualKeyCode::Shift));
        let handle = dispatcher.submit(script).unwrap();

        while backend.events().is_empty() {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(dispatcher.cancel_current());

        let outcome = handle.wait().unwrap();
        assert_eq!(outcome, Outcome::Cancelled { steps: 1 });
        assert_eq!(dispatcher.state(), DispatchState::Cancelled);
        // Held key released on the way out
        assert_eq!(
            backend.events(),
            vec![
                InputEvent::key_down(VirtualKeyCode::Shift),
                InputEvent::key_up(VirtualKeyCode::Shift),
            ]
        );
        assert!(!dispatcher.cancel_current());
    }

    #[test]
    fn test_failure_keeps_last_committed_point() {
        let (backend, tracker, dispatcher) = setup(Point::ORIGIN);
        let (script, path) = path_script(
            Point::ORIGIN,
            Point::new(150.0, 150.0),
            Duration::from_millis(40),
        );
        backend.fail_moves_from(5, BackendError::PermissionDenied);

        let outcome = dispatcher.submit(script).unwrap().wait().unwrap();
        assert_eq!(
            outcome,
            Outcome::Failed {
                steps: 5,
                error: BackendError::PermissionDenied
            }
        );
        assert_eq!(dispatcher.state(), DispatchState::Failed);
        assert_eq!(tracker.current(), path.samples()[4].position);
    }

    #[test]
    fn test_unreachable_offset_waits_for_cancel() {
        let (backend, tracker, dispatcher) = setup(Point::ORIGIN);
        let mut script = Script::new();
        script.click(MouseButton::Left, Duration::MAX);
        let handle = dispatcher.submit(script).unwrap();

        while backend.events().is_empty() {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(dispatcher.is_running());
        handle.cancel();

        assert_eq!(handle.wait().unwrap(), Outcome::Cancelled { steps: 1 });
        assert_eq!(dispatcher.state(), DispatchState::Cancelled);
        assert_eq!(
            backend.events(),
            vec![
                InputEvent::button_down(MouseButton::Left),
                InputEvent::button_up(MouseButton::Left),
            ]
        );

        // Still accepting work afterwards
        let (next, path) = path_script(
            tracker.current(),
            Point::new(40.0, 0.0),
            Duration::from_millis(10),
        );
        let outcome = dispatcher.submit(next).unwrap().wait().unwrap();
        assert_eq!(outcome, Outcome::Completed { steps: path.len() });
    }

    #[test]
    fn test_drop_cancels_running_job() {
        let (_backend, _tracker, dispatcher) = setup(Point::ORIGIN);
        let mut script = Script::new();
        script.then(Duration::from_secs(30), InputEvent::key_down(VirtualKeyCode::A));
        let handle = dispatcher.submit(script).unwrap();

        let started = Instant::now();
        drop(dispatcher);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(handle.wait().unwrap(), Outcome::Cancelled { steps: 0 });
    }
}
