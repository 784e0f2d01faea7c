//! Job handles and outcomes

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use input_injector::BackendError;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::{DispatchError, DispatchResult};

/// Shared cancellation flag, checked by the worker before every step
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a job ended; `steps` counts events the backend accepted
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed { steps: usize },
    Cancelled { steps: usize },
    Failed { steps: usize, error: BackendError },
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed { .. })
    }

    pub fn steps(&self) -> usize {
        match *self {
            Outcome::Completed { steps }
            | Outcome::Cancelled { steps }
            | Outcome::Failed { steps, .. } => steps,
        }
    }

    /// `Ok(steps)` on completion, the backend error on failure
    pub fn into_result(self) -> DispatchResult<usize> {
        match self {
            Outcome::Completed { steps } | Outcome::Cancelled { steps } => Ok(steps),
            Outcome::Failed { error, .. } => Err(DispatchError::Backend(error)),
        }
    }
}

/// Handle to a submitted job
///
/// Dropping the handle does not cancel the job.
#[derive(Debug)]
pub struct MotionHandle {
    id: u64,
    cancel: CancelToken,
    rx: oneshot::Receiver<Outcome>,
}

impl MotionHandle {
    pub(crate) fn new(id: u64, cancel: CancelToken, rx: oneshot::Receiver<Outcome>) -> Self {
        Self { id, cancel, rx }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Request cancellation; takes effect before the next step
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Wait for the job to finish
    pub async fn outcome(self) -> DispatchResult<Outcome> {
        self.rx.await.map_err(|_| DispatchError::DispatcherStopped)
    }

    /// Blocking variant of [`MotionHandle::outcome`]
    ///
    /// Must not be called from inside an async runtime.
    pub fn wait(self) -> DispatchResult<Outcome> {
        self.rx
            .blocking_recv()
            .map_err(|_| DispatchError::DispatcherStopped)
    }

    /// Non-blocking poll; `None` while the job is still running
    pub fn try_outcome(&mut self) -> Option<DispatchResult<Outcome>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(Ok(outcome)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(DispatchError::DispatcherStopped)),
        }
    }
}
