use crate::registry::{CallbackRegistry, Token};
use std::cell::Cell;

/// Handle for a repeating frame task.
///
/// Cancelling is idempotent and takes effect immediately, including for a
/// tick that is already queued in the current refresh.
#[derive(Debug, Clone)]
pub struct FrameHandle(Token);

impl FrameHandle {
    pub fn is_active(&self) -> bool {
        self.0.is_live()
    }

    pub fn cancel(&self) {
        self.0.cancel();
    }
}

/// Runs callbacks once per display refresh until they are stopped.
pub trait FrameScheduler {
    /// Schedule `callback` on every refresh, starting with the next one.
    fn start(&self, callback: Box<dyn FnMut()>) -> FrameHandle;

    /// Stop a task. Stopping twice, or stopping a finished task, is a no-op.
    fn stop(&self, handle: &FrameHandle);
}

/// Scheduler driven by the host's refresh signal.
///
/// The host calls [`RefreshScheduler::on_refresh`] once per vsync (for
/// example from a window's redraw event); each live task then runs exactly
/// once. There is never more than one pending tick per task.
#[derive(Default)]
pub struct RefreshScheduler {
    tasks: CallbackRegistry,
    refreshes: Cell<u64>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display refresh signal. Returns the number of tasks that ticked.
    pub fn on_refresh(&self) -> usize {
        self.refreshes.set(self.refreshes.get() + 1);
        let ran = self.tasks.dispatch();
        tracing::trace!(refresh = self.refreshes.get(), ran, "refresh dispatched");
        ran
    }

    /// Number of live tasks waiting for the next refresh.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Number of refresh signals received so far.
    pub fn refreshes(&self) -> u64 {
        self.refreshes.get()
    }
}

impl FrameScheduler for RefreshScheduler {
    fn start(&self, callback: Box<dyn FnMut()>) -> FrameHandle {
        FrameHandle(self.tasks.register(callback))
    }

    fn stop(&self, handle: &FrameHandle) {
        self.tasks.remove(&handle.0);
    }
}
