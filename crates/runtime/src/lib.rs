//! Runtime: frame scheduling, resize notification and the engine lifecycle.
//!
//! # Invariants
//! - Everything runs on one cooperative thread; no callback ever runs
//!   concurrently with another.
//! - A cancelled frame task or resize subscription never fires again, even if
//!   its invocation was already queued.
//! - The clock lives exactly as long as one activation and restarts at 0.
//! - No process-wide state: every engine owns its own clock and handles.

mod clock;
mod engine;
mod registry;
mod resize;
mod scheduler;

pub use clock::Clock;
pub use engine::{BackgroundEngine, EngineState};
pub use resize::{ResizeNotifier, Subscription};
pub use scheduler::{FrameHandle, FrameScheduler, RefreshScheduler};

pub fn crate_info() -> &'static str {
    "nexus-runtime v0.1.0"
}
