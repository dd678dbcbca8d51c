//! Rendering Adapter: renderer-agnostic 2D drawing interface and surface management.
//!
//! # Invariants
//! - All drawing commands are issued in logical units; the surface's transform
//!   maps them onto physical pixels.
//! - A surface's physical buffer is `round(logical box × scale factor)` after
//!   every successful [`configure`].
//! - Configuring a surface that has not been laid out yet is a no-op.
//!
//! The [`Canvas2d`] trait is the only thing scene code talks to. The
//! [`RecordingCanvas`] backend records commands instead of rasterizing them,
//! which is what headless runs and tests use; GPU backends implement the same
//! trait without changing consumers.

mod canvas;
mod recording;
mod surface;

pub use canvas::{Canvas2d, ColorStop, Paint, Path, PathSegment, Polyline, RadialGradient, Rect, Stroke};
pub use recording::{DrawCommand, RecordingCanvas, RecordingSurface};
pub use surface::{Surface, SurfaceMetrics, configure, drawable_size};

pub fn crate_info() -> &'static str {
    "nexus-render v0.1.0"
}
