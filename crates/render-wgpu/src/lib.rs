//! wgpu backend for the 2D drawing interface.
//!
//! Canvas calls are tessellated on the CPU into a [`Batch`] of triangles that
//! each carry a paint index; the fragment shader evaluates solid colors and
//! radial gradients per pixel. Frames accumulate in an offscreen buffer sized
//! to the surface's physical pixels, which is then copied to the swapchain,
//! so translucent fills fade earlier frames instead of replacing them.
//!
//! # Invariants
//! - The offscreen buffer is only cleared when it is (re)allocated.
//! - Vertices are stored in physical pixels; gradients in logical units.
//! - Filled paths are treated as convex.

mod batch;
mod context;
mod gpu;
mod shaders;

pub use batch::{Batch, GpuPaint, MAX_STOPS, PaintVertex};
pub use context::{GpuContext, GpuError};
pub use gpu::Renderer2d;

pub fn crate_info() -> &'static str {
    "nexus-render-wgpu v0.1.0"
}
