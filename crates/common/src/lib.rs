//! Shared value types: surface sizes and colors.
//!
//! # Invariants
//! - Logical sizes are device-independent; physical sizes are whole pixels.
//! - A physical size is always derived from a logical size and a scale factor,
//!   never the other way round, except to recover the configured logical extent.

mod types;

pub use types::{LogicalSize, PhysicalSize, Rgba};

pub fn crate_info() -> &'static str {
    "nexus-common v0.1.0"
}
