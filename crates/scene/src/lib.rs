//! Scene Model: the animated background as pure functions of a frame counter.
//!
//! # Invariants
//! - Every element is a function of `(t, width, height, index)` only; the
//!   scene holds configuration, never animation state.
//! - Rendering never fails and never draws into a surface with no area.
//! - Draw order is fixed: background, grid, orbs, nexus.

mod config;
mod elements;
mod scene;

pub use config::{
    ConfigError, GridConfig, MAX_ORBS, MIN_CELL_SIZE, NexusConfig, NexusStop, OrbConfig,
    SceneConfig,
};
pub use elements::{GridFrame, NexusFrame, OrbFrame};
pub use scene::Scene;

pub fn crate_info() -> &'static str {
    "nexus-scene v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("scene"));
    }
}
