use crate::config::{GridConfig, NexusConfig, OrbConfig};
use glam::Vec2;
use nexus_common::{LogicalSize, Rgba};
use nexus_render::RadialGradient;

/// Grid lines for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GridFrame {
    /// Scroll offset in `[0, cell_size)` along each axis.
    pub offset: [f64; 2],
    /// x positions of the vertical lines.
    pub columns: Vec<f32>,
    /// y positions of the horizontal lines.
    pub rows: Vec<f32>,
}

impl GridFrame {
    pub fn at(config: &GridConfig, t: u64, size: LogicalSize) -> Self {
        let offset = Self::offset(config, t);
        let cell = config.cell_size;
        Self {
            offset,
            columns: line_positions(offset[0], cell, size.width),
            rows: line_positions(offset[1], cell, size.height),
        }
    }

    /// Scroll offset at frame `t`: `(t * speed) mod cell_size` per axis.
    pub fn offset(config: &GridConfig, t: u64) -> [f64; 2] {
        let t = t as f64;
        [
            wrap(t * config.scroll[0], config.cell_size),
            wrap(t * config.scroll[1], config.cell_size),
        ]
    }
}

/// Reduce a scroll distance into `[0, cell)`.
pub(crate) fn wrap(distance: f64, cell: f64) -> f64 {
    let r = distance.rem_euclid(cell);
    // rem_euclid can round up to exactly `cell` for tiny negative inputs.
    if r >= cell { 0.0 } else { r }
}

/// Lines start one cell before the edge and run one cell past the far edge
/// so the wrap from `cell - ε` back to `0` never shows a seam.
fn line_positions(offset: f64, cell: f64, extent: f64) -> Vec<f32> {
    let mut out = Vec::new();
    let mut p = offset - cell;
    while p < extent + cell {
        out.push(p as f32);
        p += cell;
    }
    out
}

/// One orb for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbFrame {
    pub center: Vec2,
    pub radius: f32,
    pub hue: f32,
    /// Horizontal anchor the orb swings around.
    pub anchor_x: f32,
}

impl OrbFrame {
    pub fn at(config: &OrbConfig, t: u64, size: LogicalSize, index: usize) -> Self {
        let t = t as f64;
        let i = index as f64;
        let anchor_x = size.width * config.anchor[0];
        let anchor_y = size.height * config.anchor[1];

        let x = anchor_x
            + (t * config.frequency[0] + i * config.phase_step[0]).sin()
                * size.width
                * config.amplitude[0];
        let y = anchor_y
            + (t * config.frequency[1] + i * config.phase_step[1]).cos()
                * size.height
                * config.amplitude[1];
        let radius = config.radius_base
            + (t * config.radius_frequency + i).sin() * config.radius_amplitude;

        Self {
            center: Vec2::new(x as f32, y as f32),
            radius: radius.max(0.0) as f32,
            hue: config.hue_base + index as f32 * config.hue_step,
            anchor_x: anchor_x as f32,
        }
    }

    /// Soft glow: configured alpha at the center fading to nothing at the rim.
    pub fn gradient(&self, config: &OrbConfig) -> RadialGradient {
        let color = Rgba::from_hsla(self.hue, config.saturation, config.lightness, config.alpha);
        RadialGradient::new(self.center, self.radius)
            .with_stop(0.0, color)
            .with_stop(1.0, color.with_alpha(0.0))
    }
}

/// The central glow for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NexusFrame {
    pub center: Vec2,
    pub radius: f32,
}

impl NexusFrame {
    pub fn at(config: &NexusConfig, t: u64, size: LogicalSize) -> Self {
        let radius =
            config.radius_base + (t as f64 * config.frequency).sin() * config.radius_amplitude;
        Self {
            center: Vec2::new((size.width * 0.5) as f32, (size.height * 0.5) as f32),
            radius: radius.max(0.0) as f32,
        }
    }

    pub fn gradient(&self, config: &NexusConfig) -> RadialGradient {
        config
            .stops
            .iter()
            .fold(RadialGradient::new(self.center, self.radius), |g, s| {
                g.with_stop(s.offset, s.color)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: LogicalSize = LogicalSize {
        width: 800.0,
        height: 450.0,
    };

    #[test]
    fn grid_offset_starts_at_zero() {
        assert_eq!(GridFrame::offset(&GridConfig::default(), 0), [0.0, 0.0]);
    }

    #[test]
    fn grid_offset_drifts_diagonally() {
        let offset = GridFrame::offset(&GridConfig::default(), 10);
        assert_eq!(offset[0], 5.0);
        assert!((offset[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn wrap_is_periodic_in_cell_size() {
        let cell = 50.0;
        for d in [0.0, 0.5, 12.25, 49.5, 50.0, 137.0, 1.0e6] {
            assert_eq!(wrap(d + cell, cell), wrap(d, cell));
            assert!((0.0..cell).contains(&wrap(d, cell)));
        }
    }

    #[test]
    fn grid_offset_repeats_after_one_cell_of_travel() {
        let config = GridConfig::default();
        // x travels one cell every 100 frames; exact in binary floating point.
        for t in [0, 1, 7, 99, 12_345] {
            let a = GridFrame::offset(&config, t);
            let b = GridFrame::offset(&config, t + 100);
            assert_eq!(a[0], b[0]);
        }
        // Both axes line up again after 500 frames (250 and 150 units).
        for t in [1, 3, 251, 9_999] {
            let a = GridFrame::offset(&config, t);
            let b = GridFrame::offset(&config, t + 500);
            assert_eq!(a[0], b[0]);
            assert!((a[1] - b[1]).abs() < 1e-9);
        }
    }

    #[test]
    fn grid_lines_overscan_one_cell() {
        let frame = GridFrame::at(&GridConfig::default(), 0, LogicalSize::new(100.0, 100.0));
        assert_eq!(frame.columns, vec![-50.0, 0.0, 50.0, 100.0]);
        assert_eq!(frame.rows, frame.columns);

        let frame = GridFrame::at(&GridConfig::default(), 20, LogicalSize::new(100.0, 100.0));
        assert_eq!(frame.columns, vec![-40.0, 10.0, 60.0, 110.0]);
    }

    #[test]
    fn orb_displacement_is_bounded() {
        let config = OrbConfig::default();
        for t in (0..20_000).step_by(37) {
            for i in 0..config.count {
                let orb = OrbFrame::at(&config, t, SIZE, i);
                let dx = (orb.center.x - orb.anchor_x).abs();
                assert!(dx <= (SIZE.width * 0.3) as f32 + 1e-3, "t={t} i={i} dx={dx}");
                assert!((10.0..=30.0).contains(&orb.radius), "radius {}", orb.radius);
            }
        }
    }

    #[test]
    fn orb_hues_step_by_sixty() {
        let config = OrbConfig::default();
        let hues: Vec<f32> = (0..5)
            .map(|i| OrbFrame::at(&config, 0, SIZE, i).hue)
            .collect();
        assert_eq!(hues, vec![180.0, 240.0, 300.0, 360.0, 420.0]);
    }

    #[test]
    fn orb_position_matches_formula() {
        let config = OrbConfig::default();
        let orb = OrbFrame::at(&config, 100, SIZE, 2);
        let x = 800.0 * 0.2 + (100.0f64 * 0.01 + 2.0).sin() * 800.0 * 0.3;
        let y = 450.0 * 0.3 + (100.0f64 * 0.008 + 4.0).cos() * 450.0 * 0.2;
        assert!((orb.center.x as f64 - x).abs() < 1e-3);
        assert!((orb.center.y as f64 - y).abs() < 1e-3);
    }

    #[test]
    fn orb_gradient_fades_to_transparent() {
        let config = OrbConfig::default();
        let orb = OrbFrame::at(&config, 0, SIZE, 0);
        let g = orb.gradient(&config);
        assert_eq!(g.stops().len(), 2);
        assert!((g.stops()[0].color.a - 0.8).abs() < 1e-6);
        assert_eq!(g.stops()[1].color.a, 0.0);
        assert_eq!(g.center, orb.center);
    }

    #[test]
    fn nexus_sits_at_center_and_pulses() {
        let config = NexusConfig::default();
        let a = NexusFrame::at(&config, 0, SIZE);
        assert_eq!(a.center, Vec2::new(400.0, 225.0));
        assert_eq!(a.radius, 40.0);

        for t in 0..1_000 {
            let n = NexusFrame::at(&config, t, SIZE);
            assert!((30.0..=50.0).contains(&n.radius));
        }
    }

    #[test]
    fn nexus_gradient_has_three_stops() {
        let config = NexusConfig::default();
        let g = NexusFrame::at(&config, 0, SIZE).gradient(&config);
        let offsets: Vec<f32> = g.stops().iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.0, 0.7, 1.0]);
        assert_eq!(g.stops()[2].color.a, 0.0);
    }
}
