use crate::config::SceneConfig;
use crate::elements::{GridFrame, NexusFrame, OrbFrame};
use glam::Vec2;
use nexus_common::LogicalSize;
use nexus_render::{Canvas2d, Paint, Path, Rect, Stroke};

/// The animated background.
///
/// Holds only configuration; every frame is computed from the frame counter
/// and the surface size passed to [`Scene::render`].
#[derive(Debug, Clone, Default)]
pub struct Scene {
    config: SceneConfig,
}

impl Scene {
    pub fn new(config: SceneConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Draw frame `t` onto `canvas`, which spans `size` logical units.
    pub fn render<C: Canvas2d + ?Sized>(&self, canvas: &mut C, t: u64, size: LogicalSize) {
        if size.is_empty() {
            return;
        }
        let _span = tracing::trace_span!("scene_render", t).entered();

        // Translucent on purpose: the previous frame shows through as a trail.
        canvas.fill_rect(Rect::from_size(size), &Paint::Solid(self.config.background));

        self.draw_grid(canvas, t, size);

        let orbs = &self.config.orbs;
        for i in 0..orbs.count {
            let orb = OrbFrame::at(orbs, t, size, i);
            if orb.radius > 0.0 {
                canvas.fill_path(
                    &Path::circle(orb.center, orb.radius),
                    &Paint::Radial(orb.gradient(orbs)),
                );
            }
        }

        let nexus = NexusFrame::at(&self.config.nexus, t, size);
        if nexus.radius > 0.0 {
            canvas.fill_path(
                &Path::circle(nexus.center, nexus.radius),
                &Paint::Radial(nexus.gradient(&self.config.nexus)),
            );
        }
    }

    fn draw_grid<C: Canvas2d + ?Sized>(&self, canvas: &mut C, t: u64, size: LogicalSize) {
        let grid = &self.config.grid;
        if grid.line_width <= 0.0 || grid.line_color.a <= 0.0 {
            return;
        }
        let stroke = Stroke {
            color: grid.line_color,
            width: grid.line_width,
        };
        let frame = GridFrame::at(grid, t, size);
        let (w, h) = (size.width as f32, size.height as f32);

        // One stroke per line so crossings double up, as two overlapping
        // translucent strokes would.
        for &x in &frame.columns {
            canvas.stroke_path(&Path::line(Vec2::new(x, 0.0), Vec2::new(x, h)), &stroke);
        }
        for &y in &frame.rows {
            canvas.stroke_path(&Path::line(Vec2::new(0.0, y), Vec2::new(w, y)), &stroke);
        }
    }
}
