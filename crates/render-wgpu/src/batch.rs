use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use nexus_render::{Canvas2d, Paint, Path, Polyline, Rect, Stroke};

/// Most gradient stops a single paint can carry on the GPU.
pub const MAX_STOPS: usize = 8;

/// Flattening tolerance in physical pixels.
const TOLERANCE_PX: f32 = 0.25;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PaintVertex {
    /// Physical pixel coordinates, origin top-left.
    pub position: [f32; 2],
    pub paint: u32,
}

/// One paint as laid out in the shader's storage buffer.
///
/// A solid color is a one-stop gradient.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GpuPaint {
    /// Gradient center, logical units.
    pub center: [f32; 2],
    /// Maps physical fragment coordinates back to logical units.
    pub inv_scale: [f32; 2],
    pub radius: f32,
    pub stop_count: u32,
    pub _pad: [u32; 2],
    pub offsets: [[f32; 4]; MAX_STOPS / 4],
    pub colors: [[f32; 4]; MAX_STOPS],
}

impl GpuPaint {
    pub fn offset(&self, i: usize) -> f32 {
        self.offsets[i / 4][i % 4]
    }
}

/// CPU-side tessellation of one frame's canvas calls.
#[derive(Debug)]
pub struct Batch {
    scale: Vec2,
    vertices: Vec<PaintVertex>,
    paints: Vec<GpuPaint>,
}

impl Default for Batch {
    fn default() -> Self {
        Self {
            scale: Vec2::ONE,
            vertices: Vec::new(),
            paints: Vec::new(),
        }
    }
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn vertices(&self) -> &[PaintVertex] {
        &self.vertices
    }

    pub fn paints(&self) -> &[GpuPaint] {
        &self.paints
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Drop the geometry but keep the transform and allocations.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.paints.clear();
    }

    fn tolerance(&self) -> f32 {
        TOLERANCE_PX / self.scale.max_element().max(f32::EPSILON)
    }

    fn push_paint(&mut self, paint: &Paint) -> u32 {
        let inv = Vec2::ONE / self.scale.max(Vec2::splat(f32::EPSILON));
        let mut gpu = GpuPaint {
            inv_scale: inv.to_array(),
            ..GpuPaint::zeroed()
        };
        match paint {
            Paint::Solid(color) => {
                gpu.radius = 1.0;
                gpu.stop_count = 1;
                gpu.colors[0] = color.to_array();
            }
            Paint::Radial(gradient) => {
                let stops = gradient.stops();
                if stops.len() > MAX_STOPS {
                    tracing::warn!(
                        stops = stops.len(),
                        max = MAX_STOPS,
                        "gradient has too many stops, extra stops dropped"
                    );
                }
                gpu.center = gradient.center.to_array();
                gpu.radius = gradient.radius;
                gpu.stop_count = stops.len().min(MAX_STOPS) as u32;
                for (i, stop) in stops.iter().take(MAX_STOPS).enumerate() {
                    gpu.offsets[i / 4][i % 4] = stop.offset;
                    gpu.colors[i] = stop.color.to_array();
                }
            }
        }
        self.paints.push(gpu);
        (self.paints.len() - 1) as u32
    }

    fn push_triangle(&mut self, a: Vec2, b: Vec2, c: Vec2, paint: u32) {
        for p in [a, b, c] {
            self.vertices.push(PaintVertex {
                position: (p * self.scale).to_array(),
                paint,
            });
        }
    }

    fn push_quad(&mut self, corners: [Vec2; 4], paint: u32) {
        let [a, b, c, d] = corners;
        self.push_triangle(a, b, c, paint);
        self.push_triangle(c, d, a, paint);
    }

    fn fill_polyline(&mut self, polyline: &Polyline, paint: u32) {
        let points = &polyline.points;
        if points.len() < 3 {
            return;
        }
        for pair in points[1..].windows(2) {
            self.push_triangle(points[0], pair[0], pair[1], paint);
        }
    }

    fn stroke_segment(&mut self, a: Vec2, b: Vec2, half_width: f32, paint: u32) {
        let dir = b - a;
        let Some(unit) = dir.try_normalize() else {
            return;
        };
        let n = unit.perp() * half_width;
        self.push_quad([a + n, b + n, b - n, a - n], paint);
    }
}

impl Canvas2d for Batch {
    fn set_scale(&mut self, sx: f32, sy: f32) {
        self.scale = Vec2::new(sx, sy);
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        if rect.size.x == 0.0 || rect.size.y == 0.0 {
            return;
        }
        let paint = self.push_paint(paint);
        let (min, max) = (rect.origin, rect.max());
        self.push_quad(
            [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)],
            paint,
        );
    }

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke) {
        if stroke.width <= 0.0 || path.is_empty() {
            return;
        }
        let polylines = path.flatten(self.tolerance());
        if polylines.is_empty() {
            return;
        }
        let paint = self.push_paint(&Paint::Solid(stroke.color));
        let half = stroke.width * 0.5;
        for polyline in &polylines {
            for pair in polyline.points.windows(2) {
                self.stroke_segment(pair[0], pair[1], half, paint);
            }
            if polyline.closed {
                if let (Some(&last), Some(&first)) =
                    (polyline.points.last(), polyline.points.first())
                {
                    self.stroke_segment(last, first, half, paint);
                }
            }
        }
    }

    fn fill_path(&mut self, path: &Path, paint: &Paint) {
        let polylines = path.flatten(self.tolerance());
        if polylines.iter().all(|p| p.points.len() < 3) {
            return;
        }
        let paint = self.push_paint(paint);
        for polyline in &polylines {
            self.fill_polyline(polyline, paint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_common::Rgba;
    use nexus_render::RadialGradient;

    const RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);

    #[test]
    fn gpu_paint_matches_shader_layout() {
        assert_eq!(std::mem::size_of::<GpuPaint>(), 192);
        assert_eq!(std::mem::size_of::<PaintVertex>(), 12);
    }

    #[test]
    fn fill_rect_is_two_scaled_triangles() {
        let mut batch = Batch::new();
        batch.set_scale(2.0, 2.0);
        batch.fill_rect(Rect::new(0.0, 0.0, 100.0, 50.0), &RED.into());

        assert_eq!(batch.vertices().len(), 6);
        assert_eq!(batch.paints().len(), 1);
        let max_x = batch
            .vertices()
            .iter()
            .map(|v| v.position[0])
            .fold(f32::MIN, f32::max);
        let max_y = batch
            .vertices()
            .iter()
            .map(|v| v.position[1])
            .fold(f32::MIN, f32::max);
        assert_eq!((max_x, max_y), (200.0, 100.0));
    }

    #[test]
    fn solid_paint_is_single_stop() {
        let mut batch = Batch::new();
        batch.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), &RED.into());
        let paint = batch.paints()[0];
        assert_eq!(paint.stop_count, 1);
        assert_eq!(paint.colors[0], [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn gradient_keeps_logical_units() {
        let mut batch = Batch::new();
        batch.set_scale(2.0, 2.0);
        let gradient = RadialGradient::new(Vec2::new(10.0, 20.0), 5.0)
            .with_stop(0.0, RED)
            .with_stop(0.7, RED.with_alpha(0.5))
            .with_stop(1.0, RED.with_alpha(0.0));
        batch.fill_path(&Path::circle(Vec2::new(10.0, 20.0), 5.0), &gradient.into());

        let paint = batch.paints()[0];
        assert_eq!(paint.center, [10.0, 20.0]);
        assert_eq!(paint.radius, 5.0);
        assert_eq!(paint.inv_scale, [0.5, 0.5]);
        assert_eq!(paint.stop_count, 3);
        assert_eq!(paint.offset(1), 0.7);
        assert_eq!(paint.colors[2][3], 0.0);
    }

    #[test]
    fn circle_fill_covers_its_radius() {
        let mut batch = Batch::new();
        let center = Vec2::new(50.0, 50.0);
        batch.fill_path(&Path::circle(center, 20.0), &RED.into());

        assert!(batch.vertices().len() >= 3 * 8);
        assert_eq!(batch.vertices().len() % 3, 0);
        for v in batch.vertices() {
            let d = Vec2::from(v.position).distance(center);
            assert!(d <= 20.0 + 1e-3);
        }
    }

    #[test]
    fn stroke_line_becomes_quad_of_line_width() {
        let mut batch = Batch::new();
        batch.stroke_path(
            &Path::line(Vec2::new(10.0, 0.0), Vec2::new(10.0, 100.0)),
            &Stroke {
                color: RED,
                width: 1.0,
            },
        );
        assert_eq!(batch.vertices().len(), 6);
        let xs: Vec<f32> = batch.vertices().iter().map(|v| v.position[0]).collect();
        assert!(xs.iter().all(|&x| x == 9.5 || x == 10.5));
    }

    #[test]
    fn degenerate_geometry_is_skipped() {
        let mut batch = Batch::new();
        batch.stroke_path(
            &Path::line(Vec2::ONE, Vec2::ONE),
            &Stroke {
                color: RED,
                width: 1.0,
            },
        );
        batch.fill_rect(Rect::new(0.0, 0.0, 0.0, 10.0), &RED.into());
        batch.fill_path(&Path::line(Vec2::ZERO, Vec2::ONE), &RED.into());
        assert!(batch.is_empty());
    }

    #[test]
    fn excess_stops_are_truncated() {
        let mut gradient = RadialGradient::new(Vec2::ZERO, 10.0);
        for i in 0..12 {
            gradient = gradient.with_stop(i as f32 / 11.0, RED);
        }
        let mut batch = Batch::new();
        batch.fill_path(&Path::circle(Vec2::ZERO, 10.0), &gradient.into());
        assert_eq!(batch.paints()[0].stop_count, MAX_STOPS as u32);
    }

    #[test]
    fn clear_keeps_transform() {
        let mut batch = Batch::new();
        batch.set_scale(3.0, 3.0);
        batch.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), &RED.into());
        batch.clear();
        assert!(batch.is_empty());
        assert!(batch.paints().is_empty());
        assert_eq!(batch.scale(), Vec2::splat(3.0));
    }
}
