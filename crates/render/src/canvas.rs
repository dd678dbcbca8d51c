use glam::Vec2;
use nexus_common::{LogicalSize, Rgba};
use serde::Serialize;
use std::f32::consts::TAU;

/// Axis-aligned rectangle in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// Rectangle covering a whole surface from the origin.
    pub fn from_size(size: LogicalSize) -> Self {
        Self::new(0.0, 0.0, size.width as f32, size.height as f32)
    }

    pub fn max(&self) -> Vec2 {
        self.origin + self.size
    }
}

/// A color at a normalized distance along a gradient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Rgba,
}

/// Circular gradient centered on `center`, running from offset 0 at the
/// center to offset 1 at `radius`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadialGradient {
    pub center: Vec2,
    pub radius: f32,
    stops: Vec<ColorStop>,
}

impl RadialGradient {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self {
            center,
            radius,
            stops: Vec::new(),
        }
    }

    /// Add a color stop. Offsets are clamped to `[0, 1]`; stops stay sorted,
    /// and a stop at an existing offset lands after it.
    pub fn with_stop(mut self, offset: f32, color: Rgba) -> Self {
        let offset = offset.clamp(0.0, 1.0);
        let at = self.stops.partition_point(|s| s.offset <= offset);
        self.stops.insert(at, ColorStop { offset, color });
        self
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Color at `distance` logical units from the center.
    pub fn color_at(&self, distance: f32) -> Rgba {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return Rgba::TRANSPARENT;
        };
        let t = if self.radius > 0.0 {
            (distance / self.radius).clamp(0.0, 1.0)
        } else {
            1.0
        };
        if t <= first.offset {
            return first.color;
        }
        if t >= last.offset {
            return last.color;
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.offset {
                let span = b.offset - a.offset;
                if span <= f32::EPSILON {
                    return b.color;
                }
                return a.color.lerp(b.color, (t - a.offset) / span);
            }
        }
        last.color
    }
}

/// How a filled area is colored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Paint {
    Solid(Rgba),
    Radial(RadialGradient),
}

impl From<Rgba> for Paint {
    fn from(color: Rgba) -> Self {
        Paint::Solid(color)
    }
}

impl From<RadialGradient> for Paint {
    fn from(gradient: RadialGradient) -> Self {
        Paint::Radial(gradient)
    }
}

/// Line style for stroked paths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f32,
}

/// One path command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PathSegment {
    MoveTo(Vec2),
    LineTo(Vec2),
    /// Clockwise (in y-down space) arc from `start` to `end` radians.
    Arc {
        center: Vec2,
        radius: f32,
        start: f32,
        end: f32,
    },
    Close,
}

/// A sequence of subpaths built from move/line/arc/close commands.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Path {
    segments: Vec<PathSegment>,
}

/// A flattened subpath.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyline {
    pub points: Vec<Vec2>,
    pub closed: bool,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(mut self, p: Vec2) -> Self {
        self.segments.push(PathSegment::MoveTo(p));
        self
    }

    pub fn line_to(mut self, p: Vec2) -> Self {
        self.segments.push(PathSegment::LineTo(p));
        self
    }

    pub fn arc(mut self, center: Vec2, radius: f32, start: f32, end: f32) -> Self {
        self.segments.push(PathSegment::Arc {
            center,
            radius: radius.max(0.0),
            start,
            end,
        });
        self
    }

    pub fn close(mut self) -> Self {
        self.segments.push(PathSegment::Close);
        self
    }

    /// Single straight line.
    pub fn line(from: Vec2, to: Vec2) -> Self {
        Self::new().move_to(from).line_to(to)
    }

    /// Full circle as one closed arc.
    pub fn circle(center: Vec2, radius: f32) -> Self {
        Self::new().arc(center, radius, 0.0, TAU).close()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Flatten into polylines; arcs are subdivided so that no chord strays
    /// more than `tolerance` units from the true curve.
    pub fn flatten(&self, tolerance: f32) -> Vec<Polyline> {
        let mut out = Vec::new();
        let mut current = Polyline::default();

        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo(p) => {
                    if current.points.len() > 1 {
                        out.push(std::mem::take(&mut current));
                    }
                    current = Polyline {
                        points: vec![p],
                        closed: false,
                    };
                }
                PathSegment::LineTo(p) => current.points.push(p),
                PathSegment::Arc {
                    center,
                    radius,
                    start,
                    end,
                } => {
                    let sweep = (end - start).clamp(-TAU, TAU);
                    let steps = arc_steps(radius, sweep, tolerance);
                    for i in 0..=steps {
                        let angle = start + sweep * (i as f32 / steps as f32);
                        let p = center + Vec2::new(angle.cos(), angle.sin()) * radius;
                        if current.points.last() != Some(&p) {
                            current.points.push(p);
                        }
                    }
                }
                PathSegment::Close => {
                    if current.points.len() > 1 {
                        current.closed = true;
                        let start = current.points[0];
                        out.push(std::mem::take(&mut current));
                        current.points.push(start);
                    }
                }
            }
        }
        if current.points.len() > 1 {
            out.push(current);
        }
        out
    }
}

fn arc_steps(radius: f32, sweep: f32, tolerance: f32) -> u32 {
    let tolerance = tolerance.max(1e-3);
    if radius <= tolerance {
        return 4;
    }
    let step = 2.0 * (1.0 - tolerance / radius).acos();
    ((sweep.abs() / step).ceil() as u32).clamp(4, 512)
}

/// Immediate-mode 2D drawing context.
///
/// Coordinates are logical units; the current scale maps them to the
/// backing buffer.
pub trait Canvas2d {
    /// Replace the current transform with a uniform or non-uniform scale.
    fn set_scale(&mut self, sx: f32, sy: f32);

    fn fill_rect(&mut self, rect: Rect, paint: &Paint);

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke);

    /// Fill a path. Backends are only required to handle convex subpaths.
    fn fill_path(&mut self, path: &Path, paint: &Paint);
}
