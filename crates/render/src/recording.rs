use crate::canvas::{Canvas2d, Paint, Path, Rect, Stroke};
use crate::surface::Surface;
use nexus_common::{LogicalSize, PhysicalSize};
use serde::Serialize;
use std::fmt;

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    SetScale { sx: f32, sy: f32 },
    FillRect { rect: Rect, paint: Paint },
    StrokePath { path: Path, stroke: Stroke },
    FillPath { path: Path, paint: Paint },
}

impl fmt::Display for DrawCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawCommand::SetScale { sx, sy } => write!(f, "set_scale({sx:.2}, {sy:.2})"),
            DrawCommand::FillRect { rect, paint } => write!(
                f,
                "fill_rect(({:.1}, {:.1}) {:.1}x{:.1}) {}",
                rect.origin.x,
                rect.origin.y,
                rect.size.x,
                rect.size.y,
                PaintLabel(paint)
            ),
            DrawCommand::StrokePath { path, stroke } => write!(
                f,
                "stroke_path({} segments) width={:.1} alpha={:.2}",
                path.segments().len(),
                stroke.width,
                stroke.color.a
            ),
            DrawCommand::FillPath { path, paint } => write!(
                f,
                "fill_path({} segments) {}",
                path.segments().len(),
                PaintLabel(paint)
            ),
        }
    }
}

struct PaintLabel<'a>(&'a Paint);

impl fmt::Display for PaintLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Paint::Solid(c) => write!(
                f,
                "solid rgba({:.2}, {:.2}, {:.2}, {:.2})",
                c.r, c.g, c.b, c.a
            ),
            Paint::Radial(g) => write!(
                f,
                "radial center=({:.1}, {:.1}) r={:.1} stops={}",
                g.center.x,
                g.center.y,
                g.radius,
                g.stops().len()
            ),
        }
    }
}

/// Canvas that records calls instead of rasterizing them.
///
/// Used for headless runs and as the test double for surfaces.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl Canvas2d for RecordingCanvas {
    fn set_scale(&mut self, sx: f32, sy: f32) {
        self.commands.push(DrawCommand::SetScale { sx, sy });
    }

    fn fill_rect(&mut self, rect: Rect, paint: &Paint) {
        self.commands.push(DrawCommand::FillRect {
            rect,
            paint: paint.clone(),
        });
    }

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke) {
        self.commands.push(DrawCommand::StrokePath {
            path: path.clone(),
            stroke: *stroke,
        });
    }

    fn fill_path(&mut self, path: &Path, paint: &Paint) {
        self.commands.push(DrawCommand::FillPath {
            path: path.clone(),
            paint: paint.clone(),
        });
    }
}

/// In-memory surface backed by a [`RecordingCanvas`].
///
/// The host drives it by changing its box size and scale factor; every
/// [`Surface::present`] moves the recorded commands into `last_frame`.
#[derive(Debug)]
pub struct RecordingSurface {
    logical: LogicalSize,
    scale_factor: f64,
    buffer: PhysicalSize,
    canvas: RecordingCanvas,
    last_frame: Vec<DrawCommand>,
    frames_presented: u64,
    buffer_resizes: u64,
}

impl RecordingSurface {
    pub fn new(logical: LogicalSize, scale_factor: f64) -> Self {
        Self {
            logical,
            scale_factor,
            buffer: PhysicalSize::default(),
            canvas: RecordingCanvas::new(),
            last_frame: Vec::new(),
            frames_presented: 0,
            buffer_resizes: 0,
        }
    }

    /// Change the on-screen box size, as a host layout pass would.
    pub fn resize(&mut self, logical: LogicalSize) {
        self.logical = logical;
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor;
    }

    /// Commands of the most recently presented frame.
    pub fn last_frame(&self) -> &[DrawCommand] {
        &self.last_frame
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// How many times the backing buffer was (re)allocated.
    pub fn buffer_resizes(&self) -> u64 {
        self.buffer_resizes
    }
}

impl Surface for RecordingSurface {
    type Canvas = RecordingCanvas;

    fn logical_size(&self) -> LogicalSize {
        self.logical
    }

    fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    fn buffer_size(&self) -> PhysicalSize {
        self.buffer
    }

    fn set_buffer_size(&mut self, size: PhysicalSize) {
        self.buffer = size;
        self.buffer_resizes += 1;
    }

    fn canvas(&mut self) -> &mut RecordingCanvas {
        &mut self.canvas
    }

    fn present(&mut self) {
        self.last_frame = self.canvas.take_commands();
        self.frames_presented += 1;
    }
}
