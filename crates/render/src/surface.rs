use crate::canvas::Canvas2d;
use nexus_common::{LogicalSize, PhysicalSize};

/// A host-owned drawable surface: an on-screen box with a backing pixel
/// buffer and a 2D drawing context.
pub trait Surface {
    type Canvas: Canvas2d;

    /// Current on-screen box size in logical units.
    fn logical_size(&self) -> LogicalSize;

    /// Physical pixels per logical unit on the current display.
    fn scale_factor(&self) -> f64;

    /// Current size of the backing pixel buffer.
    fn buffer_size(&self) -> PhysicalSize;

    /// Resize the backing buffer. Resizing discards its contents.
    fn set_buffer_size(&mut self, size: PhysicalSize);

    fn canvas(&mut self) -> &mut Self::Canvas;

    /// Flush everything drawn since the last call to the screen.
    fn present(&mut self) {}
}

/// Result of a successful [`configure`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMetrics {
    pub logical: LogicalSize,
    pub physical: PhysicalSize,
    pub scale_factor: f64,
}

/// Size the surface's buffer to its box at the current scale factor and set
/// the drawing transform so callers can keep using logical units.
///
/// Returns `None` without touching the surface when the box has no area yet.
pub fn configure<S: Surface + ?Sized>(surface: &mut S) -> Option<SurfaceMetrics> {
    let reported = surface.scale_factor();
    let scale_factor = usable_scale(reported);
    if scale_factor != reported {
        tracing::warn!(reported, "invalid scale factor, assuming 1.0");
    }

    let logical = surface.logical_size();
    if logical.is_empty() {
        tracing::debug!(
            width = logical.width,
            height = logical.height,
            "surface not laid out yet, skipping configure"
        );
        return None;
    }

    let physical = logical.to_physical(scale_factor);
    if physical.is_empty() {
        tracing::debug!(?physical, "surface rounds to zero pixels, skipping configure");
        return None;
    }

    surface.set_buffer_size(physical);
    surface
        .canvas()
        .set_scale(scale_factor as f32, scale_factor as f32);

    tracing::debug!(
        width = logical.width,
        height = logical.height,
        scale_factor,
        physical_width = physical.width,
        physical_height = physical.height,
        "surface configured"
    );

    Some(SurfaceMetrics {
        logical,
        physical,
        scale_factor,
    })
}

/// Logical extent of what the buffer was last configured for.
///
/// This is what a frame should be drawn at: it can lag the live box size
/// until the next configure, but it always matches the buffer.
pub fn drawable_size<S: Surface + ?Sized>(surface: &S) -> LogicalSize {
    surface
        .buffer_size()
        .to_logical(usable_scale(surface.scale_factor()))
}

fn usable_scale(scale_factor: f64) -> f64 {
    if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{DrawCommand, RecordingSurface};

    #[test]
    fn configure_scales_buffer_and_transform() {
        let mut surface = RecordingSurface::new(LogicalSize::new(100.0, 100.0), 2.0);
        let metrics = configure(&mut surface).unwrap();

        assert_eq!(metrics.physical, PhysicalSize::new(200, 200));
        assert_eq!(surface.buffer_size(), PhysicalSize::new(200, 200));
        assert_eq!(
            surface.canvas().commands(),
            &[DrawCommand::SetScale { sx: 2.0, sy: 2.0 }]
        );
        assert_eq!(drawable_size(&surface), LogicalSize::new(100.0, 100.0));
    }

    #[test]
    fn configure_tracks_every_resize() {
        let mut surface = RecordingSurface::new(LogicalSize::new(100.0, 100.0), 1.0);
        configure(&mut surface);
        assert_eq!(surface.buffer_size(), PhysicalSize::new(100, 100));

        surface.resize(LogicalSize::new(320.0, 180.0));
        surface.set_scale_factor(1.5);
        configure(&mut surface);
        assert_eq!(surface.buffer_size(), PhysicalSize::new(480, 270));
        assert_eq!(drawable_size(&surface), LogicalSize::new(320.0, 180.0));
    }

    #[test]
    fn zero_sized_surface_is_left_alone() {
        let mut surface = RecordingSurface::new(LogicalSize::new(0.0, 100.0), 2.0);
        assert!(configure(&mut surface).is_none());
        assert_eq!(surface.buffer_size(), PhysicalSize::default());
        assert!(surface.canvas().commands().is_empty());
    }

    #[test]
    fn invalid_scale_factor_falls_back_to_one() {
        let mut surface = RecordingSurface::new(LogicalSize::new(64.0, 32.0), 0.0);
        let metrics = configure(&mut surface).unwrap();
        assert_eq!(metrics.scale_factor, 1.0);
        assert_eq!(metrics.physical, PhysicalSize::new(64, 32));
        assert_eq!(drawable_size(&surface), LogicalSize::new(64.0, 32.0));
    }
}
