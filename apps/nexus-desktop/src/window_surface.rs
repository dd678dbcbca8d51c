use nexus_common::{LogicalSize, PhysicalSize, Rgba};
use nexus_render::Surface;
use nexus_render_wgpu::{Batch, GpuContext, GpuError, Renderer2d};
use std::sync::Arc;
use winit::window::Window;

/// A native window as a drawing surface.
///
/// The window's inner area is the layout box; the wgpu frame buffer is the
/// physical backing store.
pub struct WindowSurface {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: Renderer2d,
    batch: Batch,
    buffer: PhysicalSize,
}

impl WindowSurface {
    pub fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let inner = window.inner_size();
        let buffer = PhysicalSize::new(inner.width, inner.height);
        let gpu = GpuContext::new(window.clone(), buffer)?;
        let renderer = Renderer2d::new(&gpu.device, gpu.format(), buffer);
        Ok(Self {
            window,
            gpu,
            renderer,
            batch: Batch::new(),
            buffer,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Color shown behind the translucent frame buffer.
    pub fn set_backdrop(&mut self, color: Rgba) {
        self.renderer.set_backdrop(color);
    }
}

impl Surface for WindowSurface {
    type Canvas = Batch;

    fn logical_size(&self) -> LogicalSize {
        let size = self
            .window
            .inner_size()
            .to_logical::<f64>(self.window.scale_factor());
        LogicalSize::new(size.width, size.height)
    }

    fn scale_factor(&self) -> f64 {
        self.window.scale_factor()
    }

    fn buffer_size(&self) -> PhysicalSize {
        self.buffer
    }

    fn set_buffer_size(&mut self, size: PhysicalSize) {
        self.buffer = size;
        self.gpu.resize(size);
        self.renderer.resize(&self.gpu.device, size);
    }

    fn canvas(&mut self) -> &mut Batch {
        &mut self.batch
    }

    fn present(&mut self) {
        self.renderer
            .draw(&self.gpu.device, &self.gpu.queue, &self.batch);
        self.batch.clear();

        // The frame buffer keeps this frame even if the swapchain image is
        // unavailable; it shows up with the next one.
        let Some(frame) = self.gpu.acquire() else {
            return;
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.renderer.blit(&self.gpu.device, &self.gpu.queue, &view);
        self.window.pre_present_notify();
        frame.present();
    }
}
