mod window_surface;

use anyhow::Result;
use clap::Parser;
use nexus_runtime::{BackgroundEngine, RefreshScheduler, ResizeNotifier};
use nexus_scene::{Scene, SceneConfig};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use window_surface::WindowSurface;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "nexus-desktop", about = "Animated nexus background in a window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Open the window without starting the animation (Space toggles it)
    #[arg(long)]
    start_inactive: bool,

    /// Stop animating while the window is unfocused or hidden
    #[arg(long)]
    pause_when_unfocused: bool,
}

struct NexusApp {
    scheduler: Rc<RefreshScheduler>,
    resize: Rc<ResizeNotifier>,
    engine: BackgroundEngine<WindowSurface>,
    surface: Option<Rc<RefCell<WindowSurface>>>,
    /// User toggle; the engine is active when this is on and the window is
    /// visible (or visibility is being ignored).
    enabled: bool,
    visible: bool,
    pause_when_unfocused: bool,
}

impl NexusApp {
    fn new(scene: Scene, enabled: bool, pause_when_unfocused: bool) -> Self {
        let scheduler = Rc::new(RefreshScheduler::new());
        let resize = Rc::new(ResizeNotifier::new());
        let engine = BackgroundEngine::new(scene, scheduler.clone(), resize.clone());
        Self {
            scheduler,
            resize,
            engine,
            surface: None,
            enabled,
            visible: true,
            pause_when_unfocused,
        }
    }

    fn sync_active(&mut self) {
        let active = self.enabled && (self.visible || !self.pause_when_unfocused);
        self.engine.set_active(active);
        self.request_redraw();
    }

    fn request_redraw(&self) {
        if let Some(surface) = &self.surface {
            surface.borrow().window().request_redraw();
        }
    }
}

impl ApplicationHandler for NexusApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.surface.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Nexus")
            .with_inner_size(LogicalSize::new(960.0, 540.0));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let surface = match WindowSurface::new(window) {
            Ok(mut surface) => {
                surface.set_backdrop(self.engine.scene().config().background);
                Rc::new(RefCell::new(surface))
            }
            Err(e) => {
                tracing::error!("failed to initialize GPU surface: {e}");
                event_loop.exit();
                return;
            }
        };

        self.engine.attach_surface(&surface);
        self.surface = Some(surface);
        self.sync_active();
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.engine.detach_surface();
        self.surface = None;
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.engine.teardown();
                self.surface = None;
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.resize.notify();
                self.request_redraw();
            }
            WindowEvent::Focused(focused) => {
                self.visible = focused;
                self.sync_active();
            }
            WindowEvent::Occluded(occluded) => {
                self.visible = !occluded;
                self.sync_active();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match key {
                KeyCode::Space => {
                    self.enabled = !self.enabled;
                    tracing::info!(enabled = self.enabled, "animation toggled");
                    self.sync_active();
                }
                KeyCode::Escape => {
                    self.engine.teardown();
                    self.surface = None;
                    event_loop.exit();
                }
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                // One display refresh: run every scheduled frame task.
                self.scheduler.on_refresh();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // Presenting with vsync paces these requests to the display rate.
        if self.scheduler.pending() > 0 {
            self.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };

    tracing::info!("nexus-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = NexusApp::new(
        Scene::new(config),
        !cli.start_inactive,
        cli.pause_when_unfocused,
    );
    event_loop.run_app(&mut app)?;

    Ok(())
}
