use crate::clock::Clock;
use crate::resize::{ResizeNotifier, Subscription};
use crate::scheduler::{FrameHandle, FrameScheduler};
use nexus_render::{Surface, configure, drawable_size};
use nexus_scene::Scene;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Lifecycle state of a [`BackgroundEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
}

/// Resources that exist only while running.
struct Run {
    clock: Rc<Cell<Clock>>,
    frame: FrameHandle,
    resize: Subscription,
}

/// Drives a [`Scene`] onto a host-owned surface while an external "active"
/// signal is on.
///
/// The engine runs iff it is active and a live surface is attached. Entering
/// `Running` configures the surface, subscribes to resize events and starts a
/// frame task with a fresh clock; leaving it releases all three.
pub struct BackgroundEngine<S: Surface + 'static> {
    scene: Rc<Scene>,
    scheduler: Rc<dyn FrameScheduler>,
    resize: Rc<ResizeNotifier>,
    surface: Option<Weak<RefCell<S>>>,
    active: bool,
    run: Option<Run>,
}

impl<S: Surface + 'static> BackgroundEngine<S> {
    pub fn new(
        scene: Scene,
        scheduler: Rc<dyn FrameScheduler>,
        resize: Rc<ResizeNotifier>,
    ) -> Self {
        Self {
            scene: Rc::new(scene),
            scheduler,
            resize,
            surface: None,
            active: false,
            run: None,
        }
    }

    pub fn state(&self) -> EngineState {
        if self.run.is_some() {
            EngineState::Running
        } else {
            EngineState::Idle
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Frame counter of the current activation, `None` while idle.
    pub fn clock(&self) -> Option<u64> {
        self.run.as_ref().map(|r| r.clock.get().now())
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Point the engine at a surface. The engine only keeps a weak
    /// reference; the host stays the owner.
    pub fn attach_surface(&mut self, surface: &Rc<RefCell<S>>) {
        self.stop();
        self.surface = Some(Rc::downgrade(surface));
        self.sync();
    }

    pub fn detach_surface(&mut self) {
        self.stop();
        self.surface = None;
    }

    /// External on/off signal.
    pub fn set_active(&mut self, active: bool) {
        if self.active != active {
            tracing::debug!(active, "engine active signal changed");
        }
        self.active = active;
        self.sync();
    }

    /// Host view is going away: release everything.
    pub fn teardown(&mut self) {
        self.active = false;
        self.stop();
        self.surface = None;
    }

    fn live_surface(&self) -> Option<Rc<RefCell<S>>> {
        self.surface.as_ref().and_then(Weak::upgrade)
    }

    fn sync(&mut self) {
        match (self.active, self.run.is_some()) {
            (true, false) => self.start(),
            (false, true) => self.stop(),
            _ => {}
        }
    }

    fn start(&mut self) {
        let Some(surface) = self.live_surface() else {
            tracing::debug!("active but no surface attached, staying idle");
            return;
        };

        let weak = Rc::downgrade(&surface);
        reconfigure(&weak);

        let resize = self.resize.subscribe(Box::new({
            let weak = weak.clone();
            move || reconfigure(&weak)
        }));

        let clock = Rc::new(Cell::new(Clock::new()));
        let frame = self.scheduler.start(Box::new({
            let clock = clock.clone();
            let scene = self.scene.clone();
            move || tick(&weak, &clock, &scene)
        }));

        self.run = Some(Run {
            clock,
            frame,
            resize,
        });
        tracing::debug!("background engine running");
    }

    /// Safe to call in any state.
    fn stop(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };
        self.resize.unsubscribe(&run.resize);
        self.scheduler.stop(&run.frame);
        tracing::debug!(frames = run.clock.get().now(), "background engine stopped");
    }
}

impl<S: Surface + 'static> Drop for BackgroundEngine<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn reconfigure<S: Surface>(surface: &Weak<RefCell<S>>) {
    let Some(surface) = surface.upgrade() else {
        return;
    };
    match surface.try_borrow_mut() {
        Ok(mut surface) => {
            configure(&mut *surface);
        }
        Err(_) => tracing::warn!("surface busy, skipping configure"),
    }
}

/// Render the current frame, then advance the clock. A surface that is gone
/// or has no area yet gets neither.
fn tick<S: Surface>(surface: &Weak<RefCell<S>>, clock: &Cell<Clock>, scene: &Scene) {
    let Some(surface) = surface.upgrade() else {
        return;
    };
    let Ok(mut surface) = surface.try_borrow_mut() else {
        tracing::warn!("surface busy, skipping frame");
        return;
    };
    let size = drawable_size(&*surface);
    if size.is_empty() {
        tracing::trace!("surface not configured, skipping frame");
        return;
    }

    let mut c = clock.get();
    let _span = tracing::trace_span!("frame", t = c.now()).entered();
    scene.render(surface.canvas(), c.now(), size);
    surface.present();
    c.advance();
    clock.set(c);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::RefreshScheduler;
    use nexus_common::{LogicalSize, PhysicalSize};
    use nexus_render::{DrawCommand, Paint, Rect, RecordingSurface};

    struct Harness {
        scheduler: Rc<RefreshScheduler>,
        resize: Rc<ResizeNotifier>,
        surface: Rc<RefCell<RecordingSurface>>,
        engine: BackgroundEngine<RecordingSurface>,
    }

    fn harness(width: f64, height: f64, scale: f64) -> Harness {
        let scheduler = Rc::new(RefreshScheduler::new());
        let resize = Rc::new(ResizeNotifier::new());
        let surface = Rc::new(RefCell::new(RecordingSurface::new(
            LogicalSize::new(width, height),
            scale,
        )));
        let mut engine = BackgroundEngine::new(Scene::default(), scheduler.clone(), resize.clone());
        engine.attach_surface(&surface);
        Harness {
            scheduler,
            resize,
            surface,
            engine,
        }
    }

    impl Harness {
        fn refresh(&self, n: usize) {
            for _ in 0..n {
                self.scheduler.on_refresh();
            }
        }

        fn assert_fully_idle(&self) {
            assert_eq!(self.engine.state(), EngineState::Idle);
            assert_eq!(self.engine.clock(), None);
            assert_eq!(self.scheduler.pending(), 0);
            assert_eq!(self.resize.subscriber_count(), 0);
        }
    }

    #[test]
    fn attached_but_inactive_stays_idle() {
        let h = harness(100.0, 100.0, 1.0);
        h.assert_fully_idle();
        assert_eq!(h.surface.borrow().buffer_resizes(), 0);
    }

    #[test]
    fn clock_counts_rendered_frames() {
        let mut h = harness(100.0, 100.0, 1.0);
        h.engine.set_active(true);
        assert_eq!(h.engine.state(), EngineState::Running);
        assert_eq!(h.engine.clock(), Some(0));

        for expected in 1..=20 {
            h.refresh(1);
            assert_eq!(h.engine.clock(), Some(expected));
            assert_eq!(h.surface.borrow().frames_presented(), expected);
        }
    }

    #[test]
    fn activation_configures_for_scale_factor() {
        let mut h = harness(100.0, 100.0, 2.0);
        h.engine.set_active(true);
        assert_eq!(h.surface.borrow().buffer_size(), PhysicalSize::new(200, 200));

        h.refresh(1);
        let surface = h.surface.borrow();
        let frame = surface.last_frame();
        assert_eq!(frame[0], DrawCommand::SetScale { sx: 2.0, sy: 2.0 });
        match &frame[1] {
            DrawCommand::FillRect { rect, .. } => {
                assert_eq!(*rect, Rect::new(0.0, 0.0, 100.0, 100.0));
            }
            other => panic!("expected background, got {other:?}"),
        }
        match frame.last() {
            Some(DrawCommand::FillPath {
                paint: Paint::Radial(g),
                ..
            }) => assert_eq!((g.center.x, g.center.y), (50.0, 50.0)),
            other => panic!("expected nexus, got {other:?}"),
        }
    }

    #[test]
    fn reactivation_restarts_clock() {
        let mut h = harness(100.0, 100.0, 1.0);
        h.engine.set_active(true);
        h.refresh(50);
        assert_eq!(h.engine.clock(), Some(50));

        h.engine.set_active(false);
        h.assert_fully_idle();

        h.engine.set_active(true);
        assert_eq!(h.engine.clock(), Some(0));
        h.refresh(1);
        assert_eq!(h.engine.clock(), Some(1));
    }

    #[test]
    fn repeated_active_signal_does_not_restart() {
        let mut h = harness(100.0, 100.0, 1.0);
        h.engine.set_active(true);
        h.refresh(5);
        h.engine.set_active(true);
        assert_eq!(h.engine.clock(), Some(5));
        assert_eq!(h.scheduler.pending(), 1);
        assert_eq!(h.resize.subscriber_count(), 1);
    }

    #[test]
    fn double_stop_is_a_noop() {
        let mut h = harness(100.0, 100.0, 1.0);
        h.engine.set_active(true);
        h.refresh(3);

        h.engine.set_active(false);
        h.assert_fully_idle();
        h.engine.set_active(false);
        h.assert_fully_idle();
        h.engine.teardown();
        h.assert_fully_idle();
    }

    #[test]
    fn stop_without_start_is_a_noop() {
        let mut h = harness(100.0, 100.0, 1.0);
        h.engine.set_active(false);
        h.engine.teardown();
        h.engine.detach_surface();
        h.assert_fully_idle();
    }

    #[test]
    fn no_ticks_after_deactivation() {
        let mut h = harness(100.0, 100.0, 1.0);
        h.engine.set_active(true);
        h.refresh(4);
        h.engine.set_active(false);
        h.refresh(10);
        assert_eq!(h.surface.borrow().frames_presented(), 4);
    }

    #[test]
    fn resize_while_idle_does_not_configure() {
        let h = harness(100.0, 100.0, 1.0);
        h.surface.borrow_mut().resize(LogicalSize::new(300.0, 200.0));
        assert_eq!(h.resize.notify(), 0);
        assert_eq!(h.surface.borrow().buffer_resizes(), 0);
        assert_eq!(h.surface.borrow().buffer_size(), PhysicalSize::default());
    }

    #[test]
    fn resize_while_running_reconfigures() {
        let mut h = harness(100.0, 100.0, 1.0);
        h.engine.set_active(true);
        h.refresh(2);

        h.surface.borrow_mut().resize(LogicalSize::new(300.0, 200.0));
        h.surface.borrow_mut().set_scale_factor(2.0);
        h.resize.notify();
        assert_eq!(h.surface.borrow().buffer_size(), PhysicalSize::new(600, 400));

        h.refresh(1);
        assert_eq!(h.engine.clock(), Some(3));
        let surface = h.surface.borrow();
        let background = surface
            .last_frame()
            .iter()
            .find(|c| matches!(c, DrawCommand::FillRect { .. }));
        assert_eq!(
            background,
            Some(&DrawCommand::FillRect {
                rect: Rect::new(0.0, 0.0, 300.0, 200.0),
                paint: Paint::Solid(h.engine.scene().config().background),
            })
        );
    }

    #[test]
    fn resize_after_deactivation_is_ignored() {
        let mut h = harness(100.0, 100.0, 1.0);
        h.engine.set_active(true);
        h.engine.set_active(false);
        let resizes = h.surface.borrow().buffer_resizes();

        h.surface.borrow_mut().resize(LogicalSize::new(10.0, 10.0));
        h.resize.notify();
        h.refresh(3);
        assert_eq!(h.surface.borrow().buffer_resizes(), resizes);
        h.assert_fully_idle();
    }

    #[test]
    fn zero_sized_surface_waits_for_layout() {
        let mut h = harness(0.0, 0.0, 2.0);
        h.engine.set_active(true);
        assert_eq!(h.engine.state(), EngineState::Running);

        h.refresh(5);
        assert_eq!(h.engine.clock(), Some(0));
        assert_eq!(h.surface.borrow().frames_presented(), 0);

        h.surface.borrow_mut().resize(LogicalSize::new(80.0, 60.0));
        h.resize.notify();
        assert_eq!(h.surface.borrow().buffer_size(), PhysicalSize::new(160, 120));

        h.refresh(2);
        assert_eq!(h.engine.clock(), Some(2));
        assert_eq!(h.surface.borrow().frames_presented(), 2);
    }

    #[test]
    fn activation_without_surface_waits_for_attach() {
        let scheduler = Rc::new(RefreshScheduler::new());
        let resize = Rc::new(ResizeNotifier::new());
        let mut engine: BackgroundEngine<RecordingSurface> =
            BackgroundEngine::new(Scene::default(), scheduler.clone(), resize.clone());

        engine.set_active(true);
        assert!(engine.is_active());
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(scheduler.pending(), 0);

        let surface = Rc::new(RefCell::new(RecordingSurface::new(
            LogicalSize::new(10.0, 10.0),
            1.0,
        )));
        engine.attach_surface(&surface);
        assert_eq!(engine.state(), EngineState::Running);
        scheduler.on_refresh();
        assert_eq!(engine.clock(), Some(1));
    }

    #[test]
    fn dropped_surface_makes_ticks_inert() {
        let mut h = harness(50.0, 50.0, 1.0);
        h.engine.set_active(true);
        h.refresh(1);

        let Harness {
            scheduler,
            resize,
            surface,
            engine,
        } = h;
        drop(surface);
        scheduler.on_refresh();
        resize.notify();
        assert_eq!(engine.clock(), Some(1));
    }

    #[test]
    fn dropping_engine_tears_down() {
        let mut h = harness(50.0, 50.0, 1.0);
        h.engine.set_active(true);
        let Harness {
            scheduler,
            resize,
            engine,
            ..
        } = h;
        drop(engine);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(resize.subscriber_count(), 0);
    }

    #[test]
    fn engines_do_not_share_clocks() {
        let scheduler = Rc::new(RefreshScheduler::new());
        let resize = Rc::new(ResizeNotifier::new());
        let make_surface = || {
            Rc::new(RefCell::new(RecordingSurface::new(
                LogicalSize::new(40.0, 40.0),
                1.0,
            )))
        };
        let (sa, sb) = (make_surface(), make_surface());

        let mut a = BackgroundEngine::new(Scene::default(), scheduler.clone(), resize.clone());
        let mut b = BackgroundEngine::new(Scene::default(), scheduler.clone(), resize.clone());
        a.attach_surface(&sa);
        b.attach_surface(&sb);

        a.set_active(true);
        scheduler.on_refresh();
        scheduler.on_refresh();
        b.set_active(true);
        scheduler.on_refresh();

        assert_eq!(a.clock(), Some(3));
        assert_eq!(b.clock(), Some(1));

        a.set_active(false);
        scheduler.on_refresh();
        assert_eq!(b.clock(), Some(2));
        assert_eq!(sa.borrow().frames_presented(), 3);
    }
}
