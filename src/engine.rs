//! The display core wired together.
//!
//! [`Engine`] owns the logical buffer, the effect lifecycle, input state and
//! the scheduler, and drives a [`Surface`]. The host feeds it events and calls
//! [`Engine::frame`] on every frame callback.

use crate::config::Settings;
use crate::dimensions::{DimensionChange, Dimensions};
use crate::effect::{Effect, Registration};
use crate::error::CoreError;
use crate::frame::{Config, FrameBuffer};
use crate::host::{Command, HostEvent, Surface};
use crate::input::{GestureAction, PointerTracker, PressGesture};
use crate::lifecycle::{Lifecycle, TickResult};
use crate::loader::Loader;
use crate::render::Renderer;
use crate::scheduler::{Evaluation, Scheduler};
use crate::shared::Shared;
use std::time::Duration;
use tracing::{debug, info};

/// What one call to [`Engine::frame`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Stopped,
    Throttled,
    /// Ticked with nothing registered; nothing was drawn.
    Empty,
    Rendered { writes: usize },
    /// The active effect failed; the tick was dropped.
    Faulted,
}

/// Whether the host loop should keep going after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Engine<S: Surface> {
    surface: S,
    dims: Dimensions,
    buffer: FrameBuffer,
    renderer: Renderer,
    lifecycle: Lifecycle,
    shared: Shared,
    scheduler: Scheduler,
    pointer: PointerTracker,
    gesture: PressGesture,
    loader: Loader,
    ticks: u64,
    faults: u64,
}

impl<S: Surface> Engine<S> {
    pub fn new(settings: &Settings, surface: S, loader: Loader) -> Self {
        let dims = Dimensions::new();
        let resolution = dims.resolution();
        Self {
            surface,
            buffer: FrameBuffer::for_resolution(resolution, Config::NOISE),
            renderer: Renderer::new(),
            lifecycle: Lifecycle::with_start_effect(settings.start_effect.clone()),
            shared: Shared::new(
                dims.config(),
                settings.key_queue_capacity,
                settings.seed,
            ),
            scheduler: Scheduler::new(settings.pacing()),
            pointer: PointerTracker::default(),
            gesture: PressGesture::new(settings.long_press_ms),
            loader,
            dims,
            ticks: 0,
            faults: 0,
        }
    }

    /// Binds the surface, sizes everything for the viewport and starts the
    /// scheduler. Nothing is scheduled when the surface is missing.
    pub fn init(&mut self, viewport: (u32, u32), now_ms: u64) -> Result<(), CoreError> {
        self.surface.bind()?;
        self.resize(viewport.0, viewport.1)?;
        if self.scheduler.start(now_ms) {
            info!(
                visual_cols = self.dims.visual_cols(),
                visual_rows = self.dims.visual_rows(),
                logical = ?self.dims.resolution(),
                "display started"
            );
        }
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<DimensionChange, CoreError> {
        let (cols, rows) = self.surface.fit_viewport(width, height);
        let change = self.dims.set_dimensions(cols, rows);
        self.surface
            .layout(self.dims.visual_cols(), self.dims.visual_rows());

        if change.bucket_changed {
            self.buffer = FrameBuffer::for_resolution(self.dims.resolution(), Config::NOISE);
            self.shared.set_config(self.dims.config());
            info!(logical = ?self.dims.resolution(), "logical resolution changed");
        }

        let len = self.dims.visual_len();
        if change.rebuild_surface || self.surface.len() != len {
            self.surface.rebuild(len)?;
            self.renderer.reset(len);
        }

        self.pointer.set_rect(self.surface.rect());
        Ok(change)
    }

    pub fn register(&mut self, registration: Registration) -> bool {
        self.lifecycle
            .register(registration.name, registration.effect, &mut self.shared)
    }

    pub fn register_effect(&mut self, name: impl Into<String>, effect: Effect) -> bool {
        self.lifecycle.register(name, effect, &mut self.shared)
    }

    /// Starts an asynchronous load; the effect registers itself on a later frame.
    pub fn load(&mut self, path: &str) {
        self.loader.load(path);
    }

    /// Registers every load that finished. Returns how many registered.
    pub fn poll_loads(&mut self) -> usize {
        let ready = self.loader.poll();
        self.register_all(ready)
    }

    /// Blocks for outstanding loads, up to `timeout`.
    pub fn wait_for_loads(&mut self, timeout: Duration) -> usize {
        let ready = self.loader.wait(timeout);
        self.register_all(ready)
    }

    pub fn pending_loads(&self) -> usize {
        self.loader.pending()
    }

    pub fn switch_to(&mut self, name: &str) -> Result<(), CoreError> {
        self.lifecycle.switch_to(name, &mut self.shared)
    }

    pub fn cycle_next(&mut self) -> Option<String> {
        self.lifecycle
            .cycle_next(&mut self.shared)
            .map(str::to_string)
    }

    pub fn toggle_fullscreen(&mut self) -> Result<(), CoreError> {
        if let Some((w, h)) = self.surface.toggle_fullscreen()? {
            self.resize(w, h)?;
        }
        self.pointer.set_rect(self.surface.rect());
        debug!("fullscreen toggled");
        Ok(())
    }

    pub fn handle_event(&mut self, event: HostEvent, now_ms: u64) -> Result<Flow, CoreError> {
        self.scheduler.note_input(now_ms);
        match event {
            HostEvent::Resize { width, height } => {
                self.resize(width, height)?;
            }
            HostEvent::KeyDown {
                key,
                modifiers,
                repeat,
            } => {
                self.shared.keys.key_down(&key, modifiers, repeat, now_ms);
            }
            HostEvent::KeyUp { key } => self.shared.keys.key_up(&key),
            HostEvent::PointerMove { x, y } => {
                self.pointer.pointer_move(x, y, &self.dims);
            }
            HostEvent::PointerDown { x, y } => {
                if self.pointer.pointer_move(x, y, &self.dims).is_some() {
                    self.gesture.press(now_ms);
                }
            }
            HostEvent::PointerUp { x, y } => {
                self.pointer.pointer_move(x, y, &self.dims);
                match self.gesture.release(now_ms) {
                    Some(GestureAction::CycleNext) => {
                        self.cycle_next();
                    }
                    Some(GestureAction::ToggleFullscreen) => self.toggle_fullscreen()?,
                    None => {}
                }
            }
            HostEvent::PointerLeave => {
                self.gesture.cancel();
                self.pointer.leave();
            }
            HostEvent::Scroll => self.pointer.set_rect(self.surface.rect()),
            HostEvent::Command(Command::NextEffect) => {
                self.cycle_next();
            }
            HostEvent::Command(Command::Quit) => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// One host frame callback.
    pub fn frame(&mut self, now_ms: u64) -> Result<FrameOutcome, CoreError> {
        self.poll_loads();
        if let Some(GestureAction::ToggleFullscreen) = self.gesture.poll(now_ms) {
            self.toggle_fullscreen()?;
        }

        let (now_ms, delta_ms) = match self.scheduler.evaluate(now_ms) {
            Evaluation::Stopped => return Ok(FrameOutcome::Stopped),
            Evaluation::Throttled => return Ok(FrameOutcome::Throttled),
            Evaluation::Tick { now_ms, delta_ms } => (now_ms, delta_ms),
        };
        let outcome = self.tick(now_ms, delta_ms);
        self.scheduler.finish_tick();
        outcome
    }

    fn tick(&mut self, now_ms: u64, delta_ms: u64) -> Result<FrameOutcome, CoreError> {
        self.ticks += 1;
        self.shared.set_time(now_ms, delta_ms);
        self.shared.set_pointer(self.pointer.position());
        self.buffer.fill(Config::NOISE);

        let result = match self.lifecycle.update(&mut self.buffer, &mut self.shared) {
            Ok(r) => r,
            Err(_) => {
                // already logged with the effect name
                self.faults += 1;
                return Ok(FrameOutcome::Faulted);
            }
        };

        let writes = match result {
            TickResult::NoEffect => return Ok(FrameOutcome::Empty),
            TickResult::InPlace => {
                self.renderer
                    .present(&self.dims, &self.buffer, &mut self.surface)?
            }
            TickResult::Replaced(frame) => {
                self.renderer.present(&self.dims, &frame, &mut self.surface)?
            }
        };
        Ok(FrameOutcome::Rendered { writes })
    }

    /// How long the host may sleep before the next frame is worth evaluating.
    pub fn next_frame_in(&self, now_ms: u64) -> Duration {
        let mut ms = self.scheduler.time_until_due(now_ms);
        if self.gesture.is_pressed() {
            // keep polling so the long press fires on time
            ms = ms.min(16.0);
        }
        Duration::from_secs_f64(ms / 1000.0)
    }

    /// Unmounts the active effect and stops the scheduler.
    pub fn shutdown(&mut self) {
        self.lifecycle.shutdown(&mut self.shared);
        self.scheduler.stop();
        info!(ticks = self.ticks, faults = self.faults, "display stopped");
    }

    pub fn active_effect(&self) -> Option<&str> {
        self.lifecycle.active_name()
    }

    pub fn effect_names(&self) -> Vec<String> {
        self.lifecycle.names().map(str::to_string).collect()
    }

    pub fn effect_faults(&self, name: &str) -> Option<u32> {
        self.lifecycle.registry().faults(name)
    }

    pub fn frame_count(&self) -> u64 {
        self.lifecycle.frame_count()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn faults(&self) -> u64 {
        self.faults
    }

    pub fn dimensions(&self) -> &Dimensions {
        &self.dims
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn shared(&self) -> &Shared {
        &self.shared
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    fn register_all(&mut self, ready: Vec<Registration>) -> usize {
        let mut n = 0;
        for reg in ready {
            if self.register(reg) {
                n += 1;
            }
        }
        n
    }
}
