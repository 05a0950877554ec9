//! Effect plugin contract.
//!
//! An effect is either a bare per-tick function or an object with optional
//! `mount`/`unmount` hooks around `update`. Both shapes are wrapped in
//! [`Effect`] once, at registration, so the core only ever talks to one
//! interface.

use crate::frame::FrameBuffer;
use crate::shared::Shared;

/// `Ok(None)`: the buffer was drawn in place. `Ok(Some(b))`: render `b` instead.
pub type UpdateResult = anyhow::Result<Option<FrameBuffer>>;

pub type UpdateFn = Box<dyn FnMut(&mut FrameBuffer, u64, &mut Shared) -> UpdateResult + Send>;

/// Lifecycle hooks. Per-activation state lives in the implementing type.
///
/// `update` receives the buffer for the duration of the call only.
pub trait Hooks: Send {
    fn mount(&mut self, _shared: &mut Shared) -> anyhow::Result<()> {
        Ok(())
    }

    fn unmount(&mut self, _shared: &mut Shared) -> anyhow::Result<()> {
        Ok(())
    }

    fn update(&mut self, buffer: &mut FrameBuffer, frame_count: u64, shared: &mut Shared)
        -> UpdateResult;
}

pub enum Effect {
    Bare(UpdateFn),
    Lifecycled(Box<dyn Hooks>),
}

impl Effect {
    pub fn bare<F>(f: F) -> Self
    where
        F: FnMut(&mut FrameBuffer, u64, &mut Shared) -> UpdateResult + Send + 'static,
    {
        Effect::Bare(Box::new(f))
    }

    pub fn lifecycled<H: Hooks + 'static>(hooks: H) -> Self {
        Effect::Lifecycled(Box::new(hooks))
    }

    pub(crate) fn mount(&mut self, shared: &mut Shared) -> anyhow::Result<()> {
        match self {
            Effect::Bare(_) => Ok(()),
            Effect::Lifecycled(h) => h.mount(shared),
        }
    }

    pub(crate) fn unmount(&mut self, shared: &mut Shared) -> anyhow::Result<()> {
        match self {
            Effect::Bare(_) => Ok(()),
            Effect::Lifecycled(h) => h.unmount(shared),
        }
    }

    pub(crate) fn update(
        &mut self,
        buffer: &mut FrameBuffer,
        frame_count: u64,
        shared: &mut Shared,
    ) -> UpdateResult {
        match self {
            Effect::Bare(f) => f(buffer, frame_count, shared),
            Effect::Lifecycled(h) => h.update(buffer, frame_count, shared),
        }
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::Bare(_) => f.write_str("Effect::Bare"),
            Effect::Lifecycled(_) => f.write_str("Effect::Lifecycled"),
        }
    }
}

/// What a plugin module hands back when it registers itself.
#[derive(Debug)]
pub struct Registration {
    pub name: String,
    pub effect: Effect,
}

impl Registration {
    pub fn new(name: impl Into<String>, effect: Effect) -> Self {
        Self {
            name: name.into(),
            effect,
        }
    }
}
