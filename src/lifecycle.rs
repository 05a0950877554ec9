use crate::effect::Effect;
use crate::error::{panic_message, CoreError, Phase};
use crate::frame::FrameBuffer;
use crate::registry::{Entry, Registry};
use crate::shared::Shared;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

/// Result of running the active effect for one tick.
#[derive(Debug)]
pub enum TickResult {
    /// Nothing is registered yet.
    NoEffect,
    /// The effect drew into the buffer it was given.
    InPlace,
    /// The effect returned its own buffer to render instead.
    Replaced(FrameBuffer),
}

/// Owns the registry and the active-effect pointer.
///
/// At most one effect is mounted at any time, and the outgoing effect's
/// `unmount` always runs before the incoming effect's `mount`.
#[derive(Default)]
pub struct Lifecycle {
    registry: Registry,
    active: Option<usize>,
    frame_count: u64,
    start_effect: Option<String>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// `start_effect` takes over as soon as it is registered, even if
    /// another effect was registered first.
    pub fn with_start_effect(start_effect: Option<String>) -> Self {
        Self {
            start_effect,
            ..Self::default()
        }
    }

    /// Registers `effect` under `name`. Later registrations of the same name
    /// are ignored. The first registration ever becomes active.
    pub fn register(&mut self, name: impl Into<String>, effect: Effect, shared: &mut Shared) -> bool {
        let name = name.into();
        let Some(idx) = self.registry.insert(name.clone(), effect) else {
            debug!(effect = %name, "already registered, ignoring");
            return false;
        };
        info!(effect = %name, "registered");

        if self.active.is_none() {
            self.activate(idx, shared);
        } else if self.start_effect.as_deref() == Some(name.as_str()) {
            self.switch_index(idx, shared);
        }
        true
    }

    /// Unknown names leave the current effect running.
    pub fn switch_to(&mut self, name: &str, shared: &mut Shared) -> Result<(), CoreError> {
        let Some(idx) = self.registry.position(name) else {
            warn!(effect = name, "cannot switch to unregistered effect");
            return Err(CoreError::UnknownEffect(name.to_string()));
        };
        self.switch_index(idx, shared);
        Ok(())
    }

    /// Activates the entry after the current one, wrapping around.
    pub fn cycle_next(&mut self, shared: &mut Shared) -> Option<&str> {
        let idx = self.registry.next_after(self.active)?;
        self.switch_index(idx, shared);
        self.active_name()
    }

    /// Runs the active effect's update. Faults are logged and returned; the
    /// effect stays active and the frame counter does not advance.
    pub fn update(&mut self, buffer: &mut FrameBuffer, shared: &mut Shared) -> Result<TickResult, CoreError> {
        let Some(entry) = self.active.and_then(|i| self.registry.get_mut(i)) else {
            return Ok(TickResult::NoEffect);
        };
        let frame_count = self.frame_count;
        let out = guarded(entry, Phase::Update, |e| e.update(buffer, frame_count, shared))?;
        self.frame_count += 1;
        Ok(match out {
            Some(replacement) => TickResult::Replaced(replacement),
            None => TickResult::InPlace,
        })
    }

    /// Unmounts the active effect and leaves nothing active.
    pub fn shutdown(&mut self, shared: &mut Shared) {
        if let Some(idx) = self.active.take() {
            self.run_hook(idx, Phase::Unmount, shared);
        }
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.and_then(|i| self.registry.name(i))
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.registry.names()
    }

    fn switch_index(&mut self, idx: usize, shared: &mut Shared) {
        if self.active == Some(idx) {
            // already mounted; a second mount would break the pairing
            self.frame_count = 0;
            return;
        }
        if let Some(current) = self.active.take() {
            self.run_hook(current, Phase::Unmount, shared);
        }
        self.activate(idx, shared);
    }

    fn activate(&mut self, idx: usize, shared: &mut Shared) {
        self.active = Some(idx);
        self.frame_count = 0;
        if let Some(name) = self.registry.name(idx) {
            info!(effect = name, "active effect changed");
        }
        self.run_hook(idx, Phase::Mount, shared);
    }

    fn run_hook(&mut self, idx: usize, phase: Phase, shared: &mut Shared) {
        let Some(entry) = self.registry.get_mut(idx) else {
            return;
        };
        // faults are logged inside; a failing hook never blocks a switch
        let _ = guarded(entry, phase, |e| match phase {
            Phase::Mount => e.mount(shared),
            Phase::Unmount => e.unmount(shared),
            Phase::Update => Ok(()),
        });
    }
}

/// Runs one hook, turning errors and panics into a logged [`CoreError`].
fn guarded<T>(
    entry: &mut Entry,
    phase: Phase,
    f: impl FnOnce(&mut Effect) -> anyhow::Result<T>,
) -> Result<T, CoreError> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| f(&mut entry.effect)));
    let err = match result {
        Ok(Ok(v)) => return Ok(v),
        Ok(Err(e)) => CoreError::EffectFault {
            name: entry.name.clone(),
            phase,
            message: format!("{e:#}"),
        },
        Err(payload) => CoreError::EffectPanicked {
            name: entry.name.clone(),
            phase,
            message: panic_message(payload.as_ref()),
        },
    };
    entry.faults = entry.faults.saturating_add(1);
    error!(effect = %entry.name, %phase, "{err}");
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{Hooks, UpdateResult};
    use crate::frame::{Config, Resolution};
    use crate::token::Token;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        log: Log,
        fail_mount: bool,
        fail_unmount: bool,
    }

    impl Hooks for Recorder {
        fn mount(&mut self, _shared: &mut Shared) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(format!("mount {}", self.name));
            if self.fail_mount {
                anyhow::bail!("no resources");
            }
            Ok(())
        }

        fn unmount(&mut self, _shared: &mut Shared) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(format!("unmount {}", self.name));
            if self.fail_unmount {
                anyhow::bail!("stuck handle");
            }
            Ok(())
        }

        fn update(&mut self, buffer: &mut FrameBuffer, frame: u64, _shared: &mut Shared) -> UpdateResult {
            self.log.lock().unwrap().push(format!("update {} {frame}", self.name));
            buffer.set(0, 0, Token::On);
            Ok(None)
        }
    }

    fn recorder(name: &'static str, log: &Log) -> Effect {
        Effect::lifecycled(Recorder {
            name,
            log: log.clone(),
            fail_mount: false,
            fail_unmount: false,
        })
    }

    fn shared() -> Shared {
        Shared::new(Config::for_resolution(Resolution::Square), 16, 7)
    }

    fn buffer() -> FrameBuffer {
        FrameBuffer::for_resolution(Resolution::Square, Token::Noise)
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn first_registration_is_mounted() {
        let log = Log::default();
        let mut s = shared();
        let mut lc = Lifecycle::new();
        assert!(lc.register("a", recorder("a", &log), &mut s));
        assert!(lc.register("b", recorder("b", &log), &mut s));
        assert!(!lc.register("a", recorder("dup", &log), &mut s));
        assert_eq!(lc.active_name(), Some("a"));
        assert_eq!(entries(&log), ["mount a"]);
    }

    #[test]
    fn unmount_runs_before_mount() {
        let log = Log::default();
        let mut s = shared();
        let mut lc = Lifecycle::new();
        lc.register("a", recorder("a", &log), &mut s);
        lc.register("b", recorder("b", &log), &mut s);
        lc.switch_to("b", &mut s).unwrap();
        lc.switch_to("a", &mut s).unwrap();
        assert_eq!(
            entries(&log),
            ["mount a", "unmount a", "mount b", "unmount b", "mount a"]
        );
    }

    #[test]
    fn switching_to_the_active_effect_does_not_remount() {
        let log = Log::default();
        let mut s = shared();
        let mut lc = Lifecycle::new();
        lc.register("a", recorder("a", &log), &mut s);
        let mut fb = buffer();
        lc.update(&mut fb, &mut s).unwrap();
        lc.switch_to("a", &mut s).unwrap();
        assert_eq!(lc.frame_count(), 0);
        assert_eq!(entries(&log), ["mount a", "update a 0"]);
    }

    #[test]
    fn unknown_switch_keeps_current_effect() {
        let log = Log::default();
        let mut s = shared();
        let mut lc = Lifecycle::new();
        lc.register("a", recorder("a", &log), &mut s);
        let err = lc.switch_to("later", &mut s).unwrap_err();
        assert!(matches!(err, CoreError::UnknownEffect(n) if n == "later"));
        assert_eq!(lc.active_name(), Some("a"));
        assert_eq!(entries(&log), ["mount a"]);
    }

    #[test]
    fn cycle_wraps_in_registration_order() {
        let mut s = shared();
        let mut lc = Lifecycle::new();
        assert_eq!(lc.cycle_next(&mut s), None);
        for n in ["a", "b", "c"] {
            lc.register(n, Effect::bare(|_, _, _| Ok(None)), &mut s);
        }
        let seen: Vec<String> = (0..3)
            .map(|_| lc.cycle_next(&mut s).unwrap().to_string())
            .collect();
        assert_eq!(seen, ["b", "c", "a"]);
    }

    #[test]
    fn frame_count_advances_per_update_and_resets_on_switch() {
        let mut s = shared();
        let mut lc = Lifecycle::new();
        let mut fb = buffer();
        lc.register("a", Effect::bare(|_, _, _| Ok(None)), &mut s);
        lc.register("b", Effect::bare(|_, _, _| Ok(None)), &mut s);
        for _ in 0..5 {
            lc.update(&mut fb, &mut s).unwrap();
        }
        assert_eq!(lc.frame_count(), 5);
        lc.cycle_next(&mut s);
        assert_eq!(lc.frame_count(), 0);
    }

    #[test]
    fn failing_update_is_isolated() {
        let mut s = shared();
        let mut lc = Lifecycle::new();
        let mut fb = buffer();
        let mut calls = 0;
        lc.register(
            "flaky",
            Effect::bare(move |_, _, _| {
                calls += 1;
                if calls == 1 {
                    anyhow::bail!("transient");
                }
                Ok(None)
            }),
            &mut s,
        );
        let err = lc.update(&mut fb, &mut s).unwrap_err();
        assert!(err.is_effect_fault());
        assert_eq!(lc.frame_count(), 0);
        assert_eq!(lc.active_name(), Some("flaky"));

        assert!(matches!(lc.update(&mut fb, &mut s), Ok(TickResult::InPlace)));
        assert_eq!(lc.frame_count(), 1);
        assert_eq!(lc.registry().faults("flaky"), Some(1));
    }

    #[test]
    fn panicking_update_is_caught() {
        let mut s = shared();
        let mut lc = Lifecycle::new();
        let mut fb = buffer();
        lc.register("boom", Effect::bare(|_, _, _| panic!("kaboom")), &mut s);
        let err = lc.update(&mut fb, &mut s).unwrap_err();
        match err {
            CoreError::EffectPanicked { name, phase, message } => {
                assert_eq!(name, "boom");
                assert_eq!(phase, Phase::Update);
                assert!(message.contains("kaboom"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn failing_mount_does_not_block_switch() {
        let log = Log::default();
        let mut s = shared();
        let mut lc = Lifecycle::new();
        lc.register("a", recorder("a", &log), &mut s);
        lc.register(
            "b",
            Effect::lifecycled(Recorder {
                name: "b",
                log: log.clone(),
                fail_mount: true,
                fail_unmount: false,
            }),
            &mut s,
        );
        lc.switch_to("b", &mut s).unwrap();
        assert_eq!(lc.active_name(), Some("b"));
        let mut fb = buffer();
        assert!(lc.update(&mut fb, &mut s).is_ok());
    }

    #[test]
    fn failing_unmount_does_not_block_switch() {
        let log = Log::default();
        let mut s = shared();
        let mut lc = Lifecycle::new();
        lc.register(
            "a",
            Effect::lifecycled(Recorder {
                name: "a",
                log: log.clone(),
                fail_mount: false,
                fail_unmount: true,
            }),
            &mut s,
        );
        lc.register("b", recorder("b", &log), &mut s);
        lc.switch_to("b", &mut s).unwrap();
        assert_eq!(lc.active_name(), Some("b"));
        assert_eq!(entries(&log), ["mount a", "unmount a", "mount b"]);
        assert_eq!(lc.registry().faults("a"), Some(1));
    }

    #[test]
    fn replacement_buffers_are_passed_through() {
        let mut s = shared();
        let mut lc = Lifecycle::new();
        lc.register(
            "legacy",
            Effect::bare(|_, _, shared| {
                let cfg = shared.config();
                Ok(Some(FrameBuffer::new(cfg.cols, cfg.rows, Config::ON)))
            }),
            &mut s,
        );
        let mut fb = buffer();
        match lc.update(&mut fb, &mut s).unwrap() {
            TickResult::Replaced(b) => assert_eq!(b.get(5, 5), Some(Token::On)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn start_effect_takes_over_when_it_arrives() {
        let log = Log::default();
        let mut s = shared();
        let mut lc = Lifecycle::with_start_effect(Some("b".into()));
        lc.register("a", recorder("a", &log), &mut s);
        lc.register("b", recorder("b", &log), &mut s);
        assert_eq!(lc.active_name(), Some("b"));
        lc.shutdown(&mut s);
        assert_eq!(lc.active_name(), None);
        assert_eq!(entries(&log), ["mount a", "unmount a", "mount b", "unmount b"]);
    }
}
