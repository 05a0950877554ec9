use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    /// Waiting for the next host frame callback.
    Scheduled,
    /// Between a `Tick` evaluation and `finish_tick`.
    Ticking,
}

/// Tick rates and the idle threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pacing {
    pub active_fps: f64,
    pub idle_fps: f64,
    pub idle_timeout_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            active_fps: 30.0,
            idle_fps: 1.0,
            idle_timeout_ms: 5_000,
        }
    }
}

impl Pacing {
    pub fn active_interval_ms(&self) -> f64 {
        1000.0 / self.active_fps.max(0.01)
    }

    pub fn idle_interval_ms(&self) -> f64 {
        1000.0 / self.idle_fps.max(0.01)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Evaluation {
    Stopped,
    /// Too early; return and wait for the next callback.
    Throttled,
    Tick { now_ms: u64, delta_ms: u64 },
}

/// Fixed-rate tick gate driven by host frame callbacks.
///
/// The host calls [`Scheduler::evaluate`] on every frame with a monotonic
/// timestamp; only callbacks at least one interval after the last tick
/// produce a tick. Ticks land on a grid of whole intervals so the rate does
/// not drift with callback jitter.
#[derive(Clone, Debug)]
pub struct Scheduler {
    pacing: Pacing,
    state: RunState,
    last_tick_ms: Option<f64>,
    last_tick_at: Option<u64>,
    last_input_ms: u64,
    idle: bool,
}

impl Scheduler {
    pub fn new(pacing: Pacing) -> Self {
        Self {
            pacing,
            state: RunState::Stopped,
            last_tick_ms: None,
            last_tick_at: None,
            last_input_ms: 0,
            idle: false,
        }
    }

    /// Returns false if already running.
    pub fn start(&mut self, now_ms: u64) -> bool {
        if self.state != RunState::Stopped {
            return false;
        }
        self.state = RunState::Scheduled;
        self.last_tick_ms = None;
        self.last_tick_at = None;
        self.last_input_ms = now_ms;
        self.idle = false;
        true
    }

    pub fn stop(&mut self) {
        self.state = RunState::Stopped;
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    pub fn is_idle(&self) -> bool {
        self.idle
    }

    pub fn current_interval_ms(&self) -> f64 {
        if self.idle {
            self.pacing.idle_interval_ms()
        } else {
            self.pacing.active_interval_ms()
        }
    }

    /// Any user interaction. Leaves idle mode immediately.
    pub fn note_input(&mut self, now_ms: u64) {
        self.last_input_ms = self.last_input_ms.max(now_ms);
        if self.idle {
            self.idle = false;
            debug!("leaving idle mode");
        }
    }

    /// Milliseconds until the next tick is due; zero if due now.
    pub fn time_until_due(&self, now_ms: u64) -> f64 {
        match self.last_tick_ms {
            Some(last) => (last + self.current_interval_ms() - now_ms as f64).max(0.0),
            None => 0.0,
        }
    }

    pub fn evaluate(&mut self, now_ms: u64) -> Evaluation {
        if self.state == RunState::Stopped {
            return Evaluation::Stopped;
        }

        if !self.idle && now_ms.saturating_sub(self.last_input_ms) > self.pacing.idle_timeout_ms {
            self.idle = true;
            debug!(idle_fps = self.pacing.idle_fps, "entering idle mode");
        }

        let interval = self.current_interval_ms();
        let now = now_ms as f64;
        let next_last = match self.last_tick_ms {
            None => now,
            Some(last) => {
                let elapsed = now - last;
                if elapsed < interval {
                    return Evaluation::Throttled;
                }
                // keep the remainder so ticks stay on the interval grid
                last + (elapsed / interval).floor() * interval
            }
        };
        self.last_tick_ms = Some(next_last);

        let delta_ms = self
            .last_tick_at
            .map(|t| now_ms.saturating_sub(t))
            .unwrap_or(0);
        self.last_tick_at = Some(now_ms);
        self.state = RunState::Ticking;
        Evaluation::Tick { now_ms, delta_ms }
    }

    /// Back to `Scheduled` unless the tick stopped the loop.
    pub fn finish_tick(&mut self) {
        if self.state == RunState::Ticking {
            self.state = RunState::Scheduled;
        }
    }
}
