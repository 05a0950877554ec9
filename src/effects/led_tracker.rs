use crate::effect::{Effect, Hooks, Registration, UpdateResult};
use crate::frame::FrameBuffer;
use crate::input::CellPos;
use crate::shared::Shared;

const DECAY: f32 = 0.02;
const IDLE_FRAMES: u32 = 120;
const BRUSH: i32 = 1;
const BREATH_SPEED: f64 = 0.02;

pub fn register() -> anyhow::Result<Registration> {
    Ok(Registration::new(
        "led_tracker",
        Effect::lifecycled(LedTracker::default()),
    ))
}

/// Leaves a fading trail under the pointer. Without pointer movement a dot
/// bounces around on its own.
#[derive(Default)]
struct LedTracker {
    cols: u16,
    rows: u16,
    heat: Vec<f32>,
    last_pointer: Option<CellPos>,
    still_frames: u32,
    bouncer: (f64, f64),
    velocity: (f64, f64),
}

impl LedTracker {
    fn reset(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.heat = vec![0.0; cols as usize * rows as usize];
        self.bouncer = (cols as f64 / 2.0, rows as f64 / 2.0);
        self.velocity = (0.2, 0.15);
    }

    fn bounce(&mut self) {
        let margin_x = if self.cols >= 64 { 4.0 } else { 0.0 };
        let margin_y = if self.rows >= 64 { 4.0 } else { 0.0 };
        let max_x = self.cols as f64 - 1.0 - margin_x;
        let max_y = self.rows as f64 - 1.0 - margin_y;

        let (x, y) = &mut self.bouncer;
        let (vx, vy) = &mut self.velocity;
        *x += *vx;
        *y += *vy;
        if *x <= margin_x {
            *x = margin_x;
            *vx = vx.abs();
        } else if *x >= max_x {
            *x = max_x;
            *vx = -vx.abs();
        }
        if *y <= margin_y {
            *y = margin_y;
            *vy = vy.abs();
        } else if *y >= max_y {
            *y = max_y;
            *vy = -vy.abs();
        }
    }

    fn stamp(&mut self, x: i32, y: i32, brightness: f32) {
        for dy in -BRUSH..=BRUSH {
            for dx in -BRUSH..=BRUSH {
                let (c, r) = (x + dx, y + dy);
                if c < 0 || r < 0 || c >= self.cols as i32 || r >= self.rows as i32 {
                    continue;
                }
                let dist = ((dx * dx + dy * dy) as f32).sqrt();
                if dist <= BRUSH as f32 + 0.5 {
                    let v = brightness * (1.0 - dist / (BRUSH as f32 + 2.0));
                    let cell = &mut self.heat[r as usize * self.cols as usize + c as usize];
                    *cell = cell.max(v);
                }
            }
        }
    }
}

impl Hooks for LedTracker {
    fn mount(&mut self, shared: &mut Shared) -> anyhow::Result<()> {
        let cfg = shared.config();
        self.reset(cfg.cols, cfg.rows);
        self.last_pointer = None;
        self.still_frames = 0;
        Ok(())
    }

    fn update(&mut self, buf: &mut FrameBuffer, frame: u64, shared: &mut Shared) -> UpdateResult {
        if (buf.cols(), buf.rows()) != (self.cols, self.rows) {
            self.reset(buf.cols(), buf.rows());
        }

        let pointer = shared.pointer();
        if pointer != self.last_pointer {
            self.still_frames = 0;
            self.last_pointer = pointer;
            if let Some(p) = pointer {
                self.bouncer = (p.col as f64, p.row as f64);
            }
        } else {
            self.still_frames = self.still_frames.saturating_add(1);
        }

        match pointer {
            Some(p) if self.still_frames < IDLE_FRAMES => {
                self.stamp(p.col as i32, p.row as i32, 1.0);
            }
            _ => {
                self.bounce();
                let breath = ((frame as f64 * BREATH_SPEED).sin() + 1.0) / 2.0;
                let (x, y) = self.bouncer;
                self.stamp(x.floor() as i32, y.floor() as i32, (0.4 + breath * 0.6) as f32);
            }
        }

        let colors = *shared.colors();
        let cols = self.cols as usize;
        for (i, v) in self.heat.iter_mut().enumerate() {
            *v = (*v - DECAY).max(0.0);
            let token = if *v > 0.6 {
                colors.on
            } else if *v > 0.2 {
                colors.system
            } else {
                colors.off
            };
            buf.set((i % cols) as i32, (i / cols) as i32, token);
        }
        Ok(None)
    }
}
