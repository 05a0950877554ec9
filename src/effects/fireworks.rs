use crate::effect::{Effect, Hooks, Registration, UpdateResult};
use crate::frame::FrameBuffer;
use crate::shared::Shared;
use crate::token::Token;
use rand::Rng;
use std::f64::consts::TAU;

const PARTICLES: usize = 10;
const ASCENT: f64 = 0.2;
const BURST: f64 = 4.0;
const IGNITION_EVERY: u32 = 40;
const DRAG: f64 = 0.98;
const DECAY: f64 = 0.01;

pub fn register() -> anyhow::Result<Registration> {
    Ok(Registration::new(
        "fireworks",
        Effect::lifecycled(Fireworks::default()),
    ))
}

#[derive(Clone, Debug)]
struct Particle {
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    life: f64,
}

#[derive(Clone, Debug)]
struct Rocket {
    x: f64,
    y: f64,
    target_y: f64,
    color: Token,
    sparks: Vec<Particle>,
    exploded: bool,
}

impl Rocket {
    fn launch(cols: u16, rows: u16, color: Token, shared: &mut Shared) -> Self {
        let rows_f = rows as f64;
        Self {
            x: shared.rng.gen_range(0.0..cols.max(1) as f64),
            y: rows_f,
            target_y: shared.rng.gen_range(0.0..rows_f * 0.5) + rows_f * 0.1,
            color,
            sparks: Vec::new(),
            exploded: false,
        }
    }

    /// False once every spark has burned out.
    fn step(&mut self, shared: &mut Shared) -> bool {
        if !self.exploded {
            if self.y > self.target_y {
                self.y -= ASCENT;
            } else {
                self.explode(shared);
            }
            return true;
        }
        for p in &mut self.sparks {
            p.x += p.vx;
            p.y += p.vy;
            p.vx *= DRAG;
            p.vy *= DRAG;
            p.life -= DECAY;
        }
        self.sparks.retain(|p| p.life > 0.0);
        !self.sparks.is_empty()
    }

    fn explode(&mut self, shared: &mut Shared) {
        self.exploded = true;
        for _ in 0..PARTICLES {
            let angle = shared.rng.gen_range(0.0..TAU);
            let speed = ASCENT * BURST * shared.rng.gen_range(0.8..1.2);
            self.sparks.push(Particle {
                x: self.x,
                y: self.y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                life: 1.0,
            });
        }
    }

    fn draw(&self, buf: &mut FrameBuffer) {
        if !self.exploded {
            buf.set(self.x.floor() as i32, self.y.floor() as i32, self.color);
            return;
        }
        for p in &self.sparks {
            buf.set(p.x.floor() as i32, p.y.floor() as i32, self.color);
        }
    }
}

#[derive(Default)]
struct Fireworks {
    rockets: Vec<Rocket>,
    ignition: u32,
}

impl Fireworks {
    fn reset(&mut self) {
        self.rockets.clear();
        self.ignition = 0;
    }
}

impl Hooks for Fireworks {
    fn mount(&mut self, _shared: &mut Shared) -> anyhow::Result<()> {
        self.reset();
        Ok(())
    }

    fn unmount(&mut self, _shared: &mut Shared) -> anyhow::Result<()> {
        self.rockets = Vec::new();
        self.ignition = 0;
        Ok(())
    }

    fn update(&mut self, buf: &mut FrameBuffer, _frame: u64, shared: &mut Shared) -> UpdateResult {
        let c = shared.colors();
        let palette = [c.on, c.system, c.red, c.yellow];

        self.ignition += 1;
        if self.ignition >= IGNITION_EVERY {
            self.ignition = 0;
            let color = palette[shared.rng.gen_range(0..palette.len())];
            let rocket = Rocket::launch(buf.cols(), buf.rows(), color, shared);
            self.rockets.push(rocket);
        }

        self.rockets.retain_mut(|r| r.step(shared));
        for r in &self.rockets {
            r.draw(buf);
        }
        Ok(None)
    }
}
