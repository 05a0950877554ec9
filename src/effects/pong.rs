use crate::effect::{Effect, Hooks, Registration, UpdateResult};
use crate::frame::FrameBuffer;
use crate::shared::Shared;
use rand::Rng;

const PADDLE: f64 = 6.0;
const PADDLE_STEP: f64 = 0.8;
const CPU_STEP: f64 = 0.6;
const BALL_START: f64 = 0.5;
const BALL_MAX: f64 = 1.2;
const WIN_SCORE: u32 = 5;

pub fn register() -> anyhow::Result<Registration> {
    Ok(Registration::new("pong", Effect::lifecycled(Pong::default())))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Mode {
    #[default]
    Cpu,
    Versus,
}

#[derive(Clone, Copy, Debug, Default)]
struct Ball {
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
}

/// W/S move the left paddle. The right paddle is the CPU, or the arrow keys
/// in versus mode; `M` switches between the two.
#[derive(Default)]
struct Pong {
    cols: u16,
    rows: u16,
    left: f64,
    right: f64,
    score: (u32, u32),
    ball: Ball,
    mode: Mode,
    game_over: bool,
}

impl Pong {
    fn reset_ball(&mut self, dir: f64, shared: &mut Shared) {
        self.ball = Ball {
            x: self.cols as f64 / 2.0,
            y: self.rows as f64 / 2.0,
            vx: dir * BALL_START,
            vy: shared.rng.gen_range(-0.5..0.5) * BALL_START,
        };
    }

    fn reset_game(&mut self, cols: u16, rows: u16, shared: &mut Shared) {
        self.cols = cols;
        self.rows = rows;
        self.left = rows as f64 / 2.0 - PADDLE / 2.0;
        self.right = self.left;
        self.score = (0, 0);
        self.game_over = false;
        self.reset_ball(1.0, shared);
    }

    fn move_paddles(&mut self, shared: &Shared) {
        let floor = self.rows as f64 - PADDLE;
        let keys = &shared.keys;

        if keys.is_held("W") && self.left > 0.0 {
            self.left -= PADDLE_STEP;
        }
        if keys.is_held("S") && self.left < floor {
            self.left += PADDLE_STEP;
        }

        match self.mode {
            Mode::Versus => {
                if keys.is_held("ARROWUP") && self.right > 0.0 {
                    self.right -= PADDLE_STEP;
                }
                if keys.is_held("ARROWDOWN") && self.right < floor {
                    self.right += PADDLE_STEP;
                }
            }
            Mode::Cpu => {
                let center = self.right + PADDLE / 2.0;
                if center < self.ball.y - 1.0 {
                    self.right += CPU_STEP;
                }
                if center > self.ball.y + 1.0 {
                    self.right -= CPU_STEP;
                }
                self.right = self.right.clamp(0.0, floor.max(0.0));
            }
        }
    }

    fn step_ball(&mut self, shared: &mut Shared) {
        let (cols, rows) = (self.cols as f64, self.rows as f64);
        let b = &mut self.ball;
        b.x += b.vx;
        b.y += b.vy;

        if b.y <= 0.0 || b.y >= rows - 1.0 {
            b.vy = -b.vy;
        }
        if b.x <= 1.0 && (self.left..=self.left + PADDLE).contains(&b.y) {
            b.vx = (b.vx * -1.1).min(BALL_MAX);
            b.x = 1.1;
        }
        if b.x >= cols - 2.0 && (self.right..=self.right + PADDLE).contains(&b.y) {
            b.vx = (b.vx * -1.1).max(-BALL_MAX);
            b.x = cols - 2.1;
        }

        if b.x < 0.0 {
            self.score.1 += 1;
            self.reset_ball(1.0, shared);
        } else if b.x > cols {
            self.score.0 += 1;
            self.reset_ball(-1.0, shared);
        }
        if self.score.0 >= WIN_SCORE || self.score.1 >= WIN_SCORE {
            self.game_over = true;
        }
    }

    fn draw(&self, buf: &mut FrameBuffer, shared: &Shared) {
        let c = shared.colors();
        let right_col = self.cols as i32 - 1;
        for i in 0..PADDLE as i32 {
            buf.set(0, (self.left + i as f64).floor() as i32, c.blue);
            buf.set(right_col, (self.right + i as f64).floor() as i32, c.red);
        }
        buf.set(self.ball.x.floor() as i32, self.ball.y.floor() as i32, c.on);

        for i in 0..self.score.0 as i32 {
            buf.set(2 + i * 2, 0, c.blue);
        }
        for i in 0..self.score.1 as i32 {
            buf.set(self.cols as i32 - 3 - i * 2, 0, c.red);
        }

        let mode = match self.mode {
            Mode::Cpu => c.system,
            Mode::Versus => c.green,
        };
        buf.set(self.cols as i32 / 2, self.rows as i32 - 1, mode);
    }
}

impl Hooks for Pong {
    fn mount(&mut self, shared: &mut Shared) -> anyhow::Result<()> {
        let cfg = shared.config();
        self.reset_game(cfg.cols, cfg.rows, shared);
        Ok(())
    }

    fn update(&mut self, buf: &mut FrameBuffer, _frame: u64, shared: &mut Shared) -> UpdateResult {
        if (buf.cols(), buf.rows()) != (self.cols, self.rows) {
            self.reset_game(buf.cols(), buf.rows(), shared);
        }

        self.move_paddles(shared);

        if shared.keys.take_key("M").is_some() {
            self.mode = match self.mode {
                Mode::Cpu => Mode::Versus,
                Mode::Versus => Mode::Cpu,
            };
            self.reset_game(self.cols, self.rows, shared);
        }

        if !self.game_over {
            self.step_ball(shared);
        }
        self.draw(buf, shared);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::context;
    use crate::frame::Resolution;
    use crate::input::Modifiers;
    use crate::token::Token;

    fn mounted() -> (Pong, FrameBuffer, Shared) {
        let (buf, mut shared) = context(Resolution::Square);
        let mut p = Pong::default();
        p.mount(&mut shared).unwrap();
        (p, buf, shared)
    }

    #[test]
    fn held_w_moves_the_left_paddle_each_tick() {
        let (mut p, mut buf, mut shared) = mounted();
        shared.keys.key_down("w", Modifiers::default(), false, 0);
        for f in 0..5 {
            p.update(&mut buf, f, &mut shared).unwrap();
        }
        assert!((p.left - 9.0).abs() < 1e-9);
    }

    #[test]
    fn m_toggles_versus_mode_once_per_press() {
        let (mut p, mut buf, mut shared) = mounted();
        shared.keys.key_down("m", Modifiers::default(), false, 0);
        p.update(&mut buf, 0, &mut shared).unwrap();
        assert_eq!(p.mode, Mode::Versus);
        assert_eq!(buf.get(16, 31), Some(Token::Green));

        p.update(&mut buf, 1, &mut shared).unwrap();
        assert_eq!(p.mode, Mode::Versus);
        assert!(shared.keys.is_empty());
    }

    #[test]
    fn missed_ball_scores_for_the_other_side() {
        let (mut p, mut buf, mut shared) = mounted();
        p.left = 25.0;
        p.ball = Ball {
            x: 0.5,
            y: 5.0,
            vx: -1.0,
            vy: 0.0,
        };
        p.update(&mut buf, 0, &mut shared).unwrap();
        assert_eq!(p.score, (0, 1));
        assert!((p.ball.x - 16.0).abs() < 1.0);
    }

    #[test]
    fn game_stops_at_five() {
        let (mut p, mut buf, mut shared) = mounted();
        p.score = (4, 0);
        p.right = 0.0;
        p.mode = Mode::Versus;
        p.ball = Ball {
            x: 31.5,
            y: 20.0,
            vx: 1.0,
            vy: 0.0,
        };
        p.update(&mut buf, 0, &mut shared).unwrap();
        assert_eq!(p.score, (5, 0));
        assert!(p.game_over);
        let frozen = p.ball.x;
        p.update(&mut buf, 1, &mut shared).unwrap();
        assert_eq!(p.ball.x, frozen);
    }
}
