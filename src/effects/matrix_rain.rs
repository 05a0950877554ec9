use crate::effect::{Effect, Hooks, Registration, UpdateResult};
use crate::frame::FrameBuffer;
use crate::shared::Shared;
use rand::Rng;

const TRAIL: i32 = 8;

pub fn register() -> anyhow::Result<Registration> {
    Ok(Registration::new(
        "matrix_rain",
        Effect::lifecycled(MatrixRain::default()),
    ))
}

/// One falling drop per column; heads are fractional rows.
#[derive(Default)]
struct MatrixRain {
    drops: Vec<f64>,
}

impl MatrixRain {
    fn seed(&mut self, cols: u16, rows: u16, shared: &mut Shared) {
        self.drops = (0..cols)
            .map(|_| -shared.rng.gen_range(0.0..rows.max(1) as f64))
            .collect();
    }
}

impl Hooks for MatrixRain {
    fn mount(&mut self, shared: &mut Shared) -> anyhow::Result<()> {
        let cfg = shared.config();
        self.seed(cfg.cols, cfg.rows, shared);
        Ok(())
    }

    fn unmount(&mut self, _shared: &mut Shared) -> anyhow::Result<()> {
        self.drops = Vec::new();
        Ok(())
    }

    fn update(&mut self, buf: &mut FrameBuffer, _frame: u64, shared: &mut Shared) -> UpdateResult {
        let (cols, rows) = (buf.cols(), buf.rows());
        if self.drops.len() != cols as usize {
            self.seed(cols, rows, shared);
        }
        let colors = *shared.colors();

        for (c, drop) in self.drops.iter_mut().enumerate() {
            let head = drop.floor() as i32;
            buf.set(c as i32, head, colors.on);
            for k in 1..TRAIL {
                if shared.rng.gen_bool(0.9) {
                    buf.set(c as i32, head - k, colors.system);
                }
            }

            *drop += 0.3 + shared.rng.gen_range(0.0..0.2);
            if *drop - TRAIL as f64 > rows as f64 {
                *drop = -shared.rng.gen_range(0.0..20.0);
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::context;
    use crate::frame::{Config, Resolution};
    use crate::token::Token;

    #[test]
    fn drops_fall_into_view() {
        let (mut buf, mut shared) = context(Resolution::Square);
        let mut rain = MatrixRain::default();
        rain.mount(&mut shared).unwrap();
        for f in 0..200 {
            buf.fill(Config::NOISE);
            rain.update(&mut buf, f, &mut shared).unwrap();
        }
        assert!(buf.cells().iter().any(|t| *t == Token::On));
    }

    #[test]
    fn reseeds_when_the_canvas_changes() {
        let (mut buf, mut shared) = context(Resolution::Square);
        let mut rain = MatrixRain::default();
        rain.mount(&mut shared).unwrap();
        assert_eq!(rain.drops.len(), 32);

        buf = FrameBuffer::for_resolution(Resolution::Wide, Config::NOISE);
        rain.update(&mut buf, 0, &mut shared).unwrap();
        assert_eq!(rain.drops.len(), 64);

        rain.unmount(&mut shared).unwrap();
        assert!(rain.drops.is_empty());
    }
}
