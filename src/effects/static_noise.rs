use crate::effect::{Effect, Registration};
use crate::frame::FrameBuffer;
use crate::shared::Shared;
use rand::Rng;

const DENSITY: f64 = 0.12;

pub fn register() -> anyhow::Result<Registration> {
    Ok(Registration::new(
        "static_noise",
        Effect::bare(|buf, _, shared| {
            draw(buf, shared);
            Ok(None)
        }),
    ))
}

fn draw(buf: &mut FrameBuffer, shared: &mut Shared) {
    let colors = *shared.colors();
    for r in 0..buf.rows() as i32 {
        for c in 0..buf.cols() as i32 {
            if !shared.rng.gen_bool(DENSITY) {
                continue;
            }
            let t = if shared.rng.gen_bool(0.25) {
                colors.system
            } else {
                colors.on
            };
            buf.set(c, r, t);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::context;
    use crate::frame::Resolution;
    use crate::token::Token;

    #[test]
    fn sparkles_are_sparse() {
        let (mut buf, mut shared) = context(Resolution::Wide);
        draw(&mut buf, &mut shared);
        let lit = buf.cells().iter().filter(|t| **t != Token::Noise).count();
        assert!(lit > 0);
        assert!(lit < buf.cells().len() / 3);
    }
}
