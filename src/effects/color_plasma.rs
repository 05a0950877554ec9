use crate::effect::{Effect, Registration};
use crate::frame::FrameBuffer;
use crate::shared::Shared;

const SCALE: f64 = 0.1;
const SPEED: f64 = 0.05;

pub fn register() -> anyhow::Result<Registration> {
    Ok(Registration::new(
        "color_plasma",
        Effect::bare(|buf, frame, shared| {
            draw(buf, frame, shared);
            Ok(None)
        }),
    ))
}

fn draw(buf: &mut FrameBuffer, frame: u64, shared: &Shared) {
    let palette = shared.colors().rainbow();
    let n = palette.len() as i64;
    let t = frame as f64 * SPEED;

    for r in 0..buf.rows() as i32 {
        for c in 0..buf.cols() as i32 {
            let (rf, cf) = (r as f64, c as f64);
            let v = (rf * SCALE + t).sin()
                + (cf * SCALE + t * 0.8).sin()
                + ((rf + cf) * SCALE * 0.5 + t * 1.5).sin();
            // v is in [-3, 3]
            let idx = (((v / 3.0) + 1.0) * n as f64).floor() as i64;
            buf.set(c, r, palette[idx.rem_euclid(n) as usize]);
        }
    }
}
