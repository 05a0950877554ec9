use crate::effect::{Effect, Registration};
use crate::frame::FrameBuffer;
use crate::token::Token;

const WAVE_SPEED: f64 = 0.5;
const THICKNESS: f64 = 2.5;

pub fn register() -> anyhow::Result<Registration> {
    Ok(Registration::new(
        "expanding_circle",
        Effect::bare(|buf, frame, shared| {
            let on = shared.colors().on;
            draw(buf, frame, on);
            Ok(None)
        }),
    ))
}

/// Ring radius for `frame`; the ring leaves the grid completely before restarting.
fn wave_radius(cols: u16, rows: u16, frame: u64) -> f64 {
    let (cx, cy) = (cols as f64 / 2.0, rows as f64 / 2.0);
    let max_radius = (cx * cx + cy * cy).sqrt();
    (frame as f64 * WAVE_SPEED) % (max_radius + THICKNESS * 2.0)
}

fn draw(buf: &mut FrameBuffer, frame: u64, on: Token) {
    let (cols, rows) = (buf.cols(), buf.rows());
    let (cx, cy) = (cols as f64 / 2.0, rows as f64 / 2.0);
    let radius = wave_radius(cols, rows, frame);

    for r in 0..rows as i32 {
        for c in 0..cols as i32 {
            let d = ((r as f64 - cy).powi(2) + (c as f64 - cx).powi(2)).sqrt();
            if (d - radius).abs() < THICKNESS {
                buf.set(c, r, on);
            }
        }
    }
}
