use super::font::{draw_centered, draw_char, key_glyph, ADVANCE, GLYPH_H, GLYPH_W};
use crate::effect::{Effect, Registration};
use crate::frame::FrameBuffer;
use crate::shared::Shared;

/// Presses older than this fall out of the queue.
pub const DISPLAY_MS: u64 = 6_000;
const LEFT: i32 = 2;
const LINE: i32 = GLYPH_H + 1;

pub fn register() -> anyhow::Result<Registration> {
    Ok(Registration::new(
        "key_tester",
        Effect::bare(|buf, _, shared| {
            draw(buf, shared);
            Ok(None)
        }),
    ))
}

/// Shows the most recent presses, fading with age. Reads the queue without
/// consuming it.
fn draw(buf: &mut FrameBuffer, shared: &mut Shared) {
    let now = shared.time_ms();
    shared.keys.expire_older_than(now, DISPLAY_MS);

    let vertical = buf.config().is_vertical();
    let top = if vertical { 4 } else { 1 };
    let per_row = ((buf.cols() as i32 - LEFT + 1) / ADVANCE).max(0);
    let rows = ((buf.rows() as i32 - top) / LINE).max(0);
    let capacity = (per_row * rows) as usize;

    let colors = *shared.colors();
    let queue = shared.keys.queue();
    if queue.is_empty() || capacity == 0 {
        let y = (buf.rows() as i32 - GLYPH_H).div_euclid(2);
        draw_centered(buf, "KEYS", y, colors.system);
        return;
    }

    let skip = queue.len().saturating_sub(capacity);
    for (i, ev) in queue.iter().skip(skip).enumerate() {
        let i = i as i32;
        let x = LEFT + (i % per_row) * ADVANCE;
        let y = top + (i / per_row) * LINE;
        if x + GLYPH_W > buf.cols() as i32 {
            continue;
        }
        let fresh = 1.0 - now.saturating_sub(ev.timestamp_ms) as f64 / DISPLAY_MS as f64;
        let token = if fresh < 0.3 {
            colors.off
        } else if fresh < 0.6 {
            colors.system
        } else {
            colors.on
        };
        draw_char(buf, key_glyph(&ev.key), x, y, token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::context;
    use crate::frame::{Config, Resolution};
    use crate::input::Modifiers;
    use crate::token::Token;

    #[test]
    fn idle_screen_shows_the_title() {
        let (mut buf, mut shared) = context(Resolution::Square);
        draw(&mut buf, &mut shared);
        assert!(buf.cells().iter().any(|t| *t == Token::System));
    }

    #[test]
    fn presses_expire_after_six_seconds() {
        let (mut buf, mut shared) = context(Resolution::Square);
        shared.keys.key_down("a", Modifiers::default(), false, 1_000);
        shared.keys.key_down("b", Modifiers::default(), false, 6_000);

        shared.set_time(6_500, 0);
        draw(&mut buf, &mut shared);
        assert_eq!(shared.keys.len(), 2);
        assert!(buf.cells().iter().any(|t| *t == Token::On));

        buf.fill(Config::NOISE);
        shared.set_time(7_100, 0);
        draw(&mut buf, &mut shared);
        assert_eq!(shared.keys.len(), 1);
        assert_eq!(shared.keys.queue()[0].key, "B");
    }
}
