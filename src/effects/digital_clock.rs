use super::font::{draw_centered, draw_text, text_width, GLYPH_H};
use crate::effect::{Effect, Registration};
use crate::frame::FrameBuffer;
use crate::token::Colors;
use chrono::{Datelike, Local, Timelike};

const LINE_GAP: i32 = 3;
const DAYS: [&str; 7] = ["SU", "MO", "TU", "WE", "TH", "FR", "SA"];

pub fn register() -> anyhow::Result<Registration> {
    Ok(Registration::new(
        "digital_clock",
        Effect::bare(|buf, _, shared| {
            draw(buf, &Local::now().naive_local(), shared.colors());
            Ok(None)
        }),
    ))
}

fn draw<T: Timelike + Datelike>(buf: &mut FrameBuffer, now: &T, colors: &Colors) {
    let hours = format!("{:02}", now.hour());
    let minutes = format!("{:02}", now.minute());
    let day = DAYS[now.weekday().num_days_from_sunday() as usize];
    let date = now.day().to_string();
    let colon = now.nanosecond() < 500_000_000;

    if buf.config().is_vertical() {
        let lines = [
            (hours.as_str(), colors.on),
            (minutes.as_str(), colors.on),
            (day, colors.system),
            (date.as_str(), colors.system),
        ];
        let n = lines.len() as i32;
        let height = n * GLYPH_H + (n - 1) * LINE_GAP;
        let mut y = (buf.rows() as i32 - height).div_euclid(2);
        for (text, token) in lines {
            draw_centered(buf, text, y, token);
            y += GLYPH_H + LINE_GAP;
        }
        return;
    }

    let time = format!("{hours}{}{minutes}", if colon { ':' } else { ' ' });
    let height = GLYPH_H * 2 + LINE_GAP;
    let top = (buf.rows() as i32 - height).div_euclid(2);
    draw_centered(buf, &time, top, colors.on);

    // "MO.12" split around the middle column
    let mid = buf.cols() as i32 / 2;
    let y = top + GLYPH_H + LINE_GAP;
    let day_x = mid - text_width(day) - 2;
    draw_text(buf, day, day_x, y, colors.system);
    draw_text(buf, ".", mid - 1, y, colors.system);
    draw_text(buf, &date, mid + 2, y, colors.system);
}
