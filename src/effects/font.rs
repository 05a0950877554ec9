//! 3×5 pixel font for the text-drawing effects.

use crate::frame::FrameBuffer;
use crate::token::Token;

pub const GLYPH_W: i32 = 3;
pub const GLYPH_H: i32 = 5;
/// Glyph width plus one column of spacing.
pub const ADVANCE: i32 = GLYPH_W + 1;

const DOWN_ARROW: [u8; 5] = [0b000, 0b000, 0b101, 0b101, 0b010];

/// Rows top to bottom, bit 2 is the leftmost column.
fn glyph(ch: char) -> [u8; 5] {
    // lowercase 'v' is the down arrow, not the letter
    if ch == 'v' {
        return DOWN_ARROW;
    }
    match ch.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        '^' => [0b010, 0b101, 0b000, 0b000, 0b000],
        '<' => [0b001, 0b010, 0b100, 0b010, 0b001],
        '>' => [0b100, 0b010, 0b001, 0b010, 0b100],
        ' ' => [0; 5],
        _ => [0b111, 0b001, 0b011, 0b000, 0b010], // '?'
    }
}

/// Width in cells of `text` drawn with [`draw_text`].
pub fn text_width(text: &str) -> i32 {
    let n = text.chars().count() as i32;
    if n == 0 {
        0
    } else {
        n * ADVANCE - 1
    }
}

pub fn draw_char(buf: &mut FrameBuffer, ch: char, x: i32, y: i32, token: Token) {
    for (r, bits) in glyph(ch).iter().enumerate() {
        for c in 0..GLYPH_W {
            if bits & (0b100 >> c) != 0 {
                buf.set(x + c, y + r as i32, token);
            }
        }
    }
}

/// Draws `text` with its top-left corner at `(x, y)`. Off-grid pixels are clipped.
pub fn draw_text(buf: &mut FrameBuffer, text: &str, x: i32, y: i32, token: Token) {
    for (i, ch) in text.chars().enumerate() {
        draw_char(buf, ch, x + i as i32 * ADVANCE, y, token);
    }
}

/// Draws `text` horizontally centered on the buffer.
pub fn draw_centered(buf: &mut FrameBuffer, text: &str, y: i32, token: Token) {
    let x = (buf.cols() as i32 - text_width(text)).div_euclid(2);
    draw_text(buf, text, x, y, token);
}

/// One displayable glyph for a normalized key name.
pub fn key_glyph(key: &str) -> char {
    match key {
        "ARROWUP" => '^',
        "ARROWDOWN" => 'v',
        "ARROWLEFT" => '<',
        "ARROWRIGHT" => '>',
        " " => '-',
        _ => {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => '?',
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_counts_spacing_between_glyphs_only() {
        assert_eq!(text_width(""), 0);
        assert_eq!(text_width("1"), 3);
        assert_eq!(text_width("12:34"), 19);
    }

    #[test]
    fn draws_clipped_glyphs() {
        let mut buf = FrameBuffer::new(4, 4, Token::Noise);
        draw_text(&mut buf, "1", -1, 0, Token::On);
        // '1' top row is .#. shifted one left
        assert_eq!(buf.get(0, 0), Some(Token::On));
        assert_eq!(buf.get(1, 0), Some(Token::Noise));
        assert_eq!(buf.get(0, 1), Some(Token::On));
    }

    #[test]
    fn key_names_map_to_single_glyphs() {
        assert_eq!(key_glyph("W"), 'W');
        assert_eq!(key_glyph("ARROWDOWN"), 'v');
        assert_eq!(key_glyph("ENTER"), '?');
    }

    #[test]
    fn down_arrow_is_not_a_letter_v() {
        let mut a = FrameBuffer::new(3, 5, Token::Noise);
        let mut b = FrameBuffer::new(3, 5, Token::Noise);
        draw_char(&mut a, 'v', 0, 0, Token::On);
        draw_char(&mut b, 'V', 0, 0, Token::On);
        assert_ne!(a, b);
    }
}
