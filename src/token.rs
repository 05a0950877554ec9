/// Color token stored in a cell.
///
/// A token never carries a concrete color; hosts decide how each one looks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Token {
    /// No color at all. Padding cells outside the logical grid are always empty.
    #[default]
    Empty,
    /// Unlit LED. Every logical cell is cleared to this before a tick.
    Noise,
    On,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    System,
}

impl Token {
    pub const ALL: [Token; 10] = [
        Token::Empty,
        Token::Noise,
        Token::On,
        Token::Red,
        Token::Orange,
        Token::Yellow,
        Token::Green,
        Token::Blue,
        Token::Purple,
        Token::System,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Token::Empty => "",
            Token::Noise => "bg-noise",
            Token::On => "on",
            Token::Red => "red",
            Token::Orange => "orange",
            Token::Yellow => "yellow",
            Token::Green => "green",
            Token::Blue => "blue",
            Token::Purple => "purple",
            Token::System => "system",
        }
    }

    pub fn from_name(name: &str) -> Option<Token> {
        Token::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn is_empty(self) -> bool {
        self == Token::Empty
    }

    /// Single character used by text dumps of a frame.
    pub fn glyph(self) -> char {
        match self {
            Token::Empty => ' ',
            Token::Noise => '.',
            Token::On => '#',
            Token::Red => 'r',
            Token::Orange => 'o',
            Token::Yellow => 'y',
            Token::Green => 'g',
            Token::Blue => 'b',
            Token::Purple => 'p',
            Token::System => 's',
        }
    }
}

/// Named palette shared with every effect. Read-only for effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Colors {
    pub off: Token,
    pub on: Token,
    pub red: Token,
    pub orange: Token,
    pub yellow: Token,
    pub green: Token,
    pub blue: Token,
    pub purple: Token,
    pub system: Token,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            off: Token::Noise,
            on: Token::On,
            red: Token::Red,
            orange: Token::Orange,
            yellow: Token::Yellow,
            green: Token::Green,
            blue: Token::Blue,
            purple: Token::Purple,
            system: Token::System,
        }
    }
}

impl Colors {
    pub fn rainbow(&self) -> [Token; 6] {
        [
            self.red,
            self.orange,
            self.yellow,
            self.green,
            self.blue,
            self.purple,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_back_to_tokens() {
        for t in Token::ALL {
            assert_eq!(Token::from_name(t.name()), Some(t));
        }
        assert_eq!(Token::from_name("magenta"), None);
    }

    #[test]
    fn palette_off_is_the_unlit_token() {
        let c = Colors::default();
        assert_eq!(c.off, Token::Noise);
        assert!(!c.rainbow().contains(&Token::Empty));
    }
}
