use crate::token::Token;

/// One of the three logical canvases effects are authored against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// 32×32
    Square,
    /// 64 cols × 32 rows
    Wide,
    /// 32 cols × 64 rows
    Tall,
}

impl Resolution {
    pub const WIDE_ABOVE: f64 = 1.5;
    pub const TALL_BELOW: f64 = 0.66;

    /// Picks the bucket for a cols/rows aspect ratio.
    pub fn for_aspect(ratio: f64) -> Self {
        if ratio > Self::WIDE_ABOVE {
            Resolution::Wide
        } else if ratio < Self::TALL_BELOW {
            Resolution::Tall
        } else {
            Resolution::Square
        }
    }

    pub fn cols(self) -> u16 {
        match self {
            Resolution::Wide => 64,
            Resolution::Square | Resolution::Tall => 32,
        }
    }

    pub fn rows(self) -> u16 {
        match self {
            Resolution::Tall => 64,
            Resolution::Square | Resolution::Wide => 32,
        }
    }
}

/// Logical dimensions and the two named tokens, as advertised to effects.
///
/// Effects must read this every tick; it changes on resize.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub cols: u16,
    pub rows: u16,
}

impl Config {
    pub const NOISE: Token = Token::Noise;
    pub const ON: Token = Token::On;

    pub fn for_resolution(res: Resolution) -> Self {
        Self {
            cols: res.cols(),
            rows: res.rows(),
        }
    }

    pub fn is_vertical(&self) -> bool {
        self.rows > self.cols
    }
}

/// Row-major grid of tokens.
///
/// Drawing through [`FrameBuffer::set`] takes signed coordinates and ignores
/// anything off the grid, so effects can draw partially visible shapes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    cols: u16,
    rows: u16,
    cells: Vec<Token>,
}

impl FrameBuffer {
    pub fn new(cols: u16, rows: u16, fill: Token) -> Self {
        Self {
            cols,
            rows,
            cells: vec![fill; cols as usize * rows as usize],
        }
    }

    pub fn for_resolution(res: Resolution, fill: Token) -> Self {
        Self::new(res.cols(), res.rows(), fill)
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn config(&self) -> Config {
        Config {
            cols: self.cols,
            rows: self.rows,
        }
    }

    fn idx(&self, col: i32, row: i32) -> Option<usize> {
        if col < 0 || row < 0 || col >= self.cols as i32 || row >= self.rows as i32 {
            return None;
        }
        Some(row as usize * self.cols as usize + col as usize)
    }

    pub fn get(&self, col: i32, row: i32) -> Option<Token> {
        self.idx(col, row).map(|i| self.cells[i])
    }

    /// Returns false when the coordinate is off the grid.
    pub fn set(&mut self, col: i32, row: i32, token: Token) -> bool {
        match self.idx(col, row) {
            Some(i) => {
                self.cells[i] = token;
                true
            }
            None => false,
        }
    }

    pub fn fill(&mut self, token: Token) {
        self.cells.fill(token);
    }

    pub fn row(&self, row: u16) -> &[Token] {
        let start = row as usize * self.cols as usize;
        &self.cells[start..start + self.cols as usize]
    }

    pub fn cells(&self) -> &[Token] {
        &self.cells
    }
}
