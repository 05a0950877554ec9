use crate::dimensions::Dimensions;
use crate::error::CoreError;
use crate::frame::FrameBuffer;
use crate::host::Surface;
use crate::token::Token;

/// Maps the logical buffer onto the visual grid and writes only changed cells.
///
/// Keeps the last token written to every visual element. Output work is
/// bounded by the number of cells that changed, not by the grid size.
#[derive(Clone, Debug, Default)]
pub struct Renderer {
    rendered: Vec<Option<Token>>,
    last_writes: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every cached cell. Call whenever the surface is rebuilt.
    pub fn reset(&mut self, visual_len: usize) {
        self.rendered.clear();
        self.rendered.resize(visual_len, None);
    }

    pub fn cached(&self, index: usize) -> Option<Token> {
        self.rendered.get(index).copied().flatten()
    }

    pub fn last_writes(&self) -> usize {
        self.last_writes
    }

    /// Returns the number of elements written.
    pub fn present<S: Surface + ?Sized>(
        &mut self,
        dims: &Dimensions,
        logical: &FrameBuffer,
        surface: &mut S,
    ) -> Result<usize, CoreError> {
        let cols = dims.visual_cols() as usize;
        let logical_cols = dims.logical_cols() as i32;
        let logical_rows = dims.logical_rows() as i32;
        let mut writes = 0;

        for r in 0..dims.visual_rows() as i32 {
            let (_, lr) = dims.visual_to_logical(0, r);
            let row_valid = (0..logical_rows).contains(&lr);

            for c in 0..cols as i32 {
                let idx = r as usize * cols + c as usize;
                let Some(slot) = self.rendered.get_mut(idx) else {
                    continue;
                };

                let (lc, _) = dims.visual_to_logical(c, 0);
                let target = if row_valid && (0..logical_cols).contains(&lc) {
                    logical.get(lc, lr).unwrap_or(Token::Empty)
                } else {
                    Token::Empty
                };

                if *slot != Some(target) && surface.write(idx, target) {
                    *slot = Some(target);
                    writes += 1;
                }
            }
        }

        surface.flush()?;
        self.last_writes = writes;
        Ok(writes)
    }
}
