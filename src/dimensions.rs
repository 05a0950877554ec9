use crate::frame::{Config, Resolution};
use tracing::debug;

/// Bounds for the on-screen size of one cell, in host pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelLimits {
    pub min: u32,
    pub max: u32,
}

impl Default for PixelLimits {
    fn default() -> Self {
        Self { min: 8, max: 24 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisualGrid {
    pub cols: u16,
    pub rows: u16,
    pub pixel: u32,
}

/// Sizes a visual grid that fills a `width`×`height` viewport.
///
/// Aims for roughly 36 cells on the short side (70 on the long side of very
/// wide or tall viewports) and clamps the cell size into `limits`.
pub fn visual_grid_for_viewport(width: u32, height: u32, limits: PixelLimits) -> VisualGrid {
    let aspect = width as f64 / height.max(1) as f64;
    let (target_cols, target_rows) = if aspect < 0.65 {
        (36, 70)
    } else if aspect > 1.6 {
        (70, 36)
    } else {
        (36, 36)
    };

    let from_w = width / target_cols;
    let from_h = height / target_rows;
    let pixel = from_w.min(from_h).clamp(limits.min.max(1), limits.max.max(limits.min.max(1)));

    VisualGrid {
        cols: (width / pixel).min(u16::MAX as u32) as u16,
        rows: (height / pixel).min(u16::MAX as u32) as u16,
        pixel,
    }
}

/// What a call to [`Dimensions::set_dimensions`] invalidated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DimensionChange {
    /// The logical bucket changed; the logical buffer must be reallocated.
    pub bucket_changed: bool,
    /// The total number of visual cells changed; the output surface must be rebuilt.
    pub rebuild_surface: bool,
    /// Visual or logical sizes moved; offsets were recomputed.
    pub resized: bool,
}

/// Visual grid size, logical bucket and the centering offsets between them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dimensions {
    visual_cols: u16,
    visual_rows: u16,
    resolution: Resolution,
    offset_x: i32,
    offset_y: i32,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::new()
    }
}

impl Dimensions {
    /// No visual grid yet; the first `set_dimensions` always asks for a rebuild.
    pub fn new() -> Self {
        Self {
            visual_cols: 0,
            visual_rows: 0,
            resolution: Resolution::Square,
            offset_x: 0,
            offset_y: 0,
        }
    }

    pub fn set_dimensions(&mut self, visual_cols: u16, visual_rows: u16) -> DimensionChange {
        // even width keeps the horizontal centering exact
        let visual_cols = visual_cols - visual_cols % 2;

        let aspect = visual_cols as f64 / visual_rows.max(1) as f64;
        let resolution = Resolution::for_aspect(aspect);

        let old_len = self.visual_len();
        let change = DimensionChange {
            bucket_changed: resolution != self.resolution,
            rebuild_surface: visual_cols as usize * visual_rows as usize != old_len,
            resized: visual_cols != self.visual_cols
                || visual_rows != self.visual_rows
                || resolution != self.resolution,
        };

        self.visual_cols = visual_cols;
        self.visual_rows = visual_rows;
        self.resolution = resolution;
        self.offset_x = (visual_cols as i32 - resolution.cols() as i32).div_euclid(2);
        self.offset_y = (visual_rows as i32 - resolution.rows() as i32).div_euclid(2);

        if change.resized {
            debug!(
                visual_cols,
                visual_rows,
                logical = ?resolution,
                offset_x = self.offset_x,
                offset_y = self.offset_y,
                "dimensions changed"
            );
        }
        change
    }

    pub fn visual_cols(&self) -> u16 {
        self.visual_cols
    }

    pub fn visual_rows(&self) -> u16 {
        self.visual_rows
    }

    pub fn visual_len(&self) -> usize {
        self.visual_cols as usize * self.visual_rows as usize
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn logical_cols(&self) -> u16 {
        self.resolution.cols()
    }

    pub fn logical_rows(&self) -> u16 {
        self.resolution.rows()
    }

    pub fn config(&self) -> Config {
        Config::for_resolution(self.resolution)
    }

    /// Negative only when the viewport is smaller than the logical bucket.
    pub fn offsets(&self) -> (i32, i32) {
        (self.offset_x, self.offset_y)
    }

    pub fn visual_to_logical(&self, col: i32, row: i32) -> (i32, i32) {
        (col - self.offset_x, row - self.offset_y)
    }
}
