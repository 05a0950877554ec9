//! Seam between the core and whatever displays the cells.
//!
//! The engine never touches a terminal or a window directly. It talks to a
//! [`Surface`] for output and receives [`HostEvent`]s for input, which keeps
//! the core runnable headless.

use crate::dimensions::{visual_grid_for_viewport, PixelLimits};
use crate::error::CoreError;
use crate::input::{Modifiers, Rect};
use crate::token::Token;
use std::time::Instant;

/// Output surface: one element per visual cell, row-major.
pub trait Surface {
    /// Attaches to the host container. Fails when the container is absent.
    fn bind(&mut self) -> Result<(), CoreError>;

    /// Adopts a new viewport (host units) and returns the visual grid size for it.
    fn fit_viewport(&mut self, width: u32, height: u32) -> (u16, u16);

    /// Column count changed; elements flow into the new layout.
    fn layout(&mut self, cols: u16, rows: u16);

    /// Recreates every output element. Only called when the cell count changes.
    fn rebuild(&mut self, len: usize) -> Result<(), CoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes one element. False when there is no element at `index`.
    fn write(&mut self, index: usize, token: Token) -> bool;

    fn flush(&mut self) -> Result<(), CoreError> {
        Ok(())
    }

    /// Bounding rectangle of the cell area, in the same units as pointer events.
    fn rect(&self) -> Option<Rect>;

    /// Returns the new viewport when toggling changed it.
    fn toggle_fullscreen(&mut self) -> Result<Option<(u32, u32)>, CoreError> {
        Ok(None)
    }
}

/// Commands that are not part of the effect-facing input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    NextEffect,
}

#[derive(Clone, Debug, PartialEq)]
pub enum HostEvent {
    Resize { width: u32, height: u32 },
    KeyDown { key: String, modifiers: Modifiers, repeat: bool },
    KeyUp { key: String },
    PointerMove { x: f64, y: f64 },
    PointerDown { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
    PointerLeave,
    /// Layout moved without a resize; the cached rect is stale.
    Scroll,
    Command(Command),
}

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Clock that only moves when told to.
#[derive(Default)]
pub struct ManualClock {
    now: std::cell::Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: std::cell::Cell::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// In-memory surface sized in pixels, like a browser page.
#[derive(Clone, Debug)]
pub struct HeadlessSurface {
    attached: bool,
    limits: PixelLimits,
    cols: u16,
    rows: u16,
    pixel: u32,
    elements: Vec<Token>,
    writes: u64,
    rebuilds: u32,
    fullscreen: bool,
}

impl HeadlessSurface {
    pub fn new(limits: PixelLimits) -> Self {
        Self {
            attached: true,
            limits,
            cols: 0,
            rows: 0,
            pixel: limits.min.max(1),
            elements: Vec::new(),
            writes: 0,
            rebuilds: 0,
            fullscreen: false,
        }
    }

    /// A surface whose container does not exist.
    pub fn detached() -> Self {
        Self {
            attached: false,
            ..Self::new(PixelLimits::default())
        }
    }

    /// Drops the element at `index`, as if it vanished mid-resize.
    pub fn remove_element(&mut self, index: usize) {
        if index < self.elements.len() {
            self.elements.truncate(index);
        }
    }

    pub fn element(&self, index: usize) -> Option<Token> {
        self.elements.get(index).copied()
    }

    pub fn cell(&self, col: u16, row: u16) -> Option<Token> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.element(row as usize * self.cols as usize + col as usize)
    }

    /// Total element writes since creation.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn rebuilds(&self) -> u32 {
        self.rebuilds
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn pixel(&self) -> u32 {
        self.pixel
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn render_text(&self) -> String {
        let mut out = String::with_capacity((self.cols as usize + 1) * self.rows as usize);
        for row in 0..self.rows {
            for col in 0..self.cols {
                out.push(self.cell(col, row).map(Token::glyph).unwrap_or(' '));
            }
            out.push('\n');
        }
        out
    }
}

impl Surface for HeadlessSurface {
    fn bind(&mut self) -> Result<(), CoreError> {
        if self.attached {
            Ok(())
        } else {
            Err(CoreError::SurfaceMissing(
                "headless container detached".to_string(),
            ))
        }
    }

    fn fit_viewport(&mut self, width: u32, height: u32) -> (u16, u16) {
        let g = visual_grid_for_viewport(width, height, self.limits);
        self.pixel = g.pixel;
        (g.cols, g.rows)
    }

    fn layout(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
    }

    fn rebuild(&mut self, len: usize) -> Result<(), CoreError> {
        self.elements = vec![Token::Empty; len];
        self.rebuilds += 1;
        Ok(())
    }

    fn len(&self) -> usize {
        self.elements.len()
    }

    fn write(&mut self, index: usize, token: Token) -> bool {
        match self.elements.get_mut(index) {
            Some(slot) => {
                *slot = token;
                self.writes += 1;
                true
            }
            None => false,
        }
    }

    fn rect(&self) -> Option<Rect> {
        Some(Rect {
            left: 0.0,
            top: 0.0,
            width: (self.cols as u32 * self.pixel) as f64,
            height: (self.rows as u32 * self.pixel) as f64,
        })
    }

    fn toggle_fullscreen(&mut self) -> Result<Option<(u32, u32)>, CoreError> {
        self.fullscreen = !self.fullscreen;
        Ok(None)
    }
}
