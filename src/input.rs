use crate::dimensions::Dimensions;
use std::collections::{HashSet, VecDeque};

pub const DEFAULT_KEY_CAPACITY: usize = 300;
pub const DEFAULT_LONG_PRESS_MS: u64 = 800;

/// Keydown as seen by effects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub timestamp_ms: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
    pub shift: bool,
}

impl Modifiers {
    pub fn any(self) -> bool {
        self.ctrl || self.alt || self.meta || self.shift
    }
}

/// Upper-cases a host key name (`"w"` → `"W"`, `"ArrowUp"` → `"ARROWUP"`).
pub fn normalize_key(raw: &str) -> String {
    raw.to_uppercase()
}

/// Keyboard state: a bounded FIFO of one-shot presses plus the set of keys
/// currently held down.
#[derive(Clone, Debug)]
pub struct KeyInput {
    queue: VecDeque<KeyEvent>,
    capacity: usize,
    held: HashSet<String>,
}

impl Default for KeyInput {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_CAPACITY)
    }
}

impl KeyInput {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: VecDeque::with_capacity(capacity),
            capacity,
            held: HashSet::new(),
        }
    }

    /// Records a keydown. Auto-repeats and modifier chords are dropped.
    ///
    /// Returns whether the press was queued.
    pub fn key_down(&mut self, raw: &str, mods: Modifiers, repeat: bool, now_ms: u64) -> bool {
        if repeat || mods.any() {
            return false;
        }
        let key = normalize_key(raw);
        if self.queue.len() == self.capacity {
            self.queue.pop_front();
        }
        self.queue.push_back(KeyEvent {
            key: key.clone(),
            timestamp_ms: now_ms,
        });
        self.held.insert(key);
        true
    }

    pub fn key_up(&mut self, raw: &str) {
        self.held.remove(&normalize_key(raw));
    }

    /// `key` must already be normalized.
    pub fn is_held(&self, key: &str) -> bool {
        self.held.contains(key)
    }

    /// Oldest first.
    pub fn queue(&self) -> &VecDeque<KeyEvent> {
        &self.queue
    }

    /// Takes every queued press. Each press is delivered at most once.
    pub fn drain(&mut self) -> Vec<KeyEvent> {
        self.queue.drain(..).collect()
    }

    /// Removes the oldest queued press of `key`, if any.
    pub fn take_key(&mut self, key: &str) -> Option<KeyEvent> {
        let pos = self.queue.iter().position(|e| e.key == key)?;
        self.queue.remove(pos)
    }

    pub fn expire_older_than(&mut self, now_ms: u64, max_age_ms: u64) {
        while let Some(front) = self.queue.front() {
            if now_ms.saturating_sub(front.timestamp_ms) > max_age_ms {
                self.queue.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Host-space rectangle of the display surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && y >= self.top && x < self.left + self.width && y < self.top + self.height
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellPos {
    pub col: u16,
    pub row: u16,
}

/// Maps pointer coordinates to logical cells through a cached surface rect.
#[derive(Clone, Debug, Default)]
pub struct PointerTracker {
    rect: Option<Rect>,
    position: Option<CellPos>,
}

impl PointerTracker {
    /// Refresh the cached rect. Call on resize, scroll and fullscreen changes only.
    pub fn set_rect(&mut self, rect: Option<Rect>) {
        self.rect = rect;
    }

    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    pub fn position(&self) -> Option<CellPos> {
        self.position
    }

    pub fn leave(&mut self) {
        self.position = None;
    }

    /// Updates and returns the logical cell under `(x, y)`.
    ///
    /// Points outside the surface clear the position. Points on padding are
    /// clamped onto the nearest logical cell.
    pub fn pointer_move(&mut self, x: f64, y: f64, dims: &Dimensions) -> Option<CellPos> {
        self.position = self.locate(x, y, dims);
        self.position
    }

    fn locate(&self, x: f64, y: f64, dims: &Dimensions) -> Option<CellPos> {
        let rect = self.rect?;
        if !rect.contains(x, y) || dims.visual_len() == 0 {
            return None;
        }
        let cell_w = rect.width / dims.visual_cols() as f64;
        let cell_h = rect.height / dims.visual_rows() as f64;
        let vc = ((x - rect.left) / cell_w).floor() as i32;
        let vr = ((y - rect.top) / cell_h).floor() as i32;

        let (lc, lr) = dims.visual_to_logical(vc, vr);
        Some(CellPos {
            col: lc.clamp(0, dims.logical_cols() as i32 - 1) as u16,
            row: lr.clamp(0, dims.logical_rows() as i32 - 1) as u16,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureAction {
    ToggleFullscreen,
    CycleNext,
}

/// Press-and-hold detector.
///
/// A hold past the threshold toggles fullscreen and swallows the release; a
/// shorter press cycles to the next effect on release.
#[derive(Clone, Debug)]
pub struct PressGesture {
    long_press_ms: u64,
    pressed_at: Option<u64>,
    long_fired: bool,
}

impl Default for PressGesture {
    fn default() -> Self {
        Self::new(DEFAULT_LONG_PRESS_MS)
    }
}

impl PressGesture {
    pub fn new(long_press_ms: u64) -> Self {
        Self {
            long_press_ms,
            pressed_at: None,
            long_fired: false,
        }
    }

    pub fn press(&mut self, now_ms: u64) {
        self.pressed_at = Some(now_ms);
        self.long_fired = false;
    }

    /// Fires the long press once the hold passes the threshold.
    pub fn poll(&mut self, now_ms: u64) -> Option<GestureAction> {
        let at = self.pressed_at?;
        if !self.long_fired && now_ms.saturating_sub(at) >= self.long_press_ms {
            self.long_fired = true;
            return Some(GestureAction::ToggleFullscreen);
        }
        None
    }

    pub fn release(&mut self, now_ms: u64) -> Option<GestureAction> {
        let at = self.pressed_at.take()?;
        if std::mem::take(&mut self.long_fired) {
            return None;
        }
        if now_ms.saturating_sub(at) >= self.long_press_ms {
            // held long enough but no poll ran in between
            return Some(GestureAction::ToggleFullscreen);
        }
        Some(GestureAction::CycleNext)
    }

    pub fn cancel(&mut self) {
        self.pressed_at = None;
        self.long_fired = false;
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed_at.is_some()
    }
}
