//! crossterm host: each LED is two terminal columns by one row.

use crate::error::CoreError;
use crate::host::{Command, HostEvent, Surface};
use crate::input::{Modifiers, Rect};
use crate::token::Token;
use crossterm::{
    cursor,
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        MouseButton, MouseEventKind, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::time::Duration;

/// Terminal columns per LED.
pub const CELL_COLS: u16 = 2;

pub(crate) fn token_color(token: Token) -> Color {
    match token {
        Token::Empty => Color::Reset,
        Token::Noise => Color::DarkGrey,
        Token::On => Color::White,
        Token::Red => Color::Red,
        Token::Orange => Color::Rgb {
            r: 255,
            g: 140,
            b: 0,
        },
        Token::Yellow => Color::Yellow,
        Token::Green => Color::Green,
        Token::Blue => Color::Blue,
        Token::Purple => Color::Magenta,
        Token::System => Color::Cyan,
    }
}

pub(crate) fn token_glyph(token: Token) -> &'static str {
    match token {
        Token::Empty => "  ",
        Token::Noise => " ·",
        _ => "██",
    }
}

pub struct TerminalSurface {
    out: io::Stdout,
    term_cols: u16,
    term_rows: u16,
    status_line: bool,
    cols: u16,
    rows: u16,
    elements: Vec<Token>,
    dirty: Vec<usize>,
    repaint: bool,
    status: String,
    status_dirty: bool,
    enhanced_keys: bool,
    active: bool,
}

impl TerminalSurface {
    pub fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            EnableMouseCapture,
            EnableFocusChange,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        // key release events where the terminal can report them
        let enhanced_keys = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if enhanced_keys {
            execute!(
                out,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let (term_cols, term_rows) = terminal::size()?;
        Ok(Self {
            out,
            term_cols,
            term_rows,
            status_line: true,
            cols: 0,
            rows: 0,
            elements: Vec::new(),
            dirty: Vec::new(),
            repaint: true,
            status: String::new(),
            status_dirty: true,
            enhanced_keys,
            active: true,
        })
    }

    pub fn end(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        if self.enhanced_keys {
            queue!(self.out, PopKeyboardEnhancementFlags)?;
        }
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            DisableMouseCapture,
            DisableFocusChange,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Whether the terminal reports key releases itself.
    pub fn reports_key_release(&self) -> bool {
        self.enhanced_keys
    }

    /// Terminal size in character cells.
    pub fn viewport(&self) -> (u32, u32) {
        (self.term_cols as u32, self.term_rows as u32)
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.status {
            self.status = text;
            self.status_dirty = true;
        }
    }

    fn paint(&mut self, index: usize) -> io::Result<()> {
        let cols = self.cols.max(1) as usize;
        let (col, row) = ((index % cols) as u16, (index / cols) as u16);
        let token = self.elements.get(index).copied().unwrap_or_default();
        queue!(
            self.out,
            cursor::MoveTo(col * CELL_COLS, row),
            SetForegroundColor(token_color(token)),
            Print(token_glyph(token))
        )
    }

    fn paint_status(&mut self) -> io::Result<()> {
        if !self.status_line || self.term_rows == 0 {
            return Ok(());
        }
        let width = self.term_cols as usize;
        let mut line: String = self.status.chars().take(width).collect();
        let pad = width.saturating_sub(line.chars().count());
        line.extend(std::iter::repeat(' ').take(pad));
        queue!(
            self.out,
            cursor::MoveTo(0, self.term_rows - 1),
            SetForegroundColor(Color::DarkGrey),
            Print(line)
        )
    }
}

impl Surface for TerminalSurface {
    fn bind(&mut self) -> Result<(), CoreError> {
        if self.term_cols < CELL_COLS || self.term_rows < 2 {
            return Err(CoreError::SurfaceMissing(format!(
                "terminal too small ({}x{})",
                self.term_cols, self.term_rows
            )));
        }
        Ok(())
    }

    fn fit_viewport(&mut self, width: u32, height: u32) -> (u16, u16) {
        self.term_cols = width.min(u16::MAX as u32) as u16;
        self.term_rows = height.min(u16::MAX as u32) as u16;
        self.repaint = true;
        let reserved = u16::from(self.status_line);
        (
            self.term_cols / CELL_COLS,
            self.term_rows.saturating_sub(reserved),
        )
    }

    fn layout(&mut self, cols: u16, rows: u16) {
        if (cols, rows) != (self.cols, self.rows) {
            // same elements, new positions: everything moves on screen
            self.repaint = true;
        }
        self.cols = cols;
        self.rows = rows;
    }

    fn rebuild(&mut self, len: usize) -> Result<(), CoreError> {
        self.elements = vec![Token::Empty; len];
        self.dirty.clear();
        self.repaint = true;
        Ok(())
    }

    fn len(&self) -> usize {
        self.elements.len()
    }

    fn write(&mut self, index: usize, token: Token) -> bool {
        let Some(slot) = self.elements.get_mut(index) else {
            return false;
        };
        *slot = token;
        if !self.repaint {
            self.dirty.push(index);
        }
        true
    }

    fn flush(&mut self) -> Result<(), CoreError> {
        queue!(self.out, BeginSynchronizedUpdate)?;
        if self.repaint {
            queue!(self.out, ResetColor, Clear(ClearType::All))?;
            for i in 0..self.elements.len() {
                self.paint(i)?;
            }
            self.status_dirty = true;
        } else {
            let dirty = std::mem::take(&mut self.dirty);
            for &i in &dirty {
                self.paint(i)?;
            }
            self.dirty = dirty;
        }
        if self.status_dirty {
            self.paint_status()?;
        }
        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;

        self.dirty.clear();
        self.repaint = false;
        self.status_dirty = false;
        Ok(())
    }

    fn rect(&self) -> Option<Rect> {
        Some(Rect {
            left: 0.0,
            top: 0.0,
            width: (self.cols as u32 * CELL_COLS as u32) as f64,
            height: self.rows as f64,
        })
    }

    fn toggle_fullscreen(&mut self) -> Result<Option<(u32, u32)>, CoreError> {
        self.status_line = !self.status_line;
        Ok(Some(self.viewport()))
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        let _ = self.end();
    }
}

/* --- input --- */

/// Turns crossterm events into [`HostEvent`]s.
///
/// Most terminals never report key releases, only presses and OS
/// auto-repeats. For those, a fresh press stays held for `repeat_delay_ms`,
/// long enough for the first auto-repeat to arrive. Once a key repeats it is
/// released `release_after_ms` after its last repeat. Presses inside either
/// window are auto-repeats.
pub struct TerminalInput {
    release_after_ms: u64,
    repeat_delay_ms: u64,
    reports_release: bool,
    held: HashMap<String, Held>,
}

#[derive(Clone, Copy, Debug)]
struct Held {
    last_ms: u64,
    repeating: bool,
}

impl TerminalInput {
    pub fn new(release_after_ms: u64, repeat_delay_ms: u64, reports_release: bool) -> Self {
        Self {
            release_after_ms,
            repeat_delay_ms: repeat_delay_ms.max(release_after_ms),
            reports_release,
            held: HashMap::new(),
        }
    }

    /// Waits up to `timeout` for the first event, then drains what is queued.
    pub fn poll(&mut self, timeout: Duration, now_ms: u64) -> anyhow::Result<Vec<HostEvent>> {
        let mut out = Vec::new();
        let mut wait = timeout;
        while event::poll(wait)? {
            let ev = event::read()?;
            out.extend(self.translate(ev, now_ms));
            wait = Duration::ZERO;
            if out.len() >= 64 {
                break;
            }
        }
        out.extend(self.expire(now_ms));
        Ok(out)
    }

    pub fn translate(&mut self, ev: Event, now_ms: u64) -> Vec<HostEvent> {
        match ev {
            Event::Key(k) => self.key(k, now_ms).into_iter().collect(),
            Event::Mouse(m) => {
                let (x, y) = (m.column as f64, m.row as f64);
                let ev = match m.kind {
                    MouseEventKind::Down(MouseButton::Left) => HostEvent::PointerDown { x, y },
                    MouseEventKind::Up(MouseButton::Left) => HostEvent::PointerUp { x, y },
                    MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                        HostEvent::PointerMove { x, y }
                    }
                    MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => HostEvent::Scroll,
                    _ => return Vec::new(),
                };
                vec![ev]
            }
            Event::Resize(w, h) => vec![HostEvent::Resize {
                width: w as u32,
                height: h as u32,
            }],
            Event::FocusLost => vec![HostEvent::PointerLeave],
            _ => Vec::new(),
        }
    }

    /// Synthesized releases for keys whose window ran out.
    pub fn expire(&mut self, now_ms: u64) -> Vec<HostEvent> {
        if self.reports_release {
            return Vec::new();
        }
        let (repeat_window, first_window) = (self.release_after_ms, self.repeat_delay_ms);
        let mut released = Vec::new();
        self.held.retain(|key, held| {
            let window = if held.repeating {
                repeat_window
            } else {
                first_window
            };
            if now_ms.saturating_sub(held.last_ms) > window {
                released.push(HostEvent::KeyUp { key: key.clone() });
                false
            } else {
                true
            }
        });
        released
    }

    fn key(&mut self, k: KeyEvent, now_ms: u64) -> Option<HostEvent> {
        let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);
        if k.kind != KeyEventKind::Release {
            match k.code {
                KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
                    return Some(HostEvent::Command(Command::Quit))
                }
                KeyCode::Char('n') if ctrl => return Some(HostEvent::Command(Command::NextEffect)),
                _ => {}
            }
        }

        let key = key_name(k.code)?;
        match k.kind {
            KeyEventKind::Release => {
                self.reports_release = true;
                self.held.remove(&key);
                Some(HostEvent::KeyUp { key })
            }
            kind => {
                let repeat = kind == KeyEventKind::Repeat
                    || (!self.reports_release && self.held.contains_key(&key));
                self.held.insert(
                    key.clone(),
                    Held {
                        last_ms: now_ms,
                        repeating: repeat,
                    },
                );
                Some(HostEvent::KeyDown {
                    key,
                    modifiers: modifiers(k.modifiers, k.code),
                    repeat,
                })
            }
        }
    }
}

/// Browser-style key names, so effects see the same keys on every host.
pub(crate) fn key_name(code: KeyCode) -> Option<String> {
    let name = match code {
        KeyCode::Char(c) => return Some(c.to_string()),
        KeyCode::Up => "ArrowUp",
        KeyCode::Down => "ArrowDown",
        KeyCode::Left => "ArrowLeft",
        KeyCode::Right => "ArrowRight",
        KeyCode::Enter => "Enter",
        KeyCode::Esc => "Escape",
        KeyCode::Tab => "Tab",
        KeyCode::Backspace => "Backspace",
        KeyCode::Delete => "Delete",
        KeyCode::Home => "Home",
        KeyCode::End => "End",
        KeyCode::PageUp => "PageUp",
        KeyCode::PageDown => "PageDown",
        _ => return None,
    };
    Some(name.to_string())
}

fn modifiers(m: KeyModifiers, code: KeyCode) -> Modifiers {
    // terminals flag shifted characters even though the character already says so
    let shifted_char = matches!(code, KeyCode::Char(c) if !c.is_ascii_lowercase());
    Modifiers {
        ctrl: m.contains(KeyModifiers::CONTROL),
        alt: m.contains(KeyModifiers::ALT),
        meta: m.contains(KeyModifiers::SUPER) || m.contains(KeyModifiers::META),
        shift: m.contains(KeyModifiers::SHIFT) && !shifted_char,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyInput;
    use crossterm::event::{KeyEventState, MouseEvent};

    fn feed(keys: &mut KeyInput, events: Vec<HostEvent>, now_ms: u64) {
        for ev in events {
            match ev {
                HostEvent::KeyDown {
                    key,
                    modifiers,
                    repeat,
                } => {
                    keys.key_down(&key, modifiers, repeat, now_ms);
                }
                HostEvent::KeyUp { key } => keys.key_up(&key),
                _ => {}
            }
        }
    }

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn release(code: KeyCode) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        })
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn arrows_get_browser_names() {
        let mut input = TerminalInput::new(250, 700, false);
        let evs = input.translate(press(KeyCode::Up), 0);
        assert_eq!(
            evs,
            vec![HostEvent::KeyDown {
                key: "ArrowUp".into(),
                modifiers: Modifiers::default(),
                repeat: false,
            }]
        );
    }

    #[test]
    fn releases_are_synthesized_after_the_window() {
        let mut input = TerminalInput::new(250, 700, false);
        input.translate(press(KeyCode::Char('w')), 0);
        let again = input.translate(press(KeyCode::Char('w')), 100);
        assert!(matches!(again[0], HostEvent::KeyDown { repeat: true, .. }));

        assert!(input.expire(300).is_empty());
        assert_eq!(input.expire(351), vec![HostEvent::KeyUp { key: "w".into() }]);
        assert!(input.expire(1_000).is_empty());
    }

    #[test]
    fn real_releases_switch_off_synthesis() {
        let mut input = TerminalInput::new(250, 700, false);
        input.translate(press(KeyCode::Char('s')), 0);
        let up = input.translate(release(KeyCode::Char('s')), 50);
        assert_eq!(up, vec![HostEvent::KeyUp { key: "s".into() }]);

        input.translate(press(KeyCode::Char('s')), 60);
        assert!(input.expire(10_000).is_empty());
        let again = input.translate(press(KeyCode::Char('s')), 70);
        assert!(matches!(again[0], HostEvent::KeyDown { repeat: false, .. }));
    }

    #[test]
    fn control_chords_become_commands() {
        let mut input = TerminalInput::new(250, 700, false);
        let quit = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(
            input.translate(quit, 0),
            vec![HostEvent::Command(Command::Quit)]
        );
        let next = Event::Key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL));
        assert_eq!(
            input.translate(next, 0),
            vec![HostEvent::Command(Command::NextEffect)]
        );
    }

    #[test]
    fn escape_and_tab_reach_effects() {
        let mut input = TerminalInput::new(250, 700, false);
        let mut keys = KeyInput::new(16);
        for code in [KeyCode::Esc, KeyCode::Tab] {
            feed(&mut keys, input.translate(press(code), 0), 0);
        }
        let queued: Vec<&str> = keys.queue().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(queued, ["ESCAPE", "TAB"]);
    }

    #[test]
    fn key_stays_held_until_auto_repeat_starts() {
        let mut input = TerminalInput::new(250, 700, false);
        let mut keys = KeyInput::new(16);

        feed(&mut keys, input.translate(press(KeyCode::Char('w')), 0), 0);
        feed(&mut keys, input.expire(300), 300);
        assert!(keys.is_held("W"));

        // first OS auto-repeat
        feed(&mut keys, input.translate(press(KeyCode::Char('w')), 500), 500);
        feed(&mut keys, input.translate(press(KeyCode::Char('w')), 530), 530);
        feed(&mut keys, input.expire(700), 700);
        assert!(keys.is_held("W"));
        assert_eq!(keys.len(), 1);

        // repeats stopped: released on the short window
        feed(&mut keys, input.expire(781), 781);
        assert!(!keys.is_held("W"));
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn a_single_tap_is_released_after_the_repeat_delay() {
        let mut input = TerminalInput::new(250, 700, false);
        input.translate(press(KeyCode::Char('s')), 0);
        assert!(input.expire(700).is_empty());
        assert_eq!(input.expire(701), vec![HostEvent::KeyUp { key: "s".into() }]);
    }

    #[test]
    fn shifted_characters_are_not_chords() {
        let m = modifiers(KeyModifiers::SHIFT, KeyCode::Char('W'));
        assert!(!m.any());
        let m = modifiers(KeyModifiers::SHIFT, KeyCode::Up);
        assert!(m.shift);
    }

    #[test]
    fn mouse_maps_to_pointer_events() {
        let mut input = TerminalInput::new(250, 700, false);
        assert_eq!(
            input.translate(mouse(MouseEventKind::Down(MouseButton::Left), 7, 3), 0),
            vec![HostEvent::PointerDown { x: 7.0, y: 3.0 }]
        );
        assert_eq!(
            input.translate(mouse(MouseEventKind::Drag(MouseButton::Left), 8, 3), 0),
            vec![HostEvent::PointerMove { x: 8.0, y: 3.0 }]
        );
        assert!(input
            .translate(mouse(MouseEventKind::Down(MouseButton::Right), 1, 1), 0)
            .is_empty());
    }

    #[test]
    fn lit_tokens_fill_both_columns() {
        assert_eq!(token_glyph(Token::Red), "██");
        assert_eq!(token_glyph(Token::Empty), "  ");
        assert_eq!(token_color(Token::System), Color::Cyan);
    }
}
