use std::io::{self, stdout, Stdout, Write};
use std::time::{Duration, Instant};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{self, Stylize},
    terminal,
};
use log::debug;
use nibble8_core::{Chip8Display, FrameBuffer, Keypad, KEY_COUNT};

/// Left-hand side of a qwerty keyboard, laid out like the original hex pad
const CONVENTIONAL_KEYMAP: [(char, u8); KEY_COUNT as usize] = [
    ('x', 0x0),
    ('1', 0x1),
    ('2', 0x2),
    ('3', 0x3),
    ('q', 0x4),
    ('w', 0x5),
    ('e', 0x6),
    ('a', 0x7),
    ('s', 0x8),
    ('d', 0x9),
    ('z', 0xA),
    ('c', 0xB),
    ('4', 0xC),
    ('r', 0xD),
    ('f', 0xE),
    ('v', 0xF),
];

/// How long a key counts as held after its last press or repeat event
///
/// Most terminals never report releases, so this stands in for one.
const HOLD_WINDOW: Duration = Duration::from_millis(150);

/// Renders the display into the terminal using block characters
///
/// Drawing only touches the in-memory [`FrameBuffer`]; [`present`] pushes it
/// out, which the host does once per frame.
///
/// [`present`]: TerminalDisplay::present
pub struct TerminalDisplay {
    stdout: Stdout,
    frame: FrameBuffer,
    scale: u8,
    dirty: bool,
}

impl TerminalDisplay {
    /// Switches the terminal into raw mode on an alternate screen
    pub fn new(scale: u8) -> io::Result<Self> {
        let mut stdout = stdout();
        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            terminal::Clear(terminal::ClearType::All),
            cursor::Hide
        )?;
        Ok(Self {
            stdout,
            frame: FrameBuffer::new(),
            scale,
            dirty: true,
        })
    }

    /// Repaints the terminal if anything changed since the last call
    pub fn present(&mut self) -> io::Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let cell = "█".repeat(self.scale as usize);
        let blank = " ".repeat(self.scale as usize);
        for (row, pixels) in self.frame.rows().enumerate() {
            queue!(self.stdout, cursor::MoveTo(0, row as u16))?;
            for lit in pixels {
                if *lit {
                    queue!(self.stdout, style::PrintStyledContent(cell.as_str().yellow()))?;
                } else {
                    queue!(self.stdout, style::PrintStyledContent(blank.as_str().black()))?;
                }
            }
        }
        self.stdout.flush()?;
        self.dirty = false;
        Ok(())
    }
}

impl Chip8Display for TerminalDisplay {
    fn clear(&mut self) {
        self.frame.clear();
        self.dirty = true;
    }

    fn draw(&mut self, x: u8, y: u8, row: u8) -> bool {
        self.dirty = true;
        self.frame.draw(x, y, row)
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        let _ = execute!(self.stdout, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// What the host loop should do after polling input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Feeds terminal key events into a [`Keypad`]
#[derive(Default)]
pub struct KeyInput {
    held_until: [Option<Instant>; KEY_COUNT as usize],
}

impl KeyInput {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(c: char) -> Option<u8> {
        let c = c.to_ascii_lowercase();
        CONVENTIONAL_KEYMAP
            .iter()
            .find(|(k, _)| *k == c)
            .map(|(_, key)| *key)
    }

    /// Drains pending terminal events without blocking
    pub fn poll(&mut self, keypad: &Keypad) -> io::Result<Control> {
        let now = Instant::now();
        while event::poll(Duration::ZERO)? {
            let Event::Key(evt) = event::read()? else {
                continue;
            };
            match evt.code {
                KeyCode::Esc => return Ok(Control::Quit),
                KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(Control::Quit)
                }
                KeyCode::Char(c) => match Self::map(c) {
                    Some(key) if evt.kind == KeyEventKind::Release => {
                        self.held_until[key as usize] = None;
                        keypad.set_key(key, false);
                    }
                    Some(key) => {
                        self.held_until[key as usize] = Some(now + HOLD_WINDOW);
                        keypad.set_key(key, true);
                    }
                    None => debug!("no pad key for {c:?}"),
                },
                _ => (),
            }
        }

        for (key, until) in self.held_until.iter_mut().enumerate() {
            if until.is_some_and(|t| t <= now) {
                *until = None;
                keypad.set_key(key as u8, false);
            }
        }
        Ok(Control::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keymap_covers_pad() {
        let mut seen = [false; KEY_COUNT as usize];
        for (_, key) in CONVENTIONAL_KEYMAP {
            seen[key as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_keymap_lookup() {
        assert_eq!(KeyInput::map('x'), Some(0x0));
        assert_eq!(KeyInput::map('V'), Some(0xF));
        assert_eq!(KeyInput::map('4'), Some(0xC));
        assert_eq!(KeyInput::map('p'), None);
    }
}
