use std::sync::atomic::{AtomicU16, Ordering};

/// Number of keys on the pad
pub const KEY_COUNT: u8 = 16;

/// State of the 16-key pad, one bit per key
///
/// The mask lives in a single atomic so that an input thread can update it
/// while the engine is running; every read and write is one atomic
/// operation, so a reader never sees a half-applied update.
#[derive(Debug, Default)]
pub struct Keypad {
    buttons: AtomicU16,
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presses or releases `key`; indices outside the pad are ignored
    pub fn set_key(&self, key: u8, pressed: bool) {
        if key >= KEY_COUNT {
            return;
        }
        let bit = 1u16 << key;
        if pressed {
            self.buttons.fetch_or(bit, Ordering::AcqRel);
        } else {
            self.buttons.fetch_and(!bit, Ordering::AcqRel);
        }
    }

    /// Replaces the whole mask at once
    pub fn set_buttons(&self, buttons: u16) {
        self.buttons.store(buttons, Ordering::Release);
    }

    pub fn buttons(&self) -> u16 {
        self.buttons.load(Ordering::Acquire)
    }

    pub fn is_key_down(&self, key: u8) -> bool {
        key < KEY_COUNT && (self.buttons() >> key) & 1 == 1
    }

    /// Lowest-indexed key currently held, if any
    pub fn lowest_pressed(&self) -> Option<u8> {
        match self.buttons() {
            0 => None,
            b => Some(b.trailing_zeros() as u8),
        }
    }
}
