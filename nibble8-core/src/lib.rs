//! Instruction engine for a small 8-bit virtual machine
//!
//! The engine owns the memory image, the registers, the call stack and the
//! two countdown timers. Everything with real-world timing or output is
//! left to the host: it calls [`Chip8Interpreter::step`] at its chosen
//! instruction rate, [`Chip8Interpreter::tick`] at 60 Hz, and supplies a
//! [`Chip8Display`] to draw on.
mod display;
mod error;
mod interpreter;
mod keyboard;
mod state;

pub mod disasm;

pub use display::{Chip8Display, FrameBuffer, DISPLAY_HEIGHT, DISPLAY_WIDTH};
pub use error::{Error, Result};
pub use interpreter::Chip8Interpreter;
pub use keyboard::{Keypad, KEY_COUNT};
pub use state::{
    Chip8State, GLYPH_REGION_END, MAX_PROGRAM_SIZE, MEMORY_SIZE, PROGRAM_START, STACK_DEPTH,
};
