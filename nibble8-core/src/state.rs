use crate::{Error, Result};

/// Size of the flat memory image
pub const MEMORY_SIZE: usize = 0x1000;

/// Address the program image is loaded at, and the initial program counter
pub const PROGRAM_START: u16 = 0x200;

/// Largest program that fits between [`PROGRAM_START`] and the end of memory
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

/// Depth of the call stack
pub const STACK_DEPTH: usize = 16;

/// Bytes per glyph sprite
pub const GLYPH_HEIGHT: u16 = 5;

/// End (exclusive) of the read-only glyph region at the bottom of memory
pub const GLYPH_REGION_END: usize = FONT.len();

const FONT: [u8; 16 * 5] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Registers, call stack, timers and memory of the machine
///
/// Memory is only reachable through bounds-checked accessors; the glyph
/// sprites in `[0x000, 0x050)` can be read but never written.
#[derive(Clone)]
pub struct Chip8State {
    pub data_registers: [u8; 16],
    pub index_register: u16,
    pub program_counter: u16,
    pub stack_pointer: u8,
    pub stack: [u16; STACK_DEPTH],
    pub delay_timer: u8,
    pub sound_timer: u8,
    ram: [u8; MEMORY_SIZE],
}

impl Default for Chip8State {
    fn default() -> Self {
        let mut ram = [0; MEMORY_SIZE];
        ram[..FONT.len()].copy_from_slice(&FONT);
        Self {
            data_registers: [0; 16],
            index_register: 0,
            program_counter: PROGRAM_START,
            stack_pointer: 0,
            stack: [0; STACK_DEPTH],
            delay_timer: 0,
            sound_timer: 0,
            ram,
        }
    }
}

impl Chip8State {
    /// Builds a fresh machine with `program` loaded at [`PROGRAM_START`]
    pub fn new(program: &[u8]) -> Result<Self> {
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(Error::ProgramTooLarge {
                size: program.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }
        let mut state = Self::default();
        let start = PROGRAM_START as usize;
        state.ram[start..start + program.len()].copy_from_slice(program);
        Ok(state)
    }

    pub fn register(&self, register_index: u8) -> u8 {
        self.data_registers[register_index as usize]
    }

    pub fn register_mut(&mut self, register_index: u8) -> &mut u8 {
        &mut self.data_registers[register_index as usize]
    }

    pub fn set_flag(&mut self, flag: bool) {
        *self.register_mut(0xF) = flag as u8;
    }

    /// Read-only view of the whole memory image
    pub fn memory(&self) -> &[u8] {
        &self.ram
    }

    /// Returns `len` bytes starting at `addr`
    pub fn read(&self, addr: u16, len: usize) -> Result<&[u8]> {
        let start = addr as usize;
        let end = start + len;
        if end > MEMORY_SIZE {
            return Err(Error::OutOfBounds {
                address: start.max(MEMORY_SIZE),
            });
        }
        Ok(&self.ram[start..end])
    }

    /// Reads the big-endian instruction word at `pc`
    pub fn fetch(&self, pc: u16) -> Result<u16> {
        if pc % 2 != 0 {
            return Err(Error::UnalignedJump { target: pc });
        }
        let word = self.read(pc, 2)?;
        Ok(u16::from_be_bytes([word[0], word[1]]))
    }

    /// Checks that `len` bytes starting at `addr` may be written
    pub fn check_write(&self, addr: u16, len: usize) -> Result<()> {
        let start = addr as usize;
        if start < GLYPH_REGION_END && len > 0 {
            return Err(Error::ProtectedWrite { address: start });
        }
        if start + len > MEMORY_SIZE {
            return Err(Error::OutOfBounds {
                address: start.max(MEMORY_SIZE),
            });
        }
        Ok(())
    }

    /// Copies `data` into memory starting at `addr`
    pub fn write(&mut self, addr: u16, data: &[u8]) -> Result<()> {
        self.check_write(addr, data.len())?;
        let start = addr as usize;
        self.ram[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Pushes a return address; `pc` is the address of the calling instruction
    pub fn push(&mut self, return_address: u16, pc: u16) -> Result<()> {
        let sp = self.stack_pointer as usize;
        if sp >= STACK_DEPTH {
            return Err(Error::StackOverflow { pc });
        }
        self.stack[sp] = return_address;
        self.stack_pointer += 1;
        Ok(())
    }

    /// Returns the most recently pushed address without popping it
    pub fn peek(&self, pc: u16) -> Result<u16> {
        match self.stack_pointer {
            0 => Err(Error::StackUnderflow { pc }),
            sp => Ok(self.stack[sp as usize - 1]),
        }
    }

    pub fn pop(&mut self, pc: u16) -> Result<u16> {
        let address = self.peek(pc)?;
        self.stack_pointer -= 1;
        Ok(address)
    }

    /// Advances both countdown timers by one step, stopping at zero
    pub fn tick(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_loaded() {
        let s = Chip8State::default();
        assert_eq!(&s.memory()[..5], &[0xF0, 0x90, 0x90, 0x90, 0xF0]);
        assert_eq!(&s.memory()[0x4B..0x50], &[0xF0, 0x80, 0xF0, 0x80, 0x80]);
        assert_eq!(s.memory()[0x50..], [0; MEMORY_SIZE - 0x50]);
    }

    #[test]
    fn test_program_load_ok() {
        let s = Chip8State::new(&[0x00, 0xE0]).unwrap();
        assert_eq!(s.read(0x200, 2).unwrap(), &[0x00, 0xE0]);
        assert_eq!(s.program_counter, 0x200);
        assert_eq!(s.fetch(0x200).unwrap(), 0x00E0);
    }

    #[test]
    fn test_program_fills_memory() {
        let s = Chip8State::new(&[0xAB; MAX_PROGRAM_SIZE]).unwrap();
        assert_eq!(s.memory()[MEMORY_SIZE - 1], 0xAB);
    }

    #[test]
    fn test_program_too_large() {
        let err = Chip8State::new(&[0; MAX_PROGRAM_SIZE + 1]).err();
        assert_eq!(
            err,
            Some(Error::ProgramTooLarge {
                size: 0xE01,
                max: 0xE00
            })
        );
    }

    #[test]
    fn test_read_out_of_bounds() {
        let s = Chip8State::default();
        assert!(s.read(0xFFF, 1).is_ok());
        assert_eq!(s.read(0xFFF, 2), Err(Error::OutOfBounds { address: 0x1000 }));
        assert_eq!(s.fetch(0x1000), Err(Error::OutOfBounds { address: 0x1000 }));
        assert_eq!(s.fetch(0x201), Err(Error::UnalignedJump { target: 0x201 }));
    }

    #[test]
    fn test_glyphs_are_protected() {
        let mut s = Chip8State::default();
        assert_eq!(
            s.write(0x4F, &[1]),
            Err(Error::ProtectedWrite { address: 0x4F })
        );
        assert_eq!(s.memory()[0x4F], 0x80);
        s.write(0x50, &[1, 2]).unwrap();
        assert_eq!(s.read(0x50, 2).unwrap(), &[1, 2]);
    }

    #[test]
    fn test_stack_bounds() {
        let mut s = Chip8State::default();
        assert_eq!(s.pop(0x200), Err(Error::StackUnderflow { pc: 0x200 }));
        for i in 0..STACK_DEPTH as u16 {
            s.push(0x300 + i * 2, 0x200).unwrap();
        }
        assert_eq!(s.push(0x400, 0x206), Err(Error::StackOverflow { pc: 0x206 }));
        assert_eq!(s.stack_pointer, 16);
        assert_eq!(s.pop(0x200), Ok(0x31E));
        assert_eq!(s.stack_pointer, 15);
    }

    #[test]
    fn test_tick_stops_at_zero() {
        let mut s = Chip8State::default();
        s.delay_timer = 2;
        s.sound_timer = 1;
        s.tick();
        assert_eq!((s.delay_timer, s.sound_timer), (1, 0));
        s.tick();
        s.tick();
        assert_eq!((s.delay_timer, s.sound_timer), (0, 0));
    }
}
