use std::sync::Arc;

use log::{debug, info, log_enabled, trace, Level};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    disasm,
    state::{GLYPH_HEIGHT, MEMORY_SIZE},
    Chip8Display, Chip8State, Error, Keypad, Result,
};

/// Where the program counter goes once an instruction has been handled
enum Flow {
    /// Continue at the given address
    Jump(u16),
    /// Blocking key wait with no key held; re-run the same instruction
    Stall,
}

/// Checks that `target` is a valid place for the program counter
fn pc_target(target: u16) -> Result<u16> {
    if target as usize >= MEMORY_SIZE {
        Err(Error::OutOfBounds {
            address: target as usize,
        })
    } else if target % 2 != 0 {
        Err(Error::UnalignedJump { target })
    } else {
        Ok(target)
    }
}

/// Fetch / decode / execute engine
///
/// The host drives it by calling [`step`](Self::step) at whatever rate it
/// likes and [`tick`](Self::tick) at a fixed 60 Hz; the engine never keeps
/// time on its own.
pub struct Chip8Interpreter<D: Chip8Display> {
    state: Chip8State,
    display: D,
    keypad: Arc<Keypad>,
    rng: StdRng,
}

impl<D: Chip8Display> Chip8Interpreter<D> {
    /// Loads `program` and clears the display
    ///
    /// `seed` initialises the random source used by `Cxkk`; pass a fixed
    /// value for reproducible runs.
    pub fn new(program: &[u8], mut display: D, seed: u64) -> Result<Self> {
        let state = Chip8State::new(program)?;
        display.clear();
        info!("loaded {} byte program", program.len());
        Ok(Self {
            state,
            display,
            keypad: Arc::new(Keypad::new()),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn state(&self) -> &Chip8State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut Chip8State {
        &mut self.state
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn into_display(self) -> D {
        self.display
    }

    /// Shared handle to the key state, for input running on another thread
    pub fn keypad(&self) -> Arc<Keypad> {
        self.keypad.clone()
    }

    pub fn set_key(&self, key: u8, pressed: bool) {
        self.keypad.set_key(key, pressed);
    }

    /// True while the sound timer is running
    pub fn sound_active(&self) -> bool {
        self.state.sound_timer > 0
    }

    /// Advances the delay and sound timers by one 60 Hz step
    pub fn tick(&mut self) {
        self.state.tick();
    }

    /// Executes a single instruction
    ///
    /// Returns `Ok(false)` when a blocking key wait (`Fx0A`) found no key
    /// held; the program counter is left on that instruction so the next
    /// call retries it. On error, nothing about the machine has changed.
    pub fn step(&mut self) -> Result<bool> {
        let pc = self.state.program_counter;
        let opcode = self.state.fetch(pc)?;
        if log_enabled!(Level::Trace) {
            let [high, low] = opcode.to_be_bytes();
            trace!("{pc:#05X}  {}", disasm::mnemonic(high, low));
        }

        match self.execute(pc, opcode)? {
            Flow::Jump(target) => {
                self.state.program_counter = target;
                Ok(true)
            }
            Flow::Stall => Ok(false),
        }
    }

    fn execute(&mut self, pc: u16, opcode: u16) -> Result<Flow> {
        let [byte_a, byte_b] = opcode.to_be_bytes();

        //decode
        let nibble_0 = (byte_a & 0xF0) >> 4;
        let nibble_1 = byte_a & 0x0F;
        let nibble_2 = (byte_b & 0xF0) >> 4;
        let nibble_3 = byte_b & 0x0F;

        let address = opcode & 0x0FFF;
        let immediate_value = byte_b;

        let nibbles = [nibble_0, nibble_1, nibble_2, nibble_3];

        // Instructions that pick their own destination
        match nibbles {
            //return
            [0x0, 0x0, 0xE, 0xE] => {
                let target = pc_target(self.state.peek(pc)?)?;
                self.state.pop(pc)?;
                return Ok(Flow::Jump(target));
            }
            //jump to address
            [0x1, _, _, _] => return Ok(Flow::Jump(pc_target(address)?)),
            //call subroutine
            [0x2, _, _, _] => {
                let target = pc_target(address)?;
                self.state.push(pc + 2, pc)?;
                return Ok(Flow::Jump(target));
            }
            // Jump to NNN + v0
            [0xB, _, _, _] => {
                let target = pc_target(address + self.state.register(0x0) as u16)?;
                return Ok(Flow::Jump(target));
            }
            // Vx = get_key(), lowest held key first
            [0xF, vx, 0x0, 0xA] => {
                let Some(key) = self.keypad.lowest_pressed() else {
                    debug!("{pc:#05X}: waiting for a key");
                    return Ok(Flow::Stall);
                };
                let next = pc_target(pc + 2)?;
                *self.state.register_mut(vx) = key;
                return Ok(Flow::Jump(next));
            }
            _ => (),
        }

        let mut next = pc_target(pc + 2)?;
        let skip_target = || pc_target(pc + 4);

        let state = &mut self.state;
        match nibbles {
            //clear display
            [0x0, 0x0, 0xE, 0x0] => self.display.clear(),
            //skip if Vx == NN
            [0x3, vx, _, _] => {
                if state.register(vx) == immediate_value {
                    next = skip_target()?;
                }
            }
            //skip if Vx != NN
            [0x4, vx, _, _] => {
                if state.register(vx) != immediate_value {
                    next = skip_target()?;
                }
            }
            //skip if Vx == Vy
            [0x5, vx, vy, _] => {
                if state.register(vx) == state.register(vy) {
                    next = skip_target()?;
                }
            }
            //Vx = value
            [0x6, vx, _, _] => *state.register_mut(vx) = immediate_value,
            //Vx += value, flag untouched
            [0x7, vx, _, _] => {
                *state.register_mut(vx) = state.register(vx).wrapping_add(immediate_value)
            }
            //Vx = Vy
            [0x8, vx, vy, 0x0] => *state.register_mut(vx) = state.register(vy),
            //Vx |= Vy
            [0x8, vx, vy, 0x1] => {
                let value = state.register(vy);
                *state.register_mut(vx) |= value;
            }
            //Vx &= Vy
            [0x8, vx, vy, 0x2] => {
                let value = state.register(vy);
                *state.register_mut(vx) &= value;
            }
            //Vx ^= Vy
            [0x8, vx, vy, 0x3] => {
                let value = state.register(vy);
                *state.register_mut(vx) ^= value;
            }
            // Arithmetic and shifts write the flag first, then the result, so
            // VF as a destination ends up holding the result
            //Vx += Vy
            [0x8, vx, vy, 0x4] => {
                let (result, overflow) = state.register(vx).overflowing_add(state.register(vy));
                state.set_flag(overflow);
                *state.register_mut(vx) = result;
            }
            //Vx -= Vy
            [0x8, vx, vy, 0x5] => {
                let (a, b) = (state.register(vx), state.register(vy));
                state.set_flag(a > b);
                *state.register_mut(vx) = a.wrapping_sub(b);
            }
            //Vx >>= 1
            [0x8, vx, _, 0x6] => {
                let value = state.register(vx);
                state.set_flag(value & 1 == 1);
                *state.register_mut(vx) = value >> 1;
            }
            //Vx = Vy - Vx
            [0x8, vx, vy, 0x7] => {
                let (a, b) = (state.register(vx), state.register(vy));
                state.set_flag(a < b);
                *state.register_mut(vx) = b.wrapping_sub(a);
            }
            //Vx <<= 1
            [0x8, vx, _, 0xE] => {
                let value = state.register(vx);
                state.set_flag(value >> 7 == 1);
                *state.register_mut(vx) = value << 1;
            }
            // Skip if Vx != Vy
            [0x9, vx, vy, _] => {
                if state.register(vx) != state.register(vy) {
                    next = skip_target()?;
                }
            }
            //I = address
            [0xA, _, _, _] => state.index_register = address,
            // Vx = rand() & NN
            [0xC, vx, _, _] => *state.register_mut(vx) = immediate_value & self.rng.gen::<u8>(),
            //Display sprite
            [0xD, vx, vy, rows] => {
                let mut sprite = [0u8; 16];
                let rows = rows as usize;
                sprite[..rows].copy_from_slice(state.read(state.index_register, rows)?);

                // Coordinates are re-read per row: VF may be one of them
                state.set_flag(false);
                for (i, row) in sprite[..rows].iter().enumerate() {
                    let x = state.register(vx);
                    let y = state.register(vy).wrapping_add(i as u8);
                    if self.display.draw(x, y, *row) {
                        state.set_flag(true);
                    }
                }
            }
            // skip if key()
            [0xE, vx, 0x9, 0xE] => {
                if self.keypad.is_key_down(state.register(vx)) {
                    next = skip_target()?;
                }
            }
            // skip if !key()
            [0xE, vx, 0xA, 0x1] => {
                if !self.keypad.is_key_down(state.register(vx)) {
                    next = skip_target()?;
                }
            }
            // Vx = delay timer
            [0xF, vx, 0x0, 0x7] => *state.register_mut(vx) = state.delay_timer,
            // Set delay timer to vx
            [0xF, vx, 0x1, 0x5] => state.delay_timer = state.register(vx),
            // Set sound timer to vx
            [0xF, vx, 0x1, 0x8] => state.sound_timer = state.register(vx),
            // I += Vx
            [0xF, vx, 0x1, 0xE] => {
                let offset = state.register(vx);
                state.index_register = state
                    .index_register
                    .checked_add(offset as u16)
                    .ok_or(Error::OutOfBounds {
                        address: state.index_register as usize + offset as usize,
                    })?;
            }
            // I = Vx'th character index
            [0xF, vx, 0x2, 0x9] => {
                state.index_register = state.register(vx) as u16 * GLYPH_HEIGHT;
            }
            // Convert and store Vx to decimal
            [0xF, vx, 0x3, 0x3] => {
                let value = state.register(vx);
                state.write(state.index_register, &[value / 100, value / 10 % 10, value % 10])?;
            }
            // Store everything up until Vx
            [0xF, vx, 0x5, 0x5] => {
                let registers = state.data_registers;
                state.write(state.index_register, &registers[..=vx as usize])?;
            }
            // Load everything up until Vx
            [0xF, vx, 0x6, 0x5] => {
                let count = vx as usize + 1;
                let mut values = [0u8; 16];
                values[..count].copy_from_slice(state.read(state.index_register, count)?);
                state.data_registers[..count].copy_from_slice(&values[..count]);
            }
            _ => debug!("{pc:#05X}: unmapped opcode {opcode:04X}, skipping"),
        }

        Ok(Flow::Jump(next))
    }
}
