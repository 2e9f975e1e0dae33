/// Width of the display in pixels
pub const DISPLAY_WIDTH: usize = 64;

/// Height of the display in pixels
pub const DISPLAY_HEIGHT: usize = 32;

/// Drawing surface used by the interpreter
///
/// `draw` XORs the 8 bits of `row` (most significant bit leftmost) onto the
/// display starting at column `x` of line `y`, wrapping both coordinates at
/// the display edges. It returns `true` if any pixel that was lit before the
/// XOR got turned off.
pub trait Chip8Display {
    fn clear(&mut self);
    fn draw(&mut self, x: u8, y: u8, row: u8) -> bool;
}

impl<D: Chip8Display + ?Sized> Chip8Display for &mut D {
    fn clear(&mut self) {
        (**self).clear()
    }

    fn draw(&mut self, x: u8, y: u8, row: u8) -> bool {
        (**self).draw(x, y, row)
    }
}

/// Monochrome pixel buffer with no output attached
///
/// Useful on its own for tests, and as the backing store of real renderers.
#[derive(Clone)]
pub struct FrameBuffer {
    pixels: [bool; DISPLAY_WIDTH * DISPLAY_HEIGHT],
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self {
            pixels: [false; DISPLAY_WIDTH * DISPLAY_HEIGHT],
        }
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[(y % DISPLAY_HEIGHT) * DISPLAY_WIDTH + x % DISPLAY_WIDTH]
    }

    /// Iterates over the display one line at a time
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.pixels.chunks(DISPLAY_WIDTH)
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|p| **p).count()
    }
}

impl Chip8Display for FrameBuffer {
    fn clear(&mut self) {
        self.pixels = [false; DISPLAY_WIDTH * DISPLAY_HEIGHT];
    }

    fn draw(&mut self, x: u8, y: u8, row: u8) -> bool {
        let y = y as usize % DISPLAY_HEIGHT;
        let mut pixel_cleared = false;
        for j in 0..8 {
            if row & (0x80 >> j) == 0 {
                continue;
            }
            let col = (x as usize + j) % DISPLAY_WIDTH;
            let index = y * DISPLAY_WIDTH + col;
            pixel_cleared |= self.pixels[index];
            self.pixels[index] ^= true;
        }
        pixel_cleared
    }
}
