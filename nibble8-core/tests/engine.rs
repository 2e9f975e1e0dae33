//! End-to-end runs of small hand-assembled programs through the public API
use nibble8_core::{disasm, Chip8Display, Chip8Interpreter, Error, FrameBuffer};

const SEED: u64 = 0x5EED;

fn assemble(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

fn setup(words: &[u16]) -> Chip8Interpreter<FrameBuffer> {
    Chip8Interpreter::new(&assemble(words), FrameBuffer::new(), SEED).unwrap()
}

/// Display that records every call, for checking what the engine asks for
#[derive(Default)]
struct Recorder {
    clears: usize,
    rows: Vec<(u8, u8, u8)>,
    inner: FrameBuffer,
}

impl Chip8Display for Recorder {
    fn clear(&mut self) {
        self.clears += 1;
        self.inner.clear();
    }

    fn draw(&mut self, x: u8, y: u8, row: u8) -> bool {
        self.rows.push((x, y, row));
        self.inner.draw(x, y, row)
    }
}

#[test]
fn nested_calls_unwind_to_caller() {
    // 0x200: CALL 0x300, then spin. Each level at 0x300 + 2k calls the next
    // level; the deepest one returns, and every level returns after it.
    let mut program = assemble(&[0x2300, 0x1202]);
    program.resize(0x100, 0);
    for level in 0..15u16 {
        let target = 0x300 + 4 * (level + 1);
        program.extend(assemble(&[0x2000 | target, 0x00EE]));
    }
    program.extend(assemble(&[0x00EE]));

    let mut chip = Chip8Interpreter::new(&program, FrameBuffer::new(), SEED).unwrap();
    for depth in 1..=16 {
        assert!(chip.step().unwrap());
        assert_eq!(chip.state().stack_pointer, depth);
    }
    for _ in 0..16 {
        assert!(chip.step().unwrap());
    }
    assert_eq!(chip.state().stack_pointer, 0);
    assert_eq!(chip.state().program_counter, 0x202);
}

#[test]
fn seventeenth_call_overflows() {
    // Calls itself forever
    let mut chip = setup(&[0x2200]);
    for _ in 0..16 {
        assert!(chip.step().unwrap());
    }
    let before = chip.state().stack;
    assert_eq!(chip.step(), Err(Error::StackOverflow { pc: 0x200 }));
    assert_eq!(chip.state().stack_pointer, 16);
    assert_eq!(chip.state().stack, before);
    assert_eq!(chip.state().program_counter, 0x200);
}

#[test]
fn steps_never_touch_timers() {
    let mut chip = setup(&[0x6032, 0xF015, 0xF018, 0x7101, 0x1206]);
    for _ in 0..100 {
        assert!(chip.step().unwrap());
    }
    assert_eq!(chip.state().delay_timer, 0x32);
    assert_eq!(chip.state().sound_timer, 0x32);

    chip.tick();
    assert_eq!(chip.state().delay_timer, 0x31);
    assert_eq!(chip.state().sound_timer, 0x31);
    for _ in 0..0x40 {
        chip.tick();
    }
    assert_eq!(chip.state().delay_timer, 0);
    assert_eq!(chip.state().sound_timer, 0);
}

#[test]
fn delay_loop_waits_for_ticks() {
    // DT = 3; loop until DT reads zero, then V2 = 1
    let mut chip = setup(&[0x6003, 0xF015, 0xF107, 0x3100, 0x1204, 0x6201, 0x120C]);
    for _ in 0..50 {
        chip.step().unwrap();
    }
    assert_eq!(chip.state().register(2), 0);
    for _ in 0..3 {
        chip.tick();
        for _ in 0..10 {
            chip.step().unwrap();
        }
    }
    assert_eq!(chip.state().register(2), 1);
}

#[test]
fn key_wait_stalls_until_pressed() {
    let mut chip = setup(&[0xF50A, 0x1202]);
    let keypad = chip.keypad();
    for _ in 0..10 {
        assert!(!chip.step().unwrap());
        assert_eq!(chip.state().program_counter, 0x200);
    }

    let input = std::thread::spawn(move || {
        keypad.set_key(0xE, true);
        keypad.set_key(0x9, true);
    });
    input.join().unwrap();

    assert!(chip.step().unwrap());
    assert_eq!(chip.state().register(5), 0x9);
    assert_eq!(chip.state().program_counter, 0x202);
}

#[test]
fn draw_reports_rows_and_collision() {
    let program = assemble(&[0x6103, 0x6204, 0xA20A, 0xD122, 0xD121, 0xFF00]);
    let mut chip = Chip8Interpreter::new(&program, Recorder::default(), SEED).unwrap();
    for _ in 0..4 {
        assert!(chip.step().unwrap());
    }
    assert_eq!(chip.state().register(0xF), 0);
    assert!(chip.step().unwrap());
    assert_eq!(chip.state().register(0xF), 1);

    let display = chip.into_display();
    assert_eq!(display.clears, 1);
    assert_eq!(display.rows, vec![(3, 4, 0xFF), (3, 5, 0x00), (3, 4, 0xFF)]);
    assert_eq!(display.inner.lit_count(), 0);
}

#[test]
fn clear_screen_instruction() {
    let program = assemble(&[0x00E0]);
    let mut chip = Chip8Interpreter::new(&program, Recorder::default(), SEED).unwrap();
    chip.step().unwrap();
    assert_eq!(chip.display().clears, 2);
}

#[test]
fn failed_step_leaves_state_alone() {
    let mut chip = setup(&[0x6A11, 0xA000, 0xFA55]);
    chip.step().unwrap();
    chip.step().unwrap();
    let memory = chip.state().memory().to_vec();
    assert_eq!(chip.step(), Err(Error::ProtectedWrite { address: 0 }));
    assert_eq!(chip.state().memory(), &memory[..]);
    assert_eq!(chip.state().program_counter, 0x204);
    assert_eq!(chip.state().register(0xA), 0x11);
}

#[test]
fn listing_matches_program() {
    let program = assemble(&[0x6003, 0xF015, 0xD125, 0x8126, 0x0FFF]);
    let text: Vec<_> = disasm::disassemble(&program).map(|(_, t)| t).collect();
    assert_eq!(
        text,
        ["LD V0, $03", "LD DT, V0", "DRW V1, V2, 5", "SHR V1, V2", "$0FFF (!)"]
    );
}
