use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use nibble8_core::{disasm, Chip8Interpreter, MAX_PROGRAM_SIZE};

mod terminal;

use terminal::{Control, KeyInput, TerminalDisplay};

/// Runs a program image in the terminal
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Program image to load at 0x200
    rom: PathBuf,

    /// Instructions executed per second
    #[clap(long, default_value_t = 700)]
    speed: u32,

    /// Seed for the random number generator (defaults to the current time)
    #[clap(long)]
    seed: Option<u64>,

    /// Print a disassembly of the program instead of running it
    #[clap(long)]
    disassemble: bool,

    /// Terminal cells per display pixel
    #[clap(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=2))]
    scale: u8,
}

/// Fires once per `interval`, catching up if the caller falls behind
struct Timer {
    interval: Duration,
    last_tick: Instant,
}

impl Timer {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_tick: Instant::now(),
        }
    }

    fn tick(&mut self) -> bool {
        if self.last_tick.elapsed() >= self.interval {
            self.last_tick += self.interval;
            true
        } else {
            false
        }
    }
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

fn main() -> Result<()> {
    let env = env_logger::Env::default()
        .filter_or("NIBBLE8_LOG", "warn")
        .write_style_or("NIBBLE8_LOG_STYLE", "auto");
    env_logger::init_from_env(env);

    let args = Args::parse();
    let program = std::fs::read(&args.rom)
        .with_context(|| format!("failed to read {:?}", args.rom))?;

    if args.disassemble {
        if program.len() > MAX_PROGRAM_SIZE {
            warn!("program is larger than {MAX_PROGRAM_SIZE} bytes");
        }
        for (address, text) in disasm::disassemble(&program) {
            println!("{address:#05X}   {text}");
        }
        return Ok(());
    }

    anyhow::ensure!(args.speed > 0, "speed must be at least 1 instruction per second");
    let seed = args.seed.unwrap_or_else(time_seed);
    info!("random seed {seed}");

    let display = TerminalDisplay::new(args.scale).context("failed to set up terminal")?;
    let mut chip = Chip8Interpreter::new(&program, display, seed)
        .with_context(|| format!("failed to load {:?}", args.rom))?;
    run(&mut chip, args.speed)
}

fn run(chip: &mut Chip8Interpreter<TerminalDisplay>, speed: u32) -> Result<()> {
    let keypad = chip.keypad();
    let mut input = KeyInput::new();

    let cpu_frame_time = Duration::from_secs_f64(1. / speed as f64);
    let mut next_cpu_frame = Instant::now() + cpu_frame_time;
    let mut timer = Timer::new(Duration::from_secs_f32(1. / 60.));

    loop {
        if input.poll(&keypad)? == Control::Quit {
            info!("quit requested");
            return Ok(());
        }

        let pc = chip.state().program_counter;
        chip.step()
            .with_context(|| format!("execution stopped at {pc:#05X}"))?;

        while timer.tick() {
            chip.tick();
            chip.display_mut().present()?;
        }

        let now = Instant::now();
        if next_cpu_frame > now {
            thread::sleep(next_cpu_frame - now);
        }
        next_cpu_frame += cpu_frame_time;
    }
}
