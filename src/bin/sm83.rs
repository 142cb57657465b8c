//! Minimal harness binary: loads a ROM, steps the core, and reports the
//! outcome (spec §6). Not a disassembler or an interactive debugger — just
//! enough to drive the library and exit with a meaningful status code.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;

use sm83::{Cpu, MemoryBus, RomOnlyMapper};

#[derive(Parser, Debug)]
#[command(name = "sm83", about = "Cycle-accurate SM83 interpreter core")]
struct Args {
    /// Path to a raw Game Boy ROM image.
    rom: PathBuf,

    /// Log every prefetched opcode at `trace` level.
    #[arg(long)]
    trace: bool,

    /// Stop after this many M-cycles instead of running until the core
    /// locks up on an invalid opcode.
    #[arg(long = "max-cycles", value_name = "N")]
    max_cycles: Option<u64>,

    /// Raise the ambient log level; repeatable (`-v`, `-vv`, `-vvv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Keep running past an invalid opcode instead of exiting with status
    /// 2; the CPU itself still locks up (spec §4.3.4), this only changes
    /// whether the harness treats that as fatal.
    #[arg(long)]
    lenient: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("could not read ROM file {path}: {source}")]
    RomIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Cartridge(#[from] sm83::CartridgeError),
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(Outcome::Completed) | Ok(Outcome::HitStuckLeniently) => ExitCode::from(0),
        Ok(Outcome::Stuck) => ExitCode::from(2),
        Err(err) => {
            log::error!("{err}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

enum Outcome {
    Completed,
    Stuck,
    HitStuckLeniently,
}

fn run(args: &Args) -> Result<Outcome, CliError> {
    let rom = std::fs::read(&args.rom).map_err(|source| CliError::RomIo {
        path: args.rom.clone(),
        source,
    })?;
    let mapper: RomOnlyMapper = sm83::load(rom)?;
    let mut bus = MemoryBus::new(mapper);

    let mut cpu = Cpu::new();
    cpu.trace = args.trace;

    let mut cycles = 0u64;
    let mut reported_stuck = false;

    loop {
        if let Some(max) = args.max_cycles {
            if cycles >= max {
                return Ok(Outcome::Completed);
            }
        }

        cpu.step(&mut bus);
        cycles += 1;

        if cpu.is_stuck() {
            if !reported_stuck {
                log::error!("CPU locked up on an invalid opcode after {cycles} M-cycles");
                reported_stuck = true;
            }
            if !args.lenient {
                return Ok(Outcome::Stuck);
            }
            if args.max_cycles.is_none() {
                return Ok(Outcome::HitStuckLeniently);
            }
        }
    }
}
