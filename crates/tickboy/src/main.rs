use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use tickboy_core::{Machine, MachineConfig, Model};

const USAGE: &str = "Usage: tickboy <rom_path> [frames]";
const DEFAULT_FRAMES: u32 = 60;

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(rom_path) = args.next().map(PathBuf::from) else {
        bail!(USAGE);
    };
    let frames = match args.next() {
        Some(frames) => frames
            .parse()
            .with_context(|| format!("invalid frame count '{frames}'\n{USAGE}"))?,
        None => DEFAULT_FRAMES,
    };

    let rom = std::fs::read(&rom_path)
        .with_context(|| format!("failed to read ROM '{}'", rom_path.display()))?;

    // CGB-capable cartridges get the speed switch.
    let model = match rom.get(0x143) {
        Some(0x80 | 0xC0) => Model::Cgb,
        _ => Model::Dmg,
    };
    let mut machine = Machine::new(MachineConfig::builder().model(model).build());
    machine.load_rom(&rom);

    let mut ran = 0;
    while ran < frames && !machine.is_broken() {
        machine.run_frame();
        ran += 1;
    }

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(machine.serial_output())
        .context("failed to write serial output")?;
    stdout.flush()?;

    let regs = &machine.cpu.regs;
    log::info!(
        "stopped after {ran} frames ({} ticks): PC={:04X} SP={:04X} AF={:04X} BC={:04X} DE={:04X} HL={:04X}",
        machine.current_tick(),
        regs.pc,
        regs.sp,
        regs.af(),
        regs.bc(),
        regs.de(),
        regs.hl(),
    );

    if let Some(reason) = machine.break_reason() {
        eprintln!("machine stopped: {reason}");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
