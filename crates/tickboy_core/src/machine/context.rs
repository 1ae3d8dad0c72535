use std::collections::BTreeSet;

use super::{Button, System};
use crate::config::MachineConfig;
use crate::cpu::Cpu;
use crate::fault::Fault;

/// Ticks in one DMG frame (154 lines of 456).
pub const FRAME_TICKS: u64 = 70_224;

/// The whole machine: the CPU and everything it talks to.
///
/// This is the entry point for front ends. Once a [`Fault`] has been
/// raised or a breakpoint has been reached the machine is broken and
/// refuses to execute until [`Machine::resume`] is called.
pub struct Machine {
    pub cpu: Cpu,
    pub sys: System,
    breakpoints: BTreeSet<u16>,
    /// PC of the breakpoint that stopped execution.
    breakpoint_hit: Option<u16>,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

impl Machine {
    pub fn new(config: MachineConfig) -> Self {
        let cpu = if config.skip_boot {
            Cpu::post_boot(config.model)
        } else {
            Cpu::power_on()
        };
        Self {
            cpu: cpu.with_halt_skip_limit(config.halt_skip_limit),
            sys: System::new(&config),
            breakpoints: BTreeSet::new(),
            breakpoint_hit: None,
        }
    }

    /// Load a cartridge image. Bank switching is not modelled, so only the
    /// first 32 KiB are visible.
    pub fn load_rom(&mut self, rom: &[u8]) {
        let loaded = self.sys.load_rom(rom);
        if loaded < rom.len() {
            log::warn!(
                "ROM is {} bytes; only the first {loaded} are mapped",
                rom.len()
            );
        }
        let title: String = rom
            .get(0x134..0x144)
            .unwrap_or_default()
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| char::from(b))
            .collect();
        log::info!("loaded ROM \"{title}\" ({} bytes)", rom.len());
    }

    /// Write bytes directly into memory, bypassing timing and IO routing.
    pub fn load_program(&mut self, addr: u16, bytes: &[u8]) {
        self.sys.poke(addr, bytes);
    }

    /// Execute one instruction and return the ticks it took, or 0 when the
    /// machine is broken.
    ///
    /// Breakpoints are checked against PC once the instruction (and any
    /// interrupt dispatch) has finished, so the machine stops before running
    /// the instruction at the breakpoint.
    pub fn execute(&mut self) -> u32 {
        if self.is_broken() {
            return 0;
        }
        let ticks = self.cpu.execute(&mut self.sys);
        let pc = self.cpu.regs.pc;
        if self.breakpoints.contains(&pc) {
            log::debug!("breakpoint at 0x{pc:04X}, tick {}", self.current_tick());
            self.breakpoint_hit = Some(pc);
        }
        ticks
    }

    pub fn add_breakpoint(&mut self, addr: u16) {
        self.breakpoints.insert(addr);
    }

    /// Returns whether a breakpoint was set at `addr`.
    pub fn remove_breakpoint(&mut self, addr: u16) -> bool {
        self.breakpoints.remove(&addr)
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = u16> + '_ {
        self.breakpoints.iter().copied()
    }

    /// Execute until a frame's worth of ticks has passed or the machine
    /// breaks. Returns the ticks actually run.
    pub fn run_frame(&mut self) -> u64 {
        let start = self.current_tick();
        let end = start + FRAME_TICKS;
        while self.current_tick() < end {
            if self.execute() == 0 {
                break;
            }
        }
        self.current_tick() - start
    }

    pub fn press(&mut self, button: Button) {
        self.sys.set_button(button, true);
    }

    pub fn release(&mut self, button: Button) {
        self.sys.set_button(button, false);
    }

    /// Every byte sent over the serial port so far.
    pub fn serial_output(&self) -> &[u8] {
        self.sys.serial_output()
    }

    /// Drain the buffered audio mix levels.
    pub fn take_samples(&mut self) -> Vec<u8> {
        self.sys.take_samples()
    }

    #[inline]
    pub fn current_tick(&self) -> u64 {
        self.sys.current_tick()
    }

    #[inline]
    pub fn double_speed(&self) -> bool {
        self.sys.double_speed()
    }

    #[inline]
    pub fn is_broken(&self) -> bool {
        self.sys.fault().is_some() || self.breakpoint_hit.is_some()
    }

    pub fn fault(&self) -> Option<&Fault> {
        self.sys.fault()
    }

    /// Human-readable reason the machine stopped, if it did. A fault takes
    /// precedence over a breakpoint.
    pub fn break_reason(&self) -> Option<String> {
        match (self.fault(), self.breakpoint_hit) {
            (Some(fault), _) => Some(fault.to_string()),
            (None, Some(pc)) => Some(format!("breakpoint at 0x{pc:04X}")),
            (None, None) => None,
        }
    }

    /// Let a debugger continue after a fault or breakpoint. Breakpoints stay
    /// set, and a locked CPU stays locked.
    pub fn resume(&mut self) {
        self.breakpoint_hit = None;
        self.sys.clear_fault();
    }
}
