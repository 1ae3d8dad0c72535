mod alu;
mod cb;
pub mod disasm;
mod exec;
mod helpers;
mod init;
mod interrupts;
mod regs;

pub use regs::{Flag, Flags, Registers};

use crate::bus::Bus;

/// Default number of scheduler events HALT may skip over before the CPU is
/// considered stuck.
pub const DEFAULT_HALT_SKIP_LIMIT: u32 = 100_000;

/// Game Boy CPU core.
///
/// Every bus access costs 4 ticks, charged to the bus before the access is
/// performed. Internal cycles that are not tied to an access accumulate in
/// `pending` and are charged once the instruction body has finished, so the
/// interrupt check at the end of `execute` sees a consistent machine.
///
/// The interrupt master enable lives in the bus's
/// [`InterruptController`](crate::interrupts::InterruptController) because
/// the delayed EI is a scheduler event.
#[derive(Clone, Debug)]
pub struct Cpu {
    pub regs: Registers,
    /// The next opcode fetch does not advance PC.
    halt_bug: bool,
    /// Set by an opcode hole. Real hardware hangs until power-off; we stop
    /// executing and return 0 ticks until reset.
    locked: bool,
    /// Ticks consumed by the current `execute` call.
    cycles: u32,
    /// Internal ticks to charge after the current instruction body.
    pending: u32,
    halt_skip_limit: u32,
}

impl Cpu {
    #[inline]
    pub fn get_flag(&self, flag: Flag) -> bool {
        let flags = &self.regs.flags;
        match flag {
            Flag::Z => flags.zero,
            Flag::N => flags.negative,
            Flag::H => flags.half_carry,
            Flag::C => flags.carry,
        }
    }

    #[inline]
    pub fn locked(&self) -> bool {
        self.locked
    }

    #[inline]
    pub fn halt_bug_pending(&self) -> bool {
        self.halt_bug
    }

    /// Execute one instruction, plus an interrupt dispatch if one becomes
    /// ready, and return the ticks consumed.
    pub fn execute<B: Bus>(&mut self, bus: &mut B) -> u32 {
        if self.locked {
            return 0;
        }

        self.cycles = 0;
        let pc = self.regs.pc;
        let opcode = self.fetch8(bus);
        log::trace!(
            "{pc:04X}  {:<14} AF={:04X} BC={:04X} DE={:04X} HL={:04X} SP={:04X}",
            disasm::mnemonic(opcode),
            self.regs.af(),
            self.regs.bc(),
            self.regs.de(),
            self.regs.hl(),
            self.regs.sp,
        );

        self.exec_opcode(bus, opcode);
        if self.locked {
            return self.cycles;
        }

        if self.pending > 0 {
            let pending = self.pending;
            self.pending = 0;
            bus.tick(pending);
        }

        if bus.interrupts().ready() {
            self.dispatch_interrupt(bus, false);
        }

        self.cycles
    }

    /// Charge `ticks` to the bus immediately.
    #[inline]
    pub(crate) fn tick<B: Bus>(&mut self, bus: &mut B, ticks: u32) {
        self.cycles += ticks;
        bus.tick(ticks);
    }

    /// Charge `ticks` of internal work once the instruction completes.
    #[inline]
    pub(crate) fn tick_pending(&mut self, ticks: u32) {
        self.cycles += ticks;
        self.pending += ticks;
    }

    #[inline]
    pub(crate) fn read8<B: Bus>(&mut self, bus: &mut B, addr: u16) -> u8 {
        self.tick(bus, 4);
        bus.read8(addr)
    }

    #[inline]
    pub(crate) fn write8<B: Bus>(&mut self, bus: &mut B, addr: u16, value: u8) {
        self.tick(bus, 4);
        bus.write8(addr, value);
    }
}

#[cfg(test)]
mod tests;
