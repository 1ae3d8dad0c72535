use super::{Bus, Cpu};
use crate::fault::Fault;

impl Cpu {
    /// Interrupt entry sequence.
    ///
    /// The return address is pushed one byte at a time and the source is
    /// selected between the two pushes, so a high-byte push that lands on IE
    /// (SP = 0x0000) can retarget or cancel the dispatch. A cancelled
    /// dispatch jumps to 0x0000. Coming out of HALT the same 20 ticks are
    /// spread differently around the selection.
    pub(super) fn dispatch_interrupt<B: Bus>(&mut self, bus: &mut B, from_halt: bool) {
        let pc = self.regs.pc;
        let [hi, lo] = pc.to_be_bytes();

        self.tick(bus, 4);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write8(bus, self.regs.sp, hi);
        if !from_halt {
            self.tick(bus, 2);
        }

        let taken = bus.interrupts_mut().take_highest();
        let vector = taken.map_or(0x0000, |source| source.vector());

        if from_halt {
            self.tick(bus, 4);
        } else {
            self.tick(bus, 2);
        }
        bus.interrupts_mut().set_ime(false);

        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write8(bus, self.regs.sp, lo);
        self.tick(bus, 4);

        log::debug!(
            "interrupt {taken:?}: vector=0x{vector:04X} pc=0x{pc:04X} sp=0x{sp:04X} IE=0x{ie:02X} IF=0x{iflags:02X}{halt}",
            sp = self.regs.sp,
            ie = bus.interrupts().enabled(),
            iflags = bus.interrupts().requested(),
            halt = if from_halt { " (from HALT)" } else { "" },
        );
        self.regs.pc = vector;
    }

    /// Fast-forward through scheduler events until an interrupt becomes
    /// available, counting the skipped time as CPU ticks.
    ///
    /// Gives up after `halt_skip_limit` events and reports the CPU as stuck.
    pub(super) fn halt_skip<B: Bus>(&mut self, bus: &mut B) {
        let mut iterations = 0;
        while !bus.interrupts().available() {
            if iterations == self.halt_skip_limit {
                log::error!(
                    "CPU stuck in HALT at PC=0x{:04X} after {iterations} events (IE=0x{:02X} IF=0x{:02X})",
                    self.regs.pc.wrapping_sub(1),
                    bus.interrupts().enabled(),
                    bus.interrupts().requested(),
                );
                bus.raise(Fault::HaltStuck { iterations });
                return;
            }
            let Some(skipped) = bus.skip_to_next_event() else {
                return;
            };
            self.cycles = self
                .cycles
                .saturating_add(u32::try_from(skipped).unwrap_or(u32::MAX));
            iterations += 1;
        }

        if bus.interrupts().ime() {
            self.dispatch_interrupt(bus, true);
        }
    }
}
