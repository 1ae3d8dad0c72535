use crate::cpu::{Bus, Cpu};
use crate::scheduler::{Callback, EventId};

impl Cpu {
    /// STOP is two bytes; the padding byte is fetched and ignored. With a
    /// speed switch armed it toggles the CPU speed, otherwise it behaves as
    /// a two-byte NOP.
    pub(super) fn exec_stop<B: Bus>(&mut self, bus: &mut B) {
        let _padding = self.fetch8(bus);
        if bus.speed_switch() {
            log::debug!("STOP at 0x{:04X} switched CPU speed", self.regs.pc.wrapping_sub(2));
        }
    }

    pub(super) fn exec_di<B: Bus>(&mut self, bus: &mut B) {
        bus.interrupts_mut().set_ime(false);
    }

    /// EI takes effect one instruction later: IME is set by a scheduler
    /// event that fires during the next opcode fetch.
    pub(super) fn exec_ei<B: Bus>(&mut self, bus: &mut B) {
        bus.schedule(EventId::EnableInterrupts, 4, Callback::EnableInterrupts);
    }

    pub(super) fn exec_halt<B: Bus>(&mut self, bus: &mut B) {
        let interrupts = bus.interrupts();
        if interrupts.ime() || !interrupts.available() {
            self.halt_skip(bus);
        } else {
            // IME clear with an interrupt already pending: the CPU does not
            // halt and the next fetch repeats.
            self.halt_bug = true;
        }
    }
}
