use super::{disasm, Bus, Cpu};

impl Cpu {
    /// Extended opcode table reached through the 0xCB prefix.
    ///
    /// Layout: bits 6-7 select the group, bits 3-5 the operation or bit
    /// number, bits 0-2 the operand register (6 is (HL)).
    pub(super) fn step_cb<B: Bus>(&mut self, bus: &mut B) {
        let cb = self.fetch8(bus);
        log::trace!("      {}", disasm::extended_mnemonic(cb));
        let group = cb >> 6;
        let y = (cb >> 3) & 0x07;
        let z = cb & 0x07;

        let value = self.read_reg8(bus, z);
        match group {
            // Rotates, shifts and SWAP.
            0 => {
                let result = self.alu_shift(y, value);
                self.write_reg8(bus, z, result);
            }
            // BIT b, r: Z from the bit, H set, N cleared, C kept.
            1 => {
                let flags = &mut self.regs.flags;
                flags.zero = value & (1 << y) == 0;
                flags.negative = false;
                flags.half_carry = true;
            }
            // RES b, r
            2 => self.write_reg8(bus, z, value & !(1 << y)),
            // SET b, r
            _ => self.write_reg8(bus, z, value | (1 << y)),
        }
    }
}
