mod alu;
mod control;
mod incdec;
mod ld;
mod stack;
mod system;

use super::{disasm, Bus, Cpu};
use crate::fault::Fault;

impl Cpu {
    /// Decode and execute one primary opcode. The single 0xCB prefix
    /// forwards to the extended table in `cb.rs`.
    ///
    /// Bus ticks are charged by the accesses themselves; handlers only add
    /// internal ticks through `tick_pending`.
    pub(super) fn exec_opcode<B: Bus>(&mut self, bus: &mut B, opcode: u8) {
        match opcode {
            // NOP
            0x00 => {}

            // CB prefix
            0xCB => self.step_cb(bus),

            // LD rr, d16
            0x01 | 0x11 | 0x21 | 0x31 => self.exec_ld_rr_d16(bus, opcode),

            // RLCA / RRCA / RLA / RRA
            0x07 | 0x0F | 0x17 | 0x1F => self.exec_rotate_a(opcode),

            // INC rr
            0x03 | 0x13 | 0x23 | 0x33 => self.exec_inc16_rr(opcode),

            // DEC rr
            0x0B | 0x1B | 0x2B | 0x3B => self.exec_dec16_rr(opcode),

            // LD r, d8 (and LD (HL), d8)
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                self.exec_ld_r_d8(bus, opcode)
            }

            // HALT sits in the middle of the LD r, r block.
            0x76 => self.exec_halt(bus),

            // LD r, r'
            0x40..=0x7F => self.exec_ld_r_r(bus, opcode),

            // LD (BC/DE/HL+/HL-), A
            0x02 | 0x12 | 0x22 | 0x32 => self.exec_ld_indirect_a(bus, opcode),

            // LD A, (BC/DE/HL+/HL-)
            0x0A | 0x1A | 0x2A | 0x3A => self.exec_ld_a_indirect(bus, opcode),

            // LD (a16), SP
            0x08 => self.exec_ld_a16_sp(bus),

            // STOP
            0x10 => self.exec_stop(bus),

            // LDH (a8),A / LDH A,(a8)
            0xE0 | 0xF0 => self.exec_ldh_a8(bus, opcode),

            // LD (C),A / LD A,(C)
            0xE2 | 0xF2 => self.exec_ldh_c(bus, opcode),

            // LD (a16),A / LD A,(a16)
            0xEA | 0xFA => self.exec_ld_a16_a(bus, opcode),

            // ADD SP, e8
            0xE8 => self.exec_add_sp_e8(bus),

            // LD HL, SP+e8
            0xF8 => self.exec_ld_hl_sp_e8(bus),

            // LD SP, HL
            0xF9 => self.exec_ld_sp_hl(),

            // JR e8
            0x18 => self.jr(bus, true),

            // JR cc, e8
            0x20 | 0x28 | 0x30 | 0x38 => self.exec_jr_cc(bus, opcode),

            // JP cc, a16
            0xC2 | 0xCA | 0xD2 | 0xDA => self.exec_jp_cc(bus, opcode),

            // ADD HL, rr
            0x09 | 0x19 | 0x29 | 0x39 => self.exec_add_hl_rr(opcode),

            0x27 => self.alu_daa(),
            0x2F => self.exec_cpl(),
            0x37 => self.exec_scf(),
            0x3F => self.exec_ccf(),

            // ADD/ADC/SUB/SBC/AND/XOR/OR/CP A, r
            0x80..=0xBF => self.exec_alu_reg_group(bus, opcode),

            // ADD/ADC/SUB/SBC/AND/XOR/OR/CP A, d8
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                self.exec_alu_imm(bus, opcode)
            }

            // INC r
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                self.exec_inc8_reg(bus, opcode)
            }

            // DEC r
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                self.exec_dec8_reg(bus, opcode)
            }

            0xF3 => self.exec_di(bus),
            0xFB => self.exec_ei(bus),

            // JP a16
            0xC3 => self.jp_cond(bus, true),

            // JP HL
            0xE9 => self.regs.pc = self.regs.hl(),

            // CALL a16
            0xCD => self.call_cond(bus, true),

            // PUSH rr
            0xC5 | 0xD5 | 0xE5 | 0xF5 => self.exec_push_rr(bus, opcode),

            // POP rr
            0xC1 | 0xD1 | 0xE1 | 0xF1 => self.exec_pop_rr(bus, opcode),

            // CALL cc, a16
            0xC4 | 0xCC | 0xD4 | 0xDC => self.exec_call_cc(bus, opcode),

            // RET
            0xC9 => self.exec_ret(bus),

            // RET cc
            0xC0 | 0xC8 | 0xD0 | 0xD8 => self.exec_ret_cc(bus, opcode),

            // RETI
            0xD9 => self.exec_reti(bus),

            // RST n
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                self.exec_rst(bus, opcode)
            }

            // Opcode holes: D3 DB DD E3 E4 EB EC ED F4 FC FD.
            _ => self.lock_up(bus, opcode),
        }
    }

    fn lock_up<B: Bus>(&mut self, bus: &mut B, opcode: u8) {
        debug_assert!(disasm::is_illegal(opcode));
        let addr = self.regs.pc.wrapping_sub(1);
        log::error!(
            "CPU locked: {} (0x{opcode:02X}) at PC=0x{addr:04X} (SP=0x{sp:04X} AF=0x{af:04X} BC=0x{bc:04X} DE=0x{de:04X} HL=0x{hl:04X})",
            disasm::mnemonic(opcode),
            sp = self.regs.sp,
            af = self.regs.af(),
            bc = self.regs.bc(),
            de = self.regs.de(),
            hl = self.regs.hl(),
        );
        self.locked = true;
        bus.raise(Fault::UnimplementedOpcode { opcode, addr });
    }
}
