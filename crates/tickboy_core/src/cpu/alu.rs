use super::{Cpu, Flags};

impl Cpu {
    /// ADD/ADC into A. `with_carry` selects ADC.
    pub(super) fn alu_add(&mut self, value: u8, with_carry: bool) {
        let a = self.regs.a;
        let carry_in = u8::from(with_carry && self.regs.flags.carry);

        let half = (a & 0x0F) + (value & 0x0F) + carry_in;
        let full = u16::from(a) + u16::from(value) + u16::from(carry_in);
        let result = full as u8;

        self.regs.a = result;
        self.regs.flags = Flags {
            zero: result == 0,
            negative: false,
            half_carry: half > 0x0F,
            carry: full > 0xFF,
        };
    }

    /// SUB/SBC from A. `with_carry` selects SBC.
    pub(super) fn alu_sub(&mut self, value: u8, with_carry: bool) {
        let result = self.sub_flags(value, with_carry);
        self.regs.a = result;
    }

    /// CP: flags of `A - value`, A untouched.
    #[inline]
    pub(super) fn alu_cp(&mut self, value: u8) {
        self.sub_flags(value, false);
    }

    fn sub_flags(&mut self, value: u8, with_carry: bool) -> u8 {
        let a = self.regs.a;
        let carry_in = i16::from(with_carry && self.regs.flags.carry);

        let half = i16::from(a & 0x0F) - i16::from(value & 0x0F) - carry_in;
        let full = i16::from(a) - i16::from(value) - carry_in;
        let result = full as u8;

        self.regs.flags = Flags {
            zero: result == 0,
            negative: true,
            half_carry: half < 0,
            carry: full < 0,
        };
        result
    }

    #[inline]
    pub(super) fn alu_and(&mut self, value: u8) {
        self.regs.a &= value;
        self.regs.flags = Flags {
            zero: self.regs.a == 0,
            half_carry: true,
            ..Flags::default()
        };
    }

    #[inline]
    pub(super) fn alu_or(&mut self, value: u8) {
        self.regs.a |= value;
        self.regs.flags = Flags {
            zero: self.regs.a == 0,
            ..Flags::default()
        };
    }

    #[inline]
    pub(super) fn alu_xor(&mut self, value: u8) {
        self.regs.a ^= value;
        self.regs.flags = Flags {
            zero: self.regs.a == 0,
            ..Flags::default()
        };
    }

    /// Decimal adjust A after a BCD addition or subtraction.
    ///
    /// Carry is only ever set, never cleared, by the adjustment. H is
    /// cleared and N is left alone.
    pub(super) fn alu_daa(&mut self) {
        let mut a = self.regs.a;
        let flags = &mut self.regs.flags;

        if !flags.negative {
            if flags.carry || a > 0x99 {
                a = a.wrapping_add(0x60);
                flags.carry = true;
            }
            if flags.half_carry || (a & 0x0F) > 0x09 {
                a = a.wrapping_add(0x06);
            }
        } else {
            if flags.carry {
                a = a.wrapping_sub(0x60);
            }
            if flags.half_carry {
                a = a.wrapping_sub(0x06);
            }
        }

        flags.zero = a == 0;
        flags.half_carry = false;
        self.regs.a = a;
    }

    /// 8-bit increment for INC r and INC (HL). Carry is left alone.
    #[inline]
    pub(super) fn alu_inc8(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        let flags = &mut self.regs.flags;
        flags.zero = result == 0;
        flags.negative = false;
        flags.half_carry = (value & 0x0F) == 0x0F;
        result
    }

    /// 8-bit decrement for DEC r and DEC (HL). Carry is left alone.
    #[inline]
    pub(super) fn alu_dec8(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        let flags = &mut self.regs.flags;
        flags.zero = result == 0;
        flags.negative = true;
        flags.half_carry = (value & 0x0F) == 0;
        result
    }

    /// `ADD HL,rr`. Z is unaffected; H and C come from bits 11 and 15.
    #[inline]
    pub(super) fn alu_add16_hl(&mut self, value: u16) {
        let hl = self.regs.hl();
        let flags = &mut self.regs.flags;
        flags.negative = false;
        flags.half_carry = (hl & 0x0FFF) + (value & 0x0FFF) > 0x0FFF;
        flags.carry = u32::from(hl) + u32::from(value) > 0xFFFF;
        self.regs.set_hl(hl.wrapping_add(value));
    }

    /// SP plus a signed 8-bit immediate, shared by `ADD SP,e8` and
    /// `LD HL,SP+e8`. Flags come from the unsigned low-byte addition.
    #[inline]
    pub(super) fn alu_add16_signed(&mut self, base: u16, imm8: u8) -> u16 {
        let offset = imm8 as i8 as i16 as u16;
        self.regs.flags = Flags {
            zero: false,
            negative: false,
            half_carry: (base & 0x000F) + (offset & 0x000F) > 0x000F,
            carry: (base & 0x00FF) + (offset & 0x00FF) > 0x00FF,
        };
        base.wrapping_add(offset)
    }

    /// Shared body of the rotate/shift family. `op` is bits 3-5 of the
    /// CB-prefixed opcode. Z is computed from the result.
    pub(super) fn alu_shift(&mut self, op: u8, value: u8) -> u8 {
        let carry_in = self.regs.flags.carry;
        let (result, carry) = match op {
            // RLC
            0 => (value.rotate_left(1), value & 0x80 != 0),
            // RRC
            1 => (value.rotate_right(1), value & 0x01 != 0),
            // RL
            2 => ((value << 1) | u8::from(carry_in), value & 0x80 != 0),
            // RR
            3 => ((value >> 1) | (u8::from(carry_in) << 7), value & 0x01 != 0),
            // SLA
            4 => (value << 1, value & 0x80 != 0),
            // SRA
            5 => ((value >> 1) | (value & 0x80), value & 0x01 != 0),
            // SWAP
            6 => (value.rotate_left(4), false),
            // SRL
            _ => (value >> 1, value & 0x01 != 0),
        };
        self.regs.flags = Flags {
            zero: result == 0,
            carry,
            ..Flags::default()
        };
        result
    }
}
