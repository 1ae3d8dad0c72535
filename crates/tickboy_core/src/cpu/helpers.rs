use super::{Bus, Cpu};

impl Cpu {
    /// Read an 8-bit register or (HL) by its opcode encoding:
    /// 0=B, 1=C, 2=D, 3=E, 4=H, 5=L, 6=(HL), 7=A.
    #[inline]
    pub(super) fn read_reg8<B: Bus>(&mut self, bus: &mut B, index: u8) -> u8 {
        match index {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => self.regs.h,
            5 => self.regs.l,
            6 => {
                let hl = self.regs.hl();
                self.read8(bus, hl)
            }
            _ => self.regs.a,
        }
    }

    /// Write an 8-bit register or (HL); encoding matches `read_reg8`.
    #[inline]
    pub(super) fn write_reg8<B: Bus>(&mut self, bus: &mut B, index: u8, value: u8) {
        match index {
            0 => self.regs.b = value,
            1 => self.regs.c = value,
            2 => self.regs.d = value,
            3 => self.regs.e = value,
            4 => self.regs.h = value,
            5 => self.regs.l = value,
            6 => {
                let hl = self.regs.hl();
                self.write8(bus, hl, value);
            }
            _ => self.regs.a = value,
        }
    }

    /// Read the 16-bit pair selected by bits 4-5 of the opcode, SP variant.
    #[inline]
    pub(super) fn read_rp(&self, rp: u8) -> u16 {
        match rp & 0x03 {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            _ => self.regs.sp,
        }
    }

    #[inline]
    pub(super) fn write_rp(&mut self, rp: u8, value: u16) {
        match rp & 0x03 {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.regs.set_hl(value),
            _ => self.regs.sp = value,
        }
    }

    #[inline]
    pub(super) fn fetch8<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let pc = self.regs.pc;
        let value = self.read8(bus, pc);
        if self.halt_bug {
            // The fetch right after a bugged HALT does not advance PC, so
            // this byte is fetched again by the next read.
            self.halt_bug = false;
        } else {
            self.regs.pc = pc.wrapping_add(1);
        }
        value
    }

    #[inline]
    pub(super) fn fetch16<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch8(bus);
        let hi = self.fetch8(bus);
        u16::from_le_bytes([lo, hi])
    }

    /// Push high byte then low byte, decrementing SP before each write.
    #[inline]
    pub(super) fn push_u16<B: Bus>(&mut self, bus: &mut B, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write8(bus, self.regs.sp, hi);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write8(bus, self.regs.sp, lo);
    }

    /// Pop low byte then high byte, incrementing SP after each read.
    #[inline]
    pub(super) fn pop_u16<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.read8(bus, self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = self.read8(bus, self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        u16::from_le_bytes([lo, hi])
    }

    /// Branch condition from bits 3-4 of a conditional opcode.
    #[inline]
    pub(super) fn cc_condition(&self, opcode: u8) -> bool {
        let flags = self.regs.flags;
        match (opcode >> 3) & 0x03 {
            0 => !flags.zero,  // NZ
            1 => flags.zero,   // Z
            2 => !flags.carry, // NC
            _ => flags.carry,  // C
        }
    }

    /// JR / JR cc: the displacement is relative to the next instruction.
    pub(super) fn jr<B: Bus>(&mut self, bus: &mut B, cond: bool) {
        let offset = self.fetch8(bus) as i8;
        if cond {
            self.regs.pc = self.regs.pc.wrapping_add_signed(i16::from(offset));
            self.tick_pending(4);
        }
    }

    pub(super) fn jp_cond<B: Bus>(&mut self, bus: &mut B, cond: bool) {
        let addr = self.fetch16(bus);
        if cond {
            self.regs.pc = addr;
            self.tick_pending(4);
        }
    }

    pub(super) fn call_cond<B: Bus>(&mut self, bus: &mut B, cond: bool) {
        let addr = self.fetch16(bus);
        if cond {
            self.tick_pending(4);
            let ret = self.regs.pc;
            self.push_u16(bus, ret);
            self.regs.pc = addr;
        }
    }

    pub(super) fn ret_cond<B: Bus>(&mut self, bus: &mut B, cond: bool) {
        self.tick_pending(4);
        if cond {
            self.regs.pc = self.pop_u16(bus);
            self.tick_pending(4);
        }
    }
}
