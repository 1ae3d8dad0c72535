/// The four condition flags.
///
/// The booleans are the source of truth; the packed F byte is derived on
/// demand and its low nibble is always zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags {
    pub zero: bool,
    pub negative: bool,
    pub half_carry: bool,
    pub carry: bool,
}

impl Flags {
    #[inline]
    pub fn bits(self) -> u8 {
        (self.zero as u8) << Flag::Z as u8
            | (self.negative as u8) << Flag::N as u8
            | (self.half_carry as u8) << Flag::H as u8
            | (self.carry as u8) << Flag::C as u8
    }

    #[inline]
    pub fn from_bits(value: u8) -> Self {
        Self {
            zero: value & (1 << Flag::Z as u8) != 0,
            negative: value & (1 << Flag::N as u8) != 0,
            half_carry: value & (1 << Flag::H as u8) != 0,
            carry: value & (1 << Flag::C as u8) != 0,
        }
    }
}

/// Bit index of each flag in F, from Z at the top down to C at bit 4.
#[derive(Clone, Copy, Debug)]
pub enum Flag {
    Z = 7,
    N = 6,
    H = 5,
    C = 4,
}

/// Registers for the Game Boy CPU (LR35902).
///
/// Register pairs are views over the 8-bit registers, not separate storage.
#[derive(Clone, Copy, Debug, Default)]
pub struct Registers {
    pub a: u8,
    pub flags: Flags,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
}

impl Registers {
    #[inline]
    pub fn f(&self) -> u8 {
        self.flags.bits()
    }

    #[inline]
    pub fn set_f(&mut self, value: u8) {
        self.flags = Flags::from_bits(value);
    }

    #[inline]
    pub fn af(&self) -> u16 {
        u16::from_be_bytes([self.a, self.f()])
    }

    #[inline]
    pub fn set_af(&mut self, value: u16) {
        let [a, f] = value.to_be_bytes();
        self.a = a;
        self.set_f(f);
    }

    #[inline]
    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    #[inline]
    pub fn set_bc(&mut self, value: u16) {
        let [b, c] = value.to_be_bytes();
        self.b = b;
        self.c = c;
    }

    #[inline]
    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    #[inline]
    pub fn set_de(&mut self, value: u16) {
        let [d, e] = value.to_be_bytes();
        self.d = d;
        self.e = e;
    }

    #[inline]
    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    #[inline]
    pub fn set_hl(&mut self, value: u16) {
        let [h, l] = value.to_be_bytes();
        self.h = h;
        self.l = l;
    }
}
