use crate::bus::{Hwio, IoContext};
use crate::fault::Fault;
use crate::interrupts::{InterruptController, InterruptFlags};

pub(crate) const P1: u16 = 0xFF00;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Button {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

impl Button {
    /// (is a d-pad direction, bit in the low nibble of P1)
    fn line(self) -> (bool, u8) {
        match self {
            Button::Right => (true, 0),
            Button::Left => (true, 1),
            Button::Up => (true, 2),
            Button::Down => (true, 3),
            Button::A => (false, 0),
            Button::B => (false, 1),
            Button::Select => (false, 2),
            Button::Start => (false, 3),
        }
    }
}

pub(crate) struct Joypad {
    /// P1 bits 5 (buttons) and 4 (d-pad); 0 selects.
    select: u8,
    // bit=1 means pressed.
    buttons: u8,
    dpad: u8,
}

impl Joypad {
    pub(crate) fn new() -> Self {
        Self {
            select: 0x30,
            buttons: 0,
            dpad: 0,
        }
    }

    pub(crate) fn set(&mut self, interrupts: &mut InterruptController, button: Button, pressed: bool) {
        let (dpad, bit) = button.line();
        let group = if dpad { &mut self.dpad } else { &mut self.buttons };
        let mask = 1u8 << bit;
        if pressed {
            if *group & mask == 0 {
                interrupts.request(InterruptFlags::JOYPAD);
            }
            *group |= mask;
        } else {
            *group &= !mask;
        }
    }

    fn read_p1(&self) -> u8 {
        let mut low = 0x0F;
        if self.select & 0x10 == 0 {
            low &= !self.dpad & 0x0F;
        }
        if self.select & 0x20 == 0 {
            low &= !self.buttons & 0x0F;
        }
        // Bits 7-6 always read as 1.
        0xC0 | self.select | low
    }
}

impl Hwio for Joypad {
    fn read_hwio8(&mut self, _io: &mut IoContext<'_>, addr: u16) -> u8 {
        match addr {
            P1 => self.read_p1(),
            _ => 0xFF,
        }
    }

    fn write_hwio8(&mut self, _io: &mut IoContext<'_>, addr: u16, value: u8) -> Result<(), Fault> {
        if addr == P1 {
            // Only the selection bits are writable.
            self.select = value & 0x30;
        }
        Ok(())
    }
}
