use bitflags::bitflags;

/// Interrupt request register (IF).
pub const IF_ADDR: u16 = 0xFF0F;
/// Interrupt enable register (IE).
pub const IE_ADDR: u16 = 0xFFFF;

bitflags! {
    /// Interrupt sources as laid out in IE/IF, lowest bit has priority.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct InterruptFlags: u8 {
        const VBLANK = 0x01;
        const STAT = 0x02;
        const TIMER = 0x04;
        const SERIAL = 0x08;
        const JOYPAD = 0x10;
    }
}

impl InterruptFlags {
    /// Handler address for a single interrupt source.
    pub fn vector(self) -> u16 {
        match self.bits() {
            0x01 => 0x40,
            0x02 => 0x48,
            0x04 => 0x50,
            0x08 => 0x58,
            0x10 => 0x60,
            _ => 0x00,
        }
    }
}

/// IE/IF registers plus the master enable.
///
/// `available` and `ready` are derived and refreshed after every mutation,
/// so the CPU can test them once per instruction without recomputing.
#[derive(Clone, Debug)]
pub struct InterruptController {
    enabled: u8,
    requested: u8,
    ime: bool,
    available: bool,
    ready: bool,
}

impl Default for InterruptController {
    fn default() -> Self {
        Self {
            enabled: 0x00,
            requested: 0xE0,
            ime: false,
            available: false,
            ready: false,
        }
    }
}

impl InterruptController {
    #[inline]
    pub fn ime(&self) -> bool {
        self.ime
    }

    #[inline]
    pub fn available(&self) -> bool {
        self.available
    }

    #[inline]
    pub fn ready(&self) -> bool {
        self.ready
    }

    #[inline]
    pub fn enabled(&self) -> u8 {
        self.enabled
    }

    /// IF as read by the CPU; bits 5-7 are always set.
    #[inline]
    pub fn requested(&self) -> u8 {
        self.requested
    }

    pub fn set_ime(&mut self, value: bool) {
        self.ime = value;
        self.refresh();
    }

    pub fn request(&mut self, flags: InterruptFlags) {
        self.requested |= flags.bits();
        self.refresh();
    }

    pub fn write_ie(&mut self, value: u8) {
        self.enabled = value;
        self.refresh();
    }

    pub fn write_if(&mut self, value: u8) {
        self.requested = (value & 0x1F) | 0xE0;
        self.refresh();
    }

    /// Select the highest-priority enabled and requested source, clearing its
    /// request bit. Returns `None` when nothing is pending, in which case the
    /// dispatch ends up at vector 0x0000.
    pub fn take_highest(&mut self) -> Option<InterruptFlags> {
        let pending = self.enabled & self.requested & 0x1F;
        if pending == 0 {
            return None;
        }
        // Isolate the lowest set bit.
        let bit = pending & pending.wrapping_neg();
        self.requested &= !bit;
        self.refresh();
        Some(InterruptFlags::from_bits_truncate(bit))
    }

    fn refresh(&mut self) {
        self.available = (self.enabled & self.requested & 0x1F) != 0;
        self.ready = self.ime && self.available;
    }
}

impl InterruptController {
    /// IF/IE register read; other addresses read as open bus.
    pub fn read_register(&self, addr: u16) -> u8 {
        match addr {
            IF_ADDR => self.requested,
            IE_ADDR => self.enabled,
            _ => 0xFF,
        }
    }

    pub fn write_register(&mut self, addr: u16, value: u8) {
        match addr {
            IF_ADDR => self.write_if(value),
            IE_ADDR => self.write_ie(value),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn if_upper_bits_read_as_one() {
        let mut ic = InterruptController::default();
        assert_eq!(ic.read_register(IF_ADDR), 0xE0);
        ic.write_register(IF_ADDR, 0x00);
        assert_eq!(ic.read_register(IF_ADDR), 0xE0);
        ic.write_register(IF_ADDR, 0xFF);
        assert_eq!(ic.read_register(IF_ADDR), 0xFF);
        assert_eq!(ic.read_register(0xFF10), 0xFF);
    }

    #[test]
    fn derived_flags_follow_every_mutation() {
        let mut ic = InterruptController::default();
        ic.request(InterruptFlags::TIMER);
        assert!(!ic.available());

        ic.write_ie(0x04);
        assert!(ic.available());
        assert!(!ic.ready());

        ic.set_ime(true);
        assert!(ic.ready());

        ic.write_if(0x00);
        assert!(!ic.available());
        assert!(!ic.ready());
    }

    #[test]
    fn highest_priority_wins_and_only_its_bit_clears() {
        let mut ic = InterruptController::default();
        ic.write_ie(0x1F);
        ic.request(InterruptFlags::TIMER | InterruptFlags::VBLANK);

        let taken = ic.take_highest();
        assert_eq!(taken, Some(InterruptFlags::VBLANK));
        assert_eq!(taken.map(InterruptFlags::vector), Some(0x40));
        assert_eq!(ic.requested() & 0x1F, InterruptFlags::TIMER.bits());

        assert_eq!(ic.take_highest(), Some(InterruptFlags::TIMER));
        assert_eq!(ic.take_highest(), None);
    }
}
