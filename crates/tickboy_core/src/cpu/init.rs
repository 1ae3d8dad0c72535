use super::{Cpu, Registers, DEFAULT_HALT_SKIP_LIMIT};
use crate::config::Model;

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// A CPU in the state the DMG boot ROM leaves it in.
    pub fn new() -> Self {
        Self::post_boot(Model::Dmg)
    }

    /// A CPU in the state `model`'s boot ROM leaves it in when it hands
    /// control to cartridge code at 0x0100.
    ///
    /// Cartridges tell the models apart by A: 0x01 on DMG, 0x11 on CGB.
    pub fn post_boot(model: Model) -> Self {
        let mut cpu = Self::power_on();
        let (af, bc, de, hl) = match model {
            Model::Dmg => (0x01B0, 0x0013, 0x00D8, 0x014D),
            Model::Cgb => (0x1180, 0x0000, 0x0008, 0x007C),
        };
        cpu.regs.set_af(af);
        cpu.regs.set_bc(bc);
        cpu.regs.set_de(de);
        cpu.regs.set_hl(hl);
        cpu.regs.sp = 0xFFFE;
        cpu.regs.pc = 0x0100;
        cpu
    }

    pub fn with_halt_skip_limit(mut self, limit: u32) -> Self {
        self.halt_skip_limit = limit;
        self
    }

    /// A CPU with every register zeroed, for running from address 0.
    pub fn power_on() -> Self {
        Self {
            regs: Registers::default(),
            halt_bug: false,
            locked: false,
            cycles: 0,
            pending: 0,
            halt_skip_limit: DEFAULT_HALT_SKIP_LIMIT,
        }
    }
}
