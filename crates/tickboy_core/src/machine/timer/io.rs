use super::Timer;
use crate::bus::{Hwio, IoContext};
use crate::fault::Fault;

pub(crate) const DIV: u16 = 0xFF04;
pub(crate) const TIMA: u16 = 0xFF05;
pub(crate) const TMA: u16 = 0xFF06;
pub(crate) const TAC: u16 = 0xFF07;

impl Hwio for Timer {
    fn read_hwio8(&mut self, io: &mut IoContext<'_>, addr: u16) -> u8 {
        match addr {
            DIV => self.div(io.now()),
            TIMA => self.tima,
            TMA => self.tma,
            TAC => 0xF8 | (u8::from(self.enabled) << 2) | self.bit_select as u8,
            _ => 0xFF,
        }
    }

    fn write_hwio8(&mut self, io: &mut IoContext<'_>, addr: u16, value: u8) -> Result<(), Fault> {
        match addr {
            DIV => self.reset_div(io)?,
            TIMA => {
                // The reload wins over a write in the same window.
                self.tima = if self.reloading { self.tma } else { value };
                if self.reload_pending {
                    self.reload_cancel = true;
                }
            }
            TMA => {
                self.tma = value;
                if self.reloading {
                    self.tima = value;
                }
            }
            TAC => {
                self.change_bit_select(io, usize::from(value & 0x03))?;
                let enable = value & 0x04 != 0;
                if self.enabled && !enable {
                    self.disable(io)?;
                }
                self.enabled = enable;
            }
            _ => {}
        }
        Ok(())
    }
}
