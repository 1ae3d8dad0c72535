use crate::bus::{Hwio, IoContext};
use crate::fault::Fault;
use crate::interrupts::InterruptFlags;
use crate::scheduler::{Callback, EventId};

pub(crate) const SB: u16 = 0xFF01;
pub(crate) const SC: u16 = 0xFF02;

/// Ticks for eight bits at the internal 8192 Hz clock.
pub(crate) const TRANSFER_TICKS: u64 = 8 * 512;

/// Serial port without a link partner.
///
/// A transfer started on the internal clock records SB in `output` and
/// completes `TRANSFER_TICKS` later with 0xFF shifted in, as if the cable
/// were unplugged. Test ROMs report their results this way.
#[derive(Default)]
pub(crate) struct Serial {
    pub(crate) sb: u8,
    pub(crate) sc: u8,
    pub(crate) output: Vec<u8>,
}

impl Serial {
    /// `SerialClock` event.
    pub(crate) fn on_transfer_done(&mut self, io: &mut IoContext<'_>) {
        self.sb = 0xFF;
        self.sc &= !0x80;
        io.interrupts.request(InterruptFlags::SERIAL);
    }

    fn write_sc(&mut self, io: &mut IoContext<'_>, value: u8) -> Result<(), Fault> {
        self.sc = value;
        // Internal clock & start bit set?
        if value & 0x81 != 0x81 {
            return Ok(());
        }
        self.output.push(self.sb);
        io.scheduler.cancel_events_by_id(EventId::SerialClock);
        io.scheduler
            .add_event_relative(EventId::SerialClock, TRANSFER_TICKS, Callback::SerialTransfer)
    }
}

impl Hwio for Serial {
    fn read_hwio8(&mut self, _io: &mut IoContext<'_>, addr: u16) -> u8 {
        match addr {
            SB => self.sb,
            SC => self.sc | 0x7E,
            _ => 0xFF,
        }
    }

    fn write_hwio8(&mut self, io: &mut IoContext<'_>, addr: u16, value: u8) -> Result<(), Fault> {
        match addr {
            SB => self.sb = value,
            SC => self.write_sc(io, value)?,
            _ => {}
        }
        Ok(())
    }
}
