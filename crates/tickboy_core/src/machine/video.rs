use crate::bus::{Hwio, IoContext};
use crate::fault::Fault;
use crate::interrupts::InterruptFlags;
use crate::scheduler::{Callback, EventId};

pub(crate) const LCDC: u16 = 0xFF40;
pub(crate) const STAT: u16 = 0xFF41;
pub(crate) const LY: u16 = 0xFF44;
pub(crate) const LYC: u16 = 0xFF45;

const OAM_SCAN_TICKS: u64 = 80;
const DRAWING_TICKS: u64 = 172;
const HBLANK_TICKS: u64 = 204;
const LINE_TICKS: u64 = 456;
const VISIBLE_LINES: u8 = 144;
const TOTAL_LINES: u8 = 154;

/// STAT[1:0].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Mode {
    HBlank = 0,
    VBlank = 1,
    OamScan = 2,
    Drawing = 3,
}

/// Display timing only: mode walk, LY, and the VBlank/STAT interrupts.
/// Nothing is rendered.
pub(crate) struct Video {
    pub(crate) lcdc: u8,
    /// STAT interrupt source enables, bits 3-6.
    stat_select: u8,
    pub(crate) ly: u8,
    pub(crate) lyc: u8,
    pub(crate) mode: Mode,
    /// OR of every enabled STAT source, for edge detection.
    stat_line: bool,
}

impl Video {
    pub(crate) fn new() -> Self {
        Self {
            lcdc: 0,
            stat_select: 0,
            ly: 0,
            lyc: 0,
            mode: Mode::HBlank,
            stat_line: false,
        }
    }

    #[inline]
    fn lcd_on(&self) -> bool {
        self.lcdc & 0x80 != 0
    }

    /// Start the mode walk at the top of line 0.
    fn power_on(&mut self, io: &mut IoContext<'_>) -> Result<(), Fault> {
        self.ly = 0;
        self.enter(io, Mode::OamScan, 0)
    }

    fn power_off(&mut self, io: &mut IoContext<'_>) {
        io.scheduler.cancel_events_by_id(EventId::PpuMode);
        self.ly = 0;
        self.mode = Mode::HBlank;
        self.stat_line = false;
    }

    /// LCDC write, also used for the post-boot value.
    pub(crate) fn write_lcdc(&mut self, io: &mut IoContext<'_>, value: u8) -> Result<(), Fault> {
        let was_on = self.lcd_on();
        self.lcdc = value;
        match (was_on, self.lcd_on()) {
            (false, true) => self.power_on(io),
            (true, false) => {
                self.power_off(io);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn enter(&mut self, io: &mut IoContext<'_>, mode: Mode, late: u64) -> Result<(), Fault> {
        self.mode = mode;
        let duration = match mode {
            Mode::OamScan => OAM_SCAN_TICKS,
            Mode::Drawing => DRAWING_TICKS,
            Mode::HBlank => HBLANK_TICKS,
            Mode::VBlank => LINE_TICKS,
        };
        self.update_stat_line(io);
        let shift = u32::from(io.double_speed);
        io.scheduler.add_event_relative(
            EventId::PpuMode,
            duration.saturating_sub(late) << shift,
            Callback::VideoMode,
        )
    }

    /// `PpuMode` event: move to the next mode or line.
    pub(crate) fn on_mode_end(&mut self, io: &mut IoContext<'_>, late: u64) -> Result<(), Fault> {
        match self.mode {
            Mode::OamScan => self.enter(io, Mode::Drawing, late),
            Mode::Drawing => self.enter(io, Mode::HBlank, late),
            Mode::HBlank => {
                self.ly += 1;
                if self.ly == VISIBLE_LINES {
                    io.interrupts.request(InterruptFlags::VBLANK);
                    self.enter(io, Mode::VBlank, late)
                } else {
                    self.enter(io, Mode::OamScan, late)
                }
            }
            Mode::VBlank => {
                self.ly += 1;
                if self.ly == TOTAL_LINES {
                    self.ly = 0;
                    self.enter(io, Mode::OamScan, late)
                } else {
                    self.enter(io, Mode::VBlank, late)
                }
            }
        }
    }

    fn stat_sources(&self) -> bool {
        let mode_source = match self.mode {
            Mode::HBlank => self.stat_select & 0x08 != 0,
            Mode::VBlank => self.stat_select & 0x10 != 0,
            Mode::OamScan => self.stat_select & 0x20 != 0,
            Mode::Drawing => false,
        };
        let lyc_source = self.stat_select & 0x40 != 0 && self.ly == self.lyc;
        self.lcd_on() && (mode_source || lyc_source)
    }

    /// STAT interrupts fire on the rising edge of the combined line.
    fn update_stat_line(&mut self, io: &mut IoContext<'_>) {
        let line = self.stat_sources();
        if line && !self.stat_line {
            io.interrupts.request(InterruptFlags::STAT);
        }
        self.stat_line = line;
    }
}

impl Hwio for Video {
    fn read_hwio8(&mut self, _io: &mut IoContext<'_>, addr: u16) -> u8 {
        match addr {
            LCDC => self.lcdc,
            STAT => {
                let coincidence = u8::from(self.ly == self.lyc) << 2;
                let mode = if self.lcd_on() { self.mode as u8 } else { 0 };
                0x80 | self.stat_select | coincidence | mode
            }
            LY => self.ly,
            LYC => self.lyc,
            _ => 0xFF,
        }
    }

    fn write_hwio8(&mut self, io: &mut IoContext<'_>, addr: u16, value: u8) -> Result<(), Fault> {
        match addr {
            LCDC => self.write_lcdc(io, value)?,
            STAT => {
                self.stat_select = value & 0x78;
                self.update_stat_line(io);
            }
            LYC => {
                self.lyc = value;
                self.update_stat_line(io);
            }
            // LY is read-only.
            _ => {}
        }
        Ok(())
    }
}
