//! Audio phase unit.
//!
//! Only the timing side of the APU lives here: register storage, the
//! channel phase accumulators, length counters, the frame sequencer and a
//! digital mix sampled at a fixed cadence. Envelopes, sweep, the noise
//! channel and any filtering or resampling are left to a front end.
mod channels;

use std::collections::VecDeque;

use channels::{PulseChannel, WaveChannel};

use crate::bus::{Hwio, IoContext};
use crate::catchup::CatchUp;
use crate::fault::Fault;
use crate::scheduler::{Callback, EventId};

pub(crate) const NR10: u16 = 0xFF10;
const NR11: u16 = 0xFF11;
const NR12: u16 = 0xFF12;
const NR13: u16 = 0xFF13;
const NR14: u16 = 0xFF14;
const NR21: u16 = 0xFF16;
const NR22: u16 = 0xFF17;
const NR23: u16 = 0xFF18;
const NR24: u16 = 0xFF19;
const NR30: u16 = 0xFF1A;
const NR31: u16 = 0xFF1B;
const NR32: u16 = 0xFF1C;
const NR33: u16 = 0xFF1D;
const NR34: u16 = 0xFF1E;
pub(crate) const NR52: u16 = 0xFF26;
pub(crate) const WAVE_RAM_START: u16 = 0xFF30;
pub(crate) const WAVE_RAM_END: u16 = 0xFF3F;

/// Bits that always read back as 1, for 0xFF10..=0xFF26.
const READ_MASKS: [u8; 0x17] = [
    0x80, 0x3F, 0x00, 0xFF, 0xBF, // NR10-NR14
    0xFF, 0x3F, 0x00, 0xFF, 0xBF, // unused, NR21-NR24
    0x7F, 0xFF, 0x9F, 0xFF, 0xBF, // NR30-NR34
    0xFF, 0xFF, 0x00, 0x00, 0xBF, // unused, NR41-NR44
    0x00, 0x00, 0x70, // NR50-NR52
];

/// Ticks between frame sequencer steps at normal speed (512 Hz).
pub(crate) const FRAME_SEQUENCER_TICKS: u64 = 8192;

pub(crate) struct Apu {
    regs: [u8; 0x17],
    powered: bool,
    pub(crate) pulse1: PulseChannel,
    pub(crate) pulse2: PulseChannel,
    pub(crate) wave: WaveChannel,
    pub(crate) frame_step: u8,
    sample_period: u64,
    sample_capacity: usize,
    samples: VecDeque<u8>,
}

impl Apu {
    pub(crate) fn new(sample_period: u32, sample_capacity: usize) -> Self {
        Self {
            regs: [0; 0x17],
            powered: true,
            pulse1: PulseChannel::new(EventId::ApuChannel1, Callback::PulseCycle1),
            pulse2: PulseChannel::new(EventId::ApuChannel2, Callback::PulseCycle2),
            wave: WaveChannel::new(),
            frame_step: 0,
            sample_period: u64::from(sample_period.max(1)),
            sample_capacity,
            samples: VecDeque::with_capacity(sample_capacity),
        }
    }

    /// Register the frame sequencer and sample events.
    pub(crate) fn start(&mut self, io: &mut IoContext<'_>) -> Result<(), Fault> {
        io.scheduler.add_event_relative(
            EventId::FrameSequencer,
            FRAME_SEQUENCER_TICKS,
            Callback::FrameSequencer,
        )?;
        io.scheduler
            .add_event_relative(EventId::ApuSample, self.sample_period, Callback::ApuSample)
    }

    fn catch_up_all(&mut self, target: u64) {
        self.pulse1.catch_up_to(target);
        self.pulse2.catch_up_to(target);
        self.wave.catch_up_to(target);
    }

    /// One frame sequencer step: length counters on even steps.
    pub(crate) fn advance_frame_sequencer(&mut self) {
        if self.frame_step % 2 == 0 {
            self.pulse1.clock_length();
            self.pulse2.clock_length();
            self.wave.clock_length();
        }
        self.frame_step = (self.frame_step + 1) & 0x07;
    }

    /// `FrameSequencer` event.
    pub(crate) fn on_frame_sequencer(
        &mut self,
        io: &mut IoContext<'_>,
        late: u64,
    ) -> Result<(), Fault> {
        self.catch_up_all(io.now() - late);
        self.advance_frame_sequencer();
        let shift = u32::from(io.double_speed);
        io.scheduler.add_event_relative(
            EventId::FrameSequencer,
            FRAME_SEQUENCER_TICKS.saturating_sub(late) << shift,
            Callback::FrameSequencer,
        )
    }

    /// A DIV write restarts the frame sequencer timer; a set sequencer bit
    /// falling clocks one extra step.
    pub(crate) fn on_div_reset(
        &mut self,
        io: &mut IoContext<'_>,
        sequencer_edge: bool,
    ) -> Result<(), Fault> {
        if sequencer_edge {
            self.catch_up_all(io.now());
            self.advance_frame_sequencer();
        }
        io.scheduler.cancel_events_by_id(EventId::FrameSequencer);
        let shift = u32::from(io.double_speed);
        io.scheduler.add_event_relative(
            EventId::FrameSequencer,
            FRAME_SEQUENCER_TICKS << shift,
            Callback::FrameSequencer,
        )
    }

    /// `ApuSample` event: record the mixed level at the due tick.
    pub(crate) fn on_sample(&mut self, io: &mut IoContext<'_>, late: u64) -> Result<(), Fault> {
        self.catch_up_all(io.now() - late);
        let level = if self.powered {
            self.pulse1.output + self.pulse2.output + self.wave.output
        } else {
            0
        };
        if self.samples.len() == self.sample_capacity {
            self.samples.pop_front();
        }
        if self.sample_capacity > 0 {
            self.samples.push_back(level);
        }
        io.scheduler.add_event_relative(
            EventId::ApuSample,
            self.sample_period.saturating_sub(late),
            Callback::ApuSample,
        )
    }

    /// Drain the buffered mix levels, oldest first.
    pub(crate) fn take_samples(&mut self) -> Vec<u8> {
        self.samples.drain(..).collect()
    }

    fn channel_status(&self) -> u8 {
        u8::from(self.pulse1.enabled)
            | u8::from(self.pulse2.enabled) << 1
            | u8::from(self.wave.enabled) << 2
    }

    fn power_off(&mut self, io: &mut IoContext<'_>) {
        let now = io.now();
        self.pulse1.disable(now);
        self.pulse2.disable(now);
        self.wave.disable(now);
        io.scheduler.cancel_events_by_id(EventId::ApuChannel1);
        io.scheduler.cancel_events_by_id(EventId::ApuChannel2);
        io.scheduler.cancel_events_by_id(EventId::ApuChannel3);
        self.regs = [0; 0x17];
        self.powered = false;
    }

    fn write_register(&mut self, io: &mut IoContext<'_>, addr: u16, value: u8) -> Result<(), Fault> {
        let now = io.now();
        match addr {
            NR11 | NR21 => {
                let channel = if addr == NR11 {
                    &mut self.pulse1
                } else {
                    &mut self.pulse2
                };
                channel.set_duty(now, value >> 6);
                channel.length = 64 - u16::from(value & 0x3F);
            }
            NR12 | NR22 => {
                let channel = if addr == NR12 {
                    &mut self.pulse1
                } else {
                    &mut self.pulse2
                };
                channel.dac = value & 0xF8 != 0;
                channel.set_volume(now, value >> 4);
                if !channel.dac {
                    channel.disable(now);
                }
            }
            NR13 | NR14 | NR23 | NR24 => {
                let (lo, hi) = if addr <= NR14 { (NR13, NR14) } else { (NR23, NR24) };
                let frequency = u16::from(self.reg(hi) & 0x07) << 8 | u16::from(self.reg(lo));
                let channel = if addr <= NR14 {
                    &mut self.pulse1
                } else {
                    &mut self.pulse2
                };
                channel.set_frequency(now, frequency);
                if addr == hi {
                    channel.length_enabled = value & 0x40 != 0;
                    if value & 0x80 != 0 {
                        channel.trigger(io)?;
                    }
                }
            }
            NR30 => {
                self.wave.dac = value & 0x80 != 0;
                if !self.wave.dac {
                    self.wave.disable(now);
                }
            }
            NR31 => self.wave.length = 256 - u16::from(value),
            NR32 => self.wave.set_volume_code(now, value >> 5),
            NR33 | NR34 => {
                let frequency = u16::from(self.reg(NR34) & 0x07) << 8 | u16::from(self.reg(NR33));
                self.wave.set_frequency(now, frequency);
                if addr == NR34 {
                    self.wave.length_enabled = value & 0x40 != 0;
                    if value & 0x80 != 0 {
                        self.wave.trigger(io)?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    #[inline]
    fn reg(&self, addr: u16) -> u8 {
        self.regs[usize::from(addr - NR10)]
    }
}

impl Hwio for Apu {
    fn read_hwio8(&mut self, io: &mut IoContext<'_>, addr: u16) -> u8 {
        match addr {
            NR52 => {
                self.catch_up_all(io.now());
                READ_MASKS[usize::from(NR52 - NR10)]
                    | u8::from(self.powered) << 7
                    | self.channel_status()
            }
            NR10..=0xFF25 => self.reg(addr) | READ_MASKS[usize::from(addr - NR10)],
            WAVE_RAM_START..=WAVE_RAM_END => {
                let index = self.wave.ram_index(io.now(), addr - WAVE_RAM_START);
                (self.wave.table[index] << 4) | self.wave.table[index + 1]
            }
            _ => 0xFF,
        }
    }

    fn write_hwio8(&mut self, io: &mut IoContext<'_>, addr: u16, value: u8) -> Result<(), Fault> {
        match addr {
            NR52 => {
                let power = value & 0x80 != 0;
                if self.powered && !power {
                    self.power_off(io);
                } else if !self.powered && power {
                    self.powered = true;
                    self.frame_step = 0;
                }
            }
            // Registers are read-only while powered off.
            NR10..=0xFF25 if self.powered => {
                self.regs[usize::from(addr - NR10)] = value;
                self.write_register(io, addr, value)?;
            }
            WAVE_RAM_START..=WAVE_RAM_END => {
                let index = self.wave.ram_index(io.now(), addr - WAVE_RAM_START);
                self.wave.table[index] = value >> 4;
                self.wave.table[index + 1] = value & 0x0F;
                self.wave.refresh_output();
            }
            _ => {}
        }
        Ok(())
    }
}
