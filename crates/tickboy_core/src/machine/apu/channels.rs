use crate::bus::IoContext;
use crate::catchup::{CatchUp, Phase};
use crate::fault::Fault;
use crate::scheduler::{Callback, EventId};

const DUTY_TABLE: [[u8; 8]; 4] = [
    [0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 0],
];

/// Register the next full-waveform event for a playing channel.
fn schedule_cycle(
    io: &mut IoContext<'_>,
    id: EventId,
    callback: Callback,
    phase: &Phase,
    late: u64,
) -> Result<(), Fault> {
    let cycle = phase.cycle_ticks();
    if cycle == 0 {
        return Ok(());
    }
    io.scheduler
        .add_event_relative(id, cycle.saturating_sub(late), callback)
}

/// Square wave channel (NR1x / NR2x).
pub(crate) struct PulseChannel {
    id: EventId,
    callback: Callback,
    pub(crate) phase: Phase,
    pub(crate) enabled: bool,
    pub(crate) dac: bool,
    pub(crate) frequency: u16,
    pub(crate) duty: u8,
    pub(crate) volume: u8,
    pub(crate) length: u16,
    pub(crate) length_enabled: bool,
    pub(crate) output: u8,
}

impl PulseChannel {
    pub(crate) fn new(id: EventId, callback: Callback) -> Self {
        Self {
            id,
            callback,
            phase: Phase::new(8),
            enabled: false,
            dac: false,
            frequency: 0,
            duty: 0,
            volume: 0,
            length: 0,
            length_enabled: false,
            output: 0,
        }
    }

    fn period(&self) -> u32 {
        (2048 - u32::from(self.frequency & 0x7FF)) * 4
    }

    fn refresh_output(&mut self) {
        let high = DUTY_TABLE[usize::from(self.duty & 0x03)][usize::from(self.phase.position)];
        self.output = if self.enabled && high != 0 {
            self.volume
        } else {
            0
        };
    }

    /// Frequency change: the running countdown keeps going with the new
    /// period from the next step on.
    pub(crate) fn set_frequency(&mut self, now: u64, frequency: u16) {
        self.catch_up_to(now);
        self.frequency = frequency & 0x7FF;
        self.phase.set_period(self.period());
    }

    pub(crate) fn set_duty(&mut self, now: u64, duty: u8) {
        self.catch_up_to(now);
        self.duty = duty & 0x03;
        self.refresh_output();
    }

    pub(crate) fn set_volume(&mut self, now: u64, volume: u8) {
        self.catch_up_to(now);
        self.volume = volume & 0x0F;
        self.refresh_output();
    }

    pub(crate) fn trigger(&mut self, io: &mut IoContext<'_>) -> Result<(), Fault> {
        let now = io.now();
        self.catch_up_to(now);
        self.enabled = self.dac;
        if self.length == 0 {
            self.length = 64;
        }
        self.phase.restart(now, self.period());
        self.refresh_output();

        io.scheduler.cancel_events_by_id(self.id);
        if self.enabled {
            schedule_cycle(io, self.id, self.callback, &self.phase, 0)?;
        }
        Ok(())
    }

    pub(crate) fn disable(&mut self, now: u64) {
        self.catch_up_to(now);
        self.enabled = false;
        self.output = 0;
    }

    pub(crate) fn clock_length(&mut self) {
        if self.length_enabled && self.length > 0 {
            self.length -= 1;
            if self.length == 0 {
                self.enabled = false;
                self.output = 0;
            }
        }
    }
}

impl CatchUp for PulseChannel {
    fn catch_up_to(&mut self, target: u64) {
        if self.phase.advance_to(target) {
            self.refresh_output();
        }
    }

    fn on_scheduled_event(&mut self, io: &mut IoContext<'_>, late: u64) -> Result<(), Fault> {
        self.catch_up_to(io.now() - late);
        if self.enabled {
            schedule_cycle(io, self.id, self.callback, &self.phase, late)?;
        }
        Ok(())
    }
}

/// Wave channel (NR3x) playing 32 4-bit samples from wave RAM.
pub(crate) struct WaveChannel {
    pub(crate) phase: Phase,
    pub(crate) table: [u8; 32],
    pub(crate) enabled: bool,
    pub(crate) dac: bool,
    pub(crate) frequency: u16,
    /// NR32 output level: 0 mute, 1 full, 2 half, 3 quarter.
    pub(crate) volume_code: u8,
    pub(crate) length: u16,
    pub(crate) length_enabled: bool,
    pub(crate) output: u8,
}

impl WaveChannel {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::new(32),
            table: [0; 32],
            enabled: false,
            dac: false,
            frequency: 0,
            volume_code: 0,
            length: 0,
            length_enabled: false,
            output: 0,
        }
    }

    fn period(&self) -> u32 {
        (2048 - u32::from(self.frequency & 0x7FF)) * 2
    }

    pub(crate) fn refresh_output(&mut self) {
        let sample = self.table[usize::from(self.phase.position)];
        self.output = match self.volume_code & 0x03 {
            _ if !self.enabled => 0,
            0 => 0,
            code => sample >> (code - 1),
        };
    }

    pub(crate) fn set_frequency(&mut self, now: u64, frequency: u16) {
        self.catch_up_to(now);
        self.frequency = frequency & 0x7FF;
        self.phase.set_period(self.period());
    }

    pub(crate) fn set_volume_code(&mut self, now: u64, code: u8) {
        self.catch_up_to(now);
        self.volume_code = code & 0x03;
        self.refresh_output();
    }

    /// Index of the first sample of the wave RAM byte at `offset`. While
    /// playing, every offset addresses the byte currently being played.
    pub(crate) fn ram_index(&mut self, now: u64, offset: u16) -> usize {
        if self.enabled {
            self.catch_up_to(now);
            usize::from(self.phase.position & 0b1_1110)
        } else {
            usize::from(offset & 0x0F) * 2
        }
    }

    pub(crate) fn trigger(&mut self, io: &mut IoContext<'_>) -> Result<(), Fault> {
        let now = io.now();
        self.catch_up_to(now);
        self.enabled = self.dac;
        if self.length == 0 {
            self.length = 256;
        }
        self.phase.restart(now, self.period());
        self.refresh_output();

        io.scheduler.cancel_events_by_id(EventId::ApuChannel3);
        if self.enabled {
            schedule_cycle(io, EventId::ApuChannel3, Callback::WaveCycle, &self.phase, 0)?;
        }
        Ok(())
    }

    pub(crate) fn disable(&mut self, now: u64) {
        self.catch_up_to(now);
        self.enabled = false;
        self.output = 0;
    }

    pub(crate) fn clock_length(&mut self) {
        if self.length_enabled && self.length > 0 {
            self.length -= 1;
            if self.length == 0 {
                self.enabled = false;
                self.output = 0;
            }
        }
    }
}

impl CatchUp for WaveChannel {
    fn catch_up_to(&mut self, target: u64) {
        if self.phase.advance_to(target) {
            self.refresh_output();
        }
    }

    fn on_scheduled_event(&mut self, io: &mut IoContext<'_>, late: u64) -> Result<(), Fault> {
        self.catch_up_to(io.now() - late);
        if self.enabled {
            schedule_cycle(io, EventId::ApuChannel3, Callback::WaveCycle, &self.phase, late)?;
        }
        Ok(())
    }
}
