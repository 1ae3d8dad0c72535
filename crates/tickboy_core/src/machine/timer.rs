/// Timer / divider unit driven by scheduler events.
///
/// The 16-bit system counter is never stored: it is the number of ticks
/// since the last DIV reset, so DIV is derived whenever it is read. TIMA
/// increments are `TimerIncrement` events at the TAC-selected interval.
/// An overflow leaves TIMA at 0x00 for 4 ticks before the reload event
/// copies TMA in and requests the timer interrupt; the following 4 ticks
/// are the reload window in which TIMA/TMA writes behave specially.
mod io;

pub(crate) use io::{DIV, TAC};

use crate::bus::IoContext;
use crate::fault::Fault;
use crate::interrupts::InterruptFlags;
use crate::scheduler::{Callback, EventId};

/// System counter bit feeding the TIMA edge detector, per TAC[1:0].
const TIMER_BITS: [u32; 4] = [9, 3, 5, 7];
/// Ticks between TIMA increments, per TAC[1:0].
const TIMER_INTERVALS: [u64; 4] = [1024, 16, 64, 256];

/// Ticks between an overflow and the reload, and the reload window length.
const RELOAD_DELAY: u64 = 4;

pub(crate) struct Timer {
    /// Scheduler tick at which the system counter was last zero.
    pub(super) last_div_reset: u64,
    pub(super) tima: u8,
    pub(super) tma: u8,
    pub(super) enabled: bool,
    /// TAC[1:0].
    pub(super) bit_select: usize,
    /// Overflowed; reload event not fired yet.
    pub(super) reload_pending: bool,
    /// Inside the window right after a reload.
    pub(super) reloading: bool,
    /// TIMA was written while the reload was pending.
    pub(super) reload_cancel: bool,
    /// Frame sequencer edge seen by the last DIV reset, for the APU.
    div_reset_edge: Option<bool>,
}

impl Timer {
    pub(crate) fn new() -> Self {
        Self {
            last_div_reset: 0,
            tima: 0,
            tma: 0,
            enabled: false,
            bit_select: 0,
            reload_pending: false,
            reloading: false,
            reload_cancel: false,
            div_reset_edge: None,
        }
    }

    /// Post-boot state: DIV reads 0xAB at PC=0x0100.
    pub(crate) fn init_dmg(&mut self, now: u64) {
        self.last_div_reset = now.wrapping_sub(0xABCC);
    }

    /// Register the first TIMA increment.
    pub(crate) fn start(&mut self, io: &mut IoContext<'_>) -> Result<(), Fault> {
        let until = self.ticks_until_increment(io.now());
        io.scheduler
            .add_event_relative(EventId::TimerIncrement, until, Callback::TimerIncrement)
    }

    #[inline]
    pub(super) fn system_counter(&self, now: u64) -> u16 {
        (now.wrapping_sub(self.last_div_reset) & 0xFFFF) as u16
    }

    #[inline]
    pub(crate) fn div(&self, now: u64) -> u8 {
        (self.system_counter(now) >> 8) as u8
    }

    #[inline]
    fn selected_bit(&self, now: u64) -> bool {
        self.system_counter(now) & (1 << TIMER_BITS[self.bit_select]) != 0
    }

    /// Ticks until the selected counter bit next falls.
    fn ticks_until_increment(&self, now: u64) -> u64 {
        let interval = TIMER_INTERVALS[self.bit_select];
        let phase = u64::from(self.system_counter(now)) & (interval - 1);
        interval - phase
    }

    /// Take the frame sequencer edge recorded by the last DIV reset.
    pub(crate) fn take_div_reset(&mut self) -> Option<bool> {
        self.div_reset_edge.take()
    }

    /// Increment TIMA; on overflow schedule the reload. Glitch increments
    /// from register writes reload without the 4-tick delay.
    fn increment(&mut self, io: &mut IoContext<'_>, late: u64, delayed: bool) -> Result<(), Fault> {
        if !self.enabled {
            return Ok(());
        }
        let (next, overflow) = self.tima.overflowing_add(1);
        self.tima = next;
        if overflow {
            self.reload_pending = true;
            let delay = if delayed { RELOAD_DELAY } else { 0 };
            io.scheduler.add_event_relative(
                EventId::TimerReload,
                delay.saturating_sub(late),
                Callback::TimerOverflowReload,
            )?;
        }
        Ok(())
    }

    /// `TimerIncrement` event.
    pub(crate) fn on_increment(&mut self, io: &mut IoContext<'_>, late: u64) -> Result<(), Fault> {
        self.increment(io, late, true)?;
        let interval = TIMER_INTERVALS[self.bit_select];
        io.scheduler.add_event_relative(
            EventId::TimerIncrement,
            interval.saturating_sub(late),
            Callback::TimerIncrement,
        )
    }

    /// `TimerReload` event right after an overflow.
    pub(crate) fn on_overflow_reload(
        &mut self,
        io: &mut IoContext<'_>,
        late: u64,
    ) -> Result<(), Fault> {
        self.reload_pending = false;
        if self.reload_cancel {
            self.reload_cancel = false;
        } else {
            self.tima = self.tma;
            io.interrupts.request(InterruptFlags::TIMER);
        }
        self.reloading = true;
        io.scheduler.add_event_relative(
            EventId::TimerReload,
            RELOAD_DELAY.saturating_sub(late),
            Callback::TimerReloadDone,
        )
    }

    /// `TimerReload` event closing the reload window.
    pub(crate) fn on_reload_done(&mut self) {
        self.reloading = false;
    }

    /// DIV write: zero the system counter.
    ///
    /// A set selected bit falls, which increments TIMA. The TIMA schedule
    /// restarts from zero and the frame sequencer edge is recorded for
    /// the APU.
    pub(super) fn reset_div(&mut self, io: &mut IoContext<'_>) -> Result<(), Fault> {
        let now = io.now();
        if self.selected_bit(now) {
            self.increment(io, 0, false)?;
        }

        let sequencer_bit = 4 + u32::from(io.double_speed);
        self.div_reset_edge = Some(self.div(now) & (1 << sequencer_bit) != 0);
        self.last_div_reset = now;

        io.scheduler.cancel_events_by_id(EventId::TimerIncrement);
        io.scheduler.add_event_relative(
            EventId::TimerIncrement,
            TIMER_INTERVALS[self.bit_select],
            Callback::TimerIncrement,
        )
    }

    /// TAC clock select change. Moving from a set bit to a clear one looks
    /// like a falling edge to the increment circuit.
    pub(super) fn change_bit_select(
        &mut self,
        io: &mut IoContext<'_>,
        bit_select: usize,
    ) -> Result<(), Fault> {
        if bit_select == self.bit_select {
            return Ok(());
        }
        let now = io.now();
        let was_set = self.selected_bit(now);
        self.bit_select = bit_select;
        if was_set && !self.selected_bit(now) {
            self.increment(io, 0, false)?;
        }

        let until = self.ticks_until_increment(now);
        io.scheduler.cancel_events_by_id(EventId::TimerIncrement);
        io.scheduler
            .add_event_relative(EventId::TimerIncrement, until, Callback::TimerIncrement)
    }

    /// Disabling the timer while the selected bit is set also increments.
    pub(super) fn disable(&mut self, io: &mut IoContext<'_>) -> Result<(), Fault> {
        if self.selected_bit(io.now()) {
            self.increment(io, 0, false)?;
        }
        self.enabled = false;
        Ok(())
    }
}
