//! Lazy catch-up for peripherals whose state changes faster than it is worth
//! scheduling.
//!
//! Such a peripheral remembers the tick it was last brought up to date and
//! replays the elapsed time on demand: before any register access that
//! depends on or changes its phase, and whenever its own scheduler event
//! fires. Configuration writes that change the period or output must call
//! [`CatchUp::catch_up_to`] with the current tick first, so the change lands
//! at the right phase.

use crate::bus::IoContext;
use crate::fault::Fault;

pub trait CatchUp {
    /// Advance time-driven state (phase, current output) to `target`.
    ///
    /// Idempotent: calling it again with the same or an earlier tick does
    /// nothing. Configuration is never modified.
    fn catch_up_to(&mut self, target: u64);

    /// Handle this peripheral's own scheduler event, which fired `late`
    /// ticks after it was due. Implementations catch up to the due tick
    /// first and re-register their next event `late` ticks early.
    fn on_scheduled_event(&mut self, io: &mut IoContext<'_>, late: u64) -> Result<(), Fault>;
}

/// A free-running step counter driven by a down-counting frequency timer.
///
/// Each time the timer runs out the position moves one step forward,
/// wrapping at `steps`. A zero period freezes the position.
#[derive(Clone, Debug, Default)]
pub struct Phase {
    pub last_update: u64,
    pub position: u8,
    steps: u8,
    period: u32,
    timer: i64,
}

impl Phase {
    pub fn new(steps: u8) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }

    #[inline]
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Ticks for the position to walk through every step once.
    #[inline]
    pub fn cycle_ticks(&self) -> u64 {
        u64::from(self.period) * u64::from(self.steps)
    }

    /// Restart the waveform at `now` with a fresh period.
    pub fn restart(&mut self, now: u64, period: u32) {
        self.last_update = now;
        self.period = period;
        self.timer = i64::from(period);
        self.position = 0;
    }

    /// Change the period without disturbing the countdown already in
    /// progress. Callers catch up first.
    pub fn set_period(&mut self, period: u32) {
        self.period = period;
    }

    /// Replay whole periods up to `target`. Returns whether the position
    /// moved.
    pub fn advance_to(&mut self, target: u64) -> bool {
        if target <= self.last_update {
            return false;
        }
        let elapsed = target - self.last_update;
        self.last_update = target;
        self.timer -= i64::try_from(elapsed).unwrap_or(i64::MAX);

        if self.period == 0 || self.steps == 0 || self.timer > 0 {
            return false;
        }

        let period = i64::from(self.period);
        let wraps = (-self.timer) / period + 1;
        self.timer += wraps * period;
        let steps = i64::from(self.steps);
        self.position = ((i64::from(self.position) + wraps) % steps) as u8;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_one_step_per_period() {
        let mut phase = Phase::new(32);
        phase.restart(100, 10);

        assert!(!phase.advance_to(109));
        assert_eq!(phase.position, 0);

        assert!(phase.advance_to(110));
        assert_eq!(phase.position, 1);

        assert!(phase.advance_to(145));
        assert_eq!(phase.position, 4);
        assert_eq!(phase.last_update, 145);
    }

    #[test]
    fn catching_up_twice_is_idempotent() {
        let mut phase = Phase::new(8);
        phase.restart(0, 16);
        phase.advance_to(1000);
        let position = phase.position;
        assert!(!phase.advance_to(1000));
        assert!(!phase.advance_to(900));
        assert_eq!(phase.position, position);
    }

    #[test]
    fn split_catch_up_matches_single_catch_up() {
        let mut whole = Phase::new(32);
        let mut split = Phase::new(32);
        whole.restart(0, 6);
        split.restart(0, 6);

        whole.advance_to(1_000);
        for target in (7..=1_000).step_by(7) {
            split.advance_to(target);
        }
        split.advance_to(1_000);
        assert_eq!(whole.position, split.position);
    }

    #[test]
    fn wraps_at_step_count() {
        let mut phase = Phase::new(8);
        phase.restart(0, 4);
        phase.advance_to(4 * 8);
        assert_eq!(phase.position, 0);
        phase.advance_to(4 * 11);
        assert_eq!(phase.position, 3);
    }

    #[test]
    fn zero_period_never_moves() {
        let mut phase = Phase::new(32);
        phase.restart(0, 0);
        assert!(!phase.advance_to(1_000_000));
        assert_eq!(phase.position, 0);
        assert_eq!(phase.last_update, 1_000_000);
    }
}
