use crate::fault::Fault;
use crate::interrupts::InterruptController;
use crate::scheduler::{Callback, EventId, Scheduler};

/// Abstraction over the Game Boy bus as seen from the CPU.
///
/// `read8`/`write8` are untimed; the CPU charges 4 ticks through `tick`
/// before every access it performs. Implementors own the scheduler and fire
/// due events from inside `tick`.
pub trait Bus {
    fn read8(&mut self, addr: u16) -> u8;
    fn write8(&mut self, addr: u16, value: u8);

    /// Advance the scheduler by `ticks` and fire every event that becomes due.
    fn tick(&mut self, ticks: u32);

    fn interrupts(&self) -> &InterruptController;
    fn interrupts_mut(&mut self) -> &mut InterruptController;

    /// Register a scheduler event `delta` ticks from now.
    fn schedule(&mut self, id: EventId, delta: u64, callback: Callback);

    /// Jump time forward to the next pending event and fire it.
    ///
    /// Returns the number of ticks skipped, or `None` when there was nothing
    /// to skip to (the bus records the fault).
    fn skip_to_next_event(&mut self) -> Option<u64>;

    /// Perform an armed CPU speed switch. Returns whether a switch happened.
    ///
    /// Buses without a double-speed mode keep the default.
    fn speed_switch(&mut self) -> bool {
        false
    }

    /// Record a fatal condition. Only the first fault is kept.
    fn raise(&mut self, fault: Fault);
}

/// Shared machine state a peripheral may touch while handling a register
/// access or one of its own scheduler events.
pub struct IoContext<'a> {
    pub scheduler: &'a mut Scheduler,
    pub interrupts: &'a mut InterruptController,
    pub double_speed: bool,
}

impl IoContext<'_> {
    #[inline]
    pub fn now(&self) -> u64 {
        self.scheduler.current_tick()
    }
}

/// Peripheral register contract used by the bus router.
///
/// Reads of addresses a peripheral does not decode return 0xFF. Writes may
/// reschedule events, which is the only way they can fail.
pub trait Hwio {
    fn read_hwio8(&mut self, io: &mut IoContext<'_>, addr: u16) -> u8;
    fn write_hwio8(&mut self, io: &mut IoContext<'_>, addr: u16, value: u8) -> Result<(), Fault>;
}
