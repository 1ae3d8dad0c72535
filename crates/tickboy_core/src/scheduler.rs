//! Tick-driven event scheduler.
//!
//! The scheduler owns the master tick counter and a bounded binary min-heap
//! of pending events. Peripherals never get ticked every cycle; instead they
//! register the tick at which their state next changes and the owning
//! machine fires them from [`Scheduler::pop_due`].
//!
//! Events live in a fixed arena of [`CAPACITY`] slots. The heap stores slot
//! indices and every slot records its current heap position, so an arbitrary
//! event can be removed in O(log n) once it has been found.

use crate::fault::Fault;

/// Maximum number of pending events.
pub const CAPACITY: usize = 64;

/// Independent timing sources that may hold a pending event.
///
/// Cancellation works per identifier, so a peripheral that wants to
/// reschedule itself cancels its id and adds a fresh event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventId {
    PpuMode,
    EnableInterrupts,
    ApuChannel1,
    ApuChannel2,
    ApuChannel3,
    ApuSample,
    FrameSequencer,
    TimerIncrement,
    TimerReload,
    OamDma,
    SerialClock,
}

impl EventId {
    /// Whether the remaining delay of this event scales when the CPU
    /// switches between normal and double speed.
    pub fn speed_switch_affected(self) -> bool {
        matches!(
            self,
            EventId::PpuMode | EventId::ApuSample | EventId::FrameSequencer
        )
    }
}

/// What to run when an event fires.
///
/// Several callbacks can share one [`EventId`] (the timer reload window is
/// two consecutive steps of the same timing source).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Callback {
    VideoMode,
    EnableInterrupts,
    PulseCycle1,
    PulseCycle2,
    WaveCycle,
    ApuSample,
    FrameSequencer,
    TimerIncrement,
    TimerOverflowReload,
    TimerReloadDone,
    OamDma,
    SerialTransfer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub due: u64,
    pub callback: Callback,
    seq: u64,
    heap_index: usize,
}

impl Event {
    const EMPTY: Event = Event {
        id: EventId::PpuMode,
        due: 0,
        callback: Callback::VideoMode,
        seq: 0,
        heap_index: 0,
    };
}

pub struct Scheduler {
    current_tick: u64,
    next_event_tick: u64,
    slots: [Event; CAPACITY],
    /// Heap of slot indices ordered by `(due, seq)`.
    heap: [u8; CAPACITY],
    len: usize,
    free: [u8; CAPACITY],
    free_len: usize,
    next_seq: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        let mut free = [0u8; CAPACITY];
        for (i, slot) in free.iter_mut().enumerate() {
            // Pop order hands out slot 0 first.
            *slot = (CAPACITY - 1 - i) as u8;
        }
        Self {
            current_tick: 0,
            next_event_tick: u64::MAX,
            slots: [Event::EMPTY; CAPACITY],
            heap: [0; CAPACITY],
            len: 0,
            free,
            free_len: CAPACITY,
            next_seq: 0,
        }
    }

    #[inline]
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Due tick of the earliest pending event, or `u64::MAX` when nothing is
    /// pending.
    #[inline]
    pub fn next_event_tick(&self) -> u64 {
        self.next_event_tick
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pending events in heap order (not sorted).
    pub fn pending(&self) -> impl Iterator<Item = &Event> + '_ {
        self.heap[..self.len]
            .iter()
            .map(move |&slot| &self.slots[slot as usize])
    }

    /// Schedule `callback` to fire `delta` ticks from now.
    pub fn add_event_relative(
        &mut self,
        id: EventId,
        delta: u64,
        callback: Callback,
    ) -> Result<(), Fault> {
        if self.len == CAPACITY || self.free_len == 0 {
            log::error!(
                "scheduler full ({CAPACITY} events) adding {id:?} at tick {}",
                self.current_tick
            );
            return Err(Fault::SchedulerFull { id });
        }

        self.free_len -= 1;
        let slot = self.free[self.free_len];
        let pos = self.len;
        self.slots[slot as usize] = Event {
            id,
            due: self.current_tick.saturating_add(delta),
            callback,
            seq: self.next_seq,
            heap_index: pos,
        };
        self.next_seq = self.next_seq.wrapping_add(1);
        self.heap[pos] = slot;
        self.len += 1;

        self.sift_up(pos);
        self.update_next_event();
        Ok(())
    }

    /// Remove every pending event with the given id. No-op when none match.
    pub fn cancel_events_by_id(&mut self, id: EventId) {
        // Each removal reshuffles the heap, so search again from the top.
        while let Some(pos) = self.find(id) {
            self.remove_at(pos);
        }
    }

    /// Remove and return the earliest pending event.
    pub fn pop_first_event(&mut self) -> Result<Event, Fault> {
        if self.len == 0 {
            log::error!("pop on empty scheduler at tick {}", self.current_tick);
            return Err(Fault::EmptyHeap);
        }
        Ok(self.remove_at(0))
    }

    /// Advance the tick counter without firing anything.
    #[inline]
    pub fn advance(&mut self, ticks: u64) {
        self.current_tick += ticks;
    }

    /// Pop the next event if it is due, together with how late it fires.
    ///
    /// The owning machine calls this in a loop after [`advance`]; since
    /// `next_event_tick` is re-read every call, callbacks fired in between
    /// may freely add or cancel events.
    ///
    /// [`advance`]: Scheduler::advance
    pub fn pop_due(&mut self) -> Option<(Event, u64)> {
        if self.len == 0 || self.current_tick < self.next_event_tick {
            return None;
        }
        let event = self.remove_at(0);
        Some((event, self.current_tick - event.due))
    }

    /// Jump the tick counter straight to the next event and pop it.
    ///
    /// Returns the event and the number of ticks skipped.
    pub fn skip_to_next_event(&mut self) -> Result<(Event, u64), Fault> {
        if self.len == 0 {
            return Err(Fault::EmptyHeap);
        }
        let skipped = self.next_event_tick.saturating_sub(self.current_tick);
        self.current_tick += skipped;
        let event = self.pop_first_event()?;
        Ok((event, skipped))
    }

    /// Rescale every speed-switch affected event after a speed toggle.
    ///
    /// `double_speed` is the new mode. Remaining delays are halved when
    /// entering double speed and doubled when leaving it; ids and callbacks
    /// are kept.
    pub fn rescale_for_speed(&mut self, double_speed: bool, late: u64) -> Result<(), Fault> {
        let affected: Vec<Event> = self
            .pending()
            .filter(|event| event.id.speed_switch_affected())
            .copied()
            .collect();

        for event in &affected {
            self.cancel_events_by_id(event.id);
        }

        for event in affected {
            let remaining = event
                .due
                .saturating_sub(self.current_tick)
                .saturating_sub(late);
            let scaled = if double_speed {
                remaining >> 1
            } else {
                remaining << 1
            };
            self.add_event_relative(event.id, scaled, event.callback)?;
        }
        Ok(())
    }

    fn find(&self, id: EventId) -> Option<usize> {
        self.heap[..self.len]
            .iter()
            .find(|&&slot| self.slots[slot as usize].id == id)
            .map(|&slot| self.slots[slot as usize].heap_index)
    }

    /// Delete the node at heap position `pos`.
    ///
    /// The node is treated as having a key below every other key: it is
    /// swapped up to the root unconditionally and then popped.
    fn remove_at(&mut self, mut pos: usize) -> Event {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            self.swap(pos, parent);
            pos = parent;
        }

        let slot = self.heap[0];
        self.len -= 1;
        if self.len > 0 {
            self.heap[0] = self.heap[self.len];
            self.slots[self.heap[0] as usize].heap_index = 0;
            self.sift_down(0);
        }

        self.free[self.free_len] = slot;
        self.free_len += 1;
        self.update_next_event();
        self.slots[slot as usize]
    }

    #[inline]
    fn key(&self, pos: usize) -> (u64, u64) {
        let event = &self.slots[self.heap[pos] as usize];
        (event.due, event.seq)
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.slots[self.heap[a] as usize].heap_index = a;
        self.slots[self.heap[b] as usize].heap_index = b;
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.key(pos) >= self.key(parent) {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;
            if left < self.len && self.key(left) < self.key(smallest) {
                smallest = left;
            }
            if right < self.len && self.key(right) < self.key(smallest) {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }

    fn update_next_event(&mut self) {
        self.next_event_tick = if self.len > 0 {
            self.slots[self.heap[0] as usize].due
        } else {
            u64::MAX
        };
    }
}
