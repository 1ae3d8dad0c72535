use thiserror::Error;

use crate::scheduler::EventId;

/// Fatal conditions that stop emulation.
///
/// None of these are recovered locally. The machine latches the first one
/// it sees and refuses to execute until the front end clears it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Fault {
    #[error("unimplemented opcode 0x{opcode:02X} at 0x{addr:04X}")]
    UnimplementedOpcode { opcode: u8, addr: u16 },

    #[error("scheduler full while adding {id:?} event")]
    SchedulerFull { id: EventId },

    #[error("CPU stuck in HALT: no interrupt after {iterations} events")]
    HaltStuck { iterations: u32 },

    #[error("popped an event from an empty scheduler")]
    EmptyHeap,
}
