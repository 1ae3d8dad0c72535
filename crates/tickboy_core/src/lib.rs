//! Scheduler-driven Game Boy core.
//!
//! Time advances only through CPU bus accesses: every access charges 4
//! ticks to the [`Scheduler`](scheduler::Scheduler), which fires the
//! peripheral events that became due. Peripherals with fast-changing state
//! catch up lazily (see [`catchup`]).
pub mod bus;
pub mod catchup;
pub mod config;
pub mod cpu;
pub mod fault;
pub mod interrupts;
pub mod machine;
pub mod scheduler;

pub use bus::Bus;
pub use config::{MachineConfig, Model};
pub use cpu::Cpu;
pub use fault::Fault;
pub use machine::{Button, Machine, FRAME_TICKS};
