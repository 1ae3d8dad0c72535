mod apu;
mod context;
mod dma;
mod joypad;
mod serial;
mod system;
mod timer;
mod video;

pub use context::{Machine, FRAME_TICKS};
pub use joypad::Button;
pub use system::System;

/// Flat 64 KiB address space. Only the IO registers are routed to
/// peripherals; everything else is plain memory.
const MEMORY_SIZE: usize = 0x10000;
