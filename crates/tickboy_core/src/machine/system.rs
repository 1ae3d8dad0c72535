use super::apu::{Apu, NR10, NR52, WAVE_RAM_END, WAVE_RAM_START};
use super::dma::DMA;
use super::joypad::{Joypad, P1};
use super::serial::{Serial, SB, SC};
use super::timer::{Timer, DIV, TAC};
use super::video::{Video, LCDC, LYC, STAT};
use super::MEMORY_SIZE;
use crate::bus::{Bus, Hwio, IoContext};
use crate::catchup::CatchUp;
use crate::config::{MachineConfig, Model};
use crate::fault::Fault;
use crate::interrupts::{InterruptController, IE_ADDR, IF_ADDR};
use crate::scheduler::{Callback, EventId, Scheduler};

pub(crate) const KEY1: u16 = 0xFF4D;

/// Borrow the shared IO state out of a `System` while leaving its
/// peripherals free to be borrowed alongside.
macro_rules! io {
    ($sys:expr) => {
        IoContext {
            scheduler: &mut $sys.scheduler,
            interrupts: &mut $sys.interrupts,
            double_speed: $sys.double_speed,
        }
    };
}

/// Everything on the CPU's side of the bus.
///
/// Owns the scheduler, the interrupt controller, flat memory and every
/// peripheral, and is the only place scheduler events are fired: each
/// [`Callback`] maps to one peripheral handler in [`System::fire`].
pub struct System {
    pub(super) memory: [u8; MEMORY_SIZE],
    pub(super) scheduler: Scheduler,
    pub(super) interrupts: InterruptController,
    pub(super) timer: Timer,
    pub(super) apu: Apu,
    pub(super) video: Video,
    pub(super) serial: Serial,
    pub(super) joypad: Joypad,
    pub(super) dma_source: u8,
    model: Model,
    double_speed: bool,
    speed_armed: bool,
    fault: Option<Fault>,
}

impl System {
    pub(crate) fn new(config: &MachineConfig) -> Self {
        let mut sys = Self {
            memory: [0; MEMORY_SIZE],
            scheduler: Scheduler::new(),
            interrupts: InterruptController::default(),
            timer: Timer::new(),
            apu: Apu::new(config.sample_period, config.sample_capacity),
            video: Video::new(),
            serial: Serial::default(),
            joypad: Joypad::new(),
            dma_source: 0xFF,
            model: config.model,
            double_speed: false,
            speed_armed: false,
            fault: None,
        };
        if let Err(fault) = sys.power_up(config.skip_boot) {
            sys.raise(fault);
        }
        sys
    }

    fn power_up(&mut self, skip_boot: bool) -> Result<(), Fault> {
        let mut io = io!(self);
        if skip_boot {
            self.timer.init_dmg(io.now());
            io.interrupts.write_if(0xE1);
            self.video.write_lcdc(&mut io, 0x91)?;
        }
        self.timer.start(&mut io)?;
        self.apu.start(&mut io)
    }

    /// Copy a cartridge image into the ROM area. Anything past 32 KiB is
    /// ignored.
    pub(crate) fn load_rom(&mut self, rom: &[u8]) -> usize {
        let len = rom.len().min(0x8000);
        self.memory[..len].copy_from_slice(&rom[..len]);
        len
    }

    /// Write straight into memory, bypassing IO routing and timing.
    pub(crate) fn poke(&mut self, addr: u16, bytes: &[u8]) {
        let start = usize::from(addr);
        let end = (start + bytes.len()).min(MEMORY_SIZE);
        self.memory[start..end].copy_from_slice(&bytes[..end - start]);
    }

    pub(crate) fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    pub(crate) fn clear_fault(&mut self) {
        self.fault = None;
    }

    #[inline]
    pub(crate) fn double_speed(&self) -> bool {
        self.double_speed
    }

    #[inline]
    pub(crate) fn current_tick(&self) -> u64 {
        self.scheduler.current_tick()
    }

    pub(crate) fn serial_output(&self) -> &[u8] {
        &self.serial.output
    }

    pub(crate) fn take_samples(&mut self) -> Vec<u8> {
        self.apu.take_samples()
    }

    pub(crate) fn set_button(&mut self, button: super::Button, pressed: bool) {
        self.joypad.set(&mut self.interrupts, button, pressed);
    }

    /// Run the handler for a fired event.
    fn fire(&mut self, callback: Callback, late: u64) -> Result<(), Fault> {
        let mut io = io!(self);
        match callback {
            Callback::VideoMode => self.video.on_mode_end(&mut io, late),
            Callback::EnableInterrupts => {
                io.interrupts.set_ime(true);
                Ok(())
            }
            Callback::PulseCycle1 => self.apu.pulse1.on_scheduled_event(&mut io, late),
            Callback::PulseCycle2 => self.apu.pulse2.on_scheduled_event(&mut io, late),
            Callback::WaveCycle => self.apu.wave.on_scheduled_event(&mut io, late),
            Callback::ApuSample => self.apu.on_sample(&mut io, late),
            Callback::FrameSequencer => self.apu.on_frame_sequencer(&mut io, late),
            Callback::TimerIncrement => self.timer.on_increment(&mut io, late),
            Callback::TimerOverflowReload => self.timer.on_overflow_reload(&mut io, late),
            Callback::TimerReloadDone => {
                self.timer.on_reload_done();
                Ok(())
            }
            Callback::OamDma => {
                self.finish_oam_dma();
                Ok(())
            }
            Callback::SerialTransfer => {
                self.serial.on_transfer_done(&mut io);
                Ok(())
            }
        }
    }

    /// Fire every event that is due at the current tick.
    fn fire_due(&mut self) {
        while let Some((event, late)) = self.scheduler.pop_due() {
            if let Err(fault) = self.fire(event.callback, late) {
                self.raise(fault);
            }
        }
    }

    fn read_io(&mut self, addr: u16) -> u8 {
        let mut io = io!(self);
        match addr {
            P1 => self.joypad.read_hwio8(&mut io, addr),
            SB | SC => self.serial.read_hwio8(&mut io, addr),
            DIV..=TAC => self.timer.read_hwio8(&mut io, addr),
            NR10..=NR52 | WAVE_RAM_START..=WAVE_RAM_END => self.apu.read_hwio8(&mut io, addr),
            LCDC | STAT | super::video::LY | LYC => self.video.read_hwio8(&mut io, addr),
            DMA => self.dma_source,
            KEY1 if self.model == Model::Cgb => {
                0x7E | u8::from(self.double_speed) << 7 | u8::from(self.speed_armed)
            }
            KEY1 => 0xFF,
            _ => self.memory[usize::from(addr)],
        }
    }

    fn write_io(&mut self, addr: u16, value: u8) -> Result<(), Fault> {
        let mut io = io!(self);
        match addr {
            P1 => self.joypad.write_hwio8(&mut io, addr, value),
            SB | SC => self.serial.write_hwio8(&mut io, addr, value),
            DIV..=TAC => {
                self.timer.write_hwio8(&mut io, addr, value)?;
                if let Some(edge) = self.timer.take_div_reset() {
                    self.apu.on_div_reset(&mut io, edge)?;
                }
                Ok(())
            }
            NR10..=NR52 | WAVE_RAM_START..=WAVE_RAM_END => {
                self.apu.write_hwio8(&mut io, addr, value)
            }
            LCDC | STAT | super::video::LY | LYC => self.video.write_hwio8(&mut io, addr, value),
            DMA => self.start_oam_dma(value),
            KEY1 => {
                if self.model == Model::Cgb {
                    self.speed_armed = value & 0x01 != 0;
                }
                Ok(())
            }
            _ => {
                self.memory[usize::from(addr)] = value;
                Ok(())
            }
        }
    }
}

impl Bus for System {
    fn read8(&mut self, addr: u16) -> u8 {
        match addr {
            IF_ADDR | IE_ADDR => self.interrupts.read_register(addr),
            0xFF00..=0xFF7F => self.read_io(addr),
            _ => self.memory[usize::from(addr)],
        }
    }

    fn write8(&mut self, addr: u16, value: u8) {
        match addr {
            // No mapper: the cartridge ROM is read-only.
            0x0000..=0x7FFF => {}
            IF_ADDR | IE_ADDR => self.interrupts.write_register(addr, value),
            0xFF00..=0xFF7F => {
                if let Err(fault) = self.write_io(addr, value) {
                    self.raise(fault);
                }
            }
            _ => self.memory[usize::from(addr)] = value,
        }
    }

    fn tick(&mut self, ticks: u32) {
        self.scheduler.advance(u64::from(ticks));
        self.fire_due();
    }

    fn interrupts(&self) -> &InterruptController {
        &self.interrupts
    }

    fn interrupts_mut(&mut self) -> &mut InterruptController {
        &mut self.interrupts
    }

    fn schedule(&mut self, id: EventId, delta: u64, callback: Callback) {
        if let Err(fault) = self.scheduler.add_event_relative(id, delta, callback) {
            self.raise(fault);
        }
    }

    fn skip_to_next_event(&mut self) -> Option<u64> {
        match self.scheduler.skip_to_next_event() {
            Ok((event, skipped)) => {
                if let Err(fault) = self.fire(event.callback, 0) {
                    self.raise(fault);
                }
                self.fire_due();
                Some(skipped)
            }
            Err(fault) => {
                self.raise(fault);
                None
            }
        }
    }

    fn speed_switch(&mut self) -> bool {
        if self.model != Model::Cgb || !self.speed_armed {
            return false;
        }
        self.double_speed = !self.double_speed;
        self.speed_armed = false;
        log::debug!(
            "speed switch to {} speed at tick {}",
            if self.double_speed { "double" } else { "normal" },
            self.scheduler.current_tick()
        );
        if let Err(fault) = self.scheduler.rescale_for_speed(self.double_speed, 0) {
            self.raise(fault);
        }
        true
    }

    fn raise(&mut self, fault: Fault) {
        if self.fault.is_none() {
            log::error!("machine broken: {fault}");
            self.fault = Some(fault);
        }
    }
}
