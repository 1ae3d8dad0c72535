use super::*;
use crate::fault::Fault;
use crate::interrupts::{InterruptController, InterruptFlags, IE_ADDR, IF_ADDR};
use crate::scheduler::{Callback, EventId, Scheduler};

/// Flat 64 KiB bus with a real scheduler. The EI delay is wired up and a
/// `TimerIncrement` event requests the timer interrupt; every other event
/// is dropped when it fires.
struct TestBus {
    memory: Vec<u8>,
    scheduler: Scheduler,
    interrupts: InterruptController,
    fault: Option<Fault>,
}

impl Default for TestBus {
    fn default() -> Self {
        Self {
            memory: vec![0; 0x10000],
            scheduler: Scheduler::new(),
            interrupts: InterruptController::default(),
            fault: None,
        }
    }
}

impl TestBus {
    fn fire(&mut self, callback: Callback) {
        match callback {
            Callback::EnableInterrupts => self.interrupts.set_ime(true),
            Callback::TimerIncrement => self.interrupts.request(InterruptFlags::TIMER),
            _ => {}
        }
    }
}

impl Bus for TestBus {
    fn read8(&mut self, addr: u16) -> u8 {
        match addr {
            IF_ADDR | IE_ADDR => self.interrupts.read_register(addr),
            _ => self.memory[addr as usize],
        }
    }

    fn write8(&mut self, addr: u16, value: u8) {
        match addr {
            IF_ADDR | IE_ADDR => self.interrupts.write_register(addr, value),
            _ => self.memory[addr as usize] = value,
        }
    }

    fn tick(&mut self, ticks: u32) {
        self.scheduler.advance(u64::from(ticks));
        while let Some((event, _late)) = self.scheduler.pop_due() {
            self.fire(event.callback);
        }
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
                self.fire(event.callback);
                Some(skipped)
            }
            Err(fault) => {
                self.raise(fault);
                None
            }
        }
    }

    fn raise(&mut self, fault: Fault) {
        self.fault.get_or_insert(fault);
    }
}

fn setup(program: &[u8]) -> (Cpu, TestBus) {
    let mut cpu = Cpu::new();
    let mut bus = TestBus::default();
    let pc = cpu.regs.pc as usize;
    bus.memory[pc..pc + program.len()].copy_from_slice(program);
    cpu.regs.sp = 0xFFFE;
    (cpu, bus)
}

#[test]
fn nop_advances_pc_only() {
    let (mut cpu, mut bus) = setup(&[0x00]);
    let before = cpu.regs;

    let cycles = cpu.execute(&mut bus);

    assert_eq!(cycles, 4);
    assert_eq!(cpu.regs.pc, before.pc + 1);
    assert_eq!(cpu.regs.flags, before.flags);
    assert_eq!(cpu.regs.af(), before.af());
    assert_eq!(bus.scheduler.current_tick(), 4);
}

#[test]
fn nop_wraps_pc() {
    let mut cpu = Cpu::new();
    let mut bus = TestBus::default();
    cpu.regs.pc = 0xFFFF;
    bus.interrupts.write_ie(0x00);
    // 0xFFFF is IE, which reads back as 0x00 = NOP.
    assert_eq!(cpu.execute(&mut bus), 4);
    assert_eq!(cpu.regs.pc, 0x0000);
}

#[test]
fn add_a_a_sets_half_carry() {
    let (mut cpu, mut bus) = setup(&[0x87]);
    cpu.regs.a = 0x3C;

    let cycles = cpu.execute(&mut bus);

    assert_eq!(cycles, 4);
    assert_eq!(cpu.regs.a, 0x78);
    assert!(!cpu.get_flag(Flag::Z));
    assert!(!cpu.get_flag(Flag::N));
    assert!(cpu.get_flag(Flag::H));
    assert!(!cpu.get_flag(Flag::C));
}

#[test]
fn call_pushes_return_address() {
    let mut cpu = Cpu::new();
    let mut bus = TestBus::default();
    cpu.regs.pc = 0x0150;
    cpu.regs.sp = 0xFFFE;
    bus.memory[0x0150..0x0153].copy_from_slice(&[0xCD, 0x00, 0x02]);

    let cycles = cpu.execute(&mut bus);

    assert_eq!(cycles, 24);
    assert_eq!(cpu.regs.pc, 0x0200);
    assert_eq!(cpu.regs.sp, 0xFFFC);
    // Return address 0x0153: high byte first, at SP-1.
    assert_eq!(bus.memory[0xFFFD], 0x01);
    assert_eq!(bus.memory[0xFFFC], 0x53);
}

#[test]
fn flags_round_trip_through_f() {
    for bits in 0..16u8 {
        let flags = Flags {
            zero: bits & 0x8 != 0,
            negative: bits & 0x4 != 0,
            half_carry: bits & 0x2 != 0,
            carry: bits & 0x1 != 0,
        };
        let mut regs = Registers {
            flags,
            ..Registers::default()
        };
        let packed = regs.f();
        assert_eq!(packed & 0x0F, 0);
        regs.set_f(0);
        regs.set_f(packed);
        assert_eq!(regs.flags, flags);
    }
}

#[test]
fn set_f_drops_low_nibble() {
    let mut regs = Registers::default();
    regs.set_af(0x12FF);
    assert_eq!(regs.af(), 0x12F0);
}

#[test]
fn add_and_sub_match_wide_arithmetic() {
    let samples = [0x00u8, 0x01, 0x0F, 0x10, 0x7F, 0x80, 0x99, 0xF0, 0xFF];
    let mut cpu = Cpu::new();
    for &a in &samples {
        for &b in &samples {
            for carry in [false, true] {
                cpu.regs.a = a;
                cpu.regs.flags.carry = carry;
                cpu.alu_add(b, true);
                let c = u16::from(carry);
                let wide = u16::from(a) + u16::from(b) + c;
                assert_eq!(cpu.regs.a, wide as u8, "{a:#04x} + {b:#04x} + {c}");
                assert_eq!(cpu.regs.flags.carry, wide > 0xFF);
                assert_eq!(
                    cpu.regs.flags.half_carry,
                    u16::from(a & 0x0F) + u16::from(b & 0x0F) + c > 0x0F
                );

                cpu.regs.a = a;
                cpu.regs.flags.carry = carry;
                cpu.alu_sub(b, true);
                let c = i16::from(carry);
                let wide = i16::from(a) - i16::from(b) - c;
                assert_eq!(cpu.regs.a, wide as u8, "{a:#04x} - {b:#04x} - {c}");
                assert_eq!(cpu.regs.flags.carry, wide < 0);
                assert_eq!(
                    cpu.regs.flags.half_carry,
                    i16::from(a & 0x0F) - i16::from(b & 0x0F) - c < 0
                );
                assert!(cpu.regs.flags.negative);
            }
        }
    }
}

#[test]
fn daa_adjusts_bcd_addition() {
    // ADD A,B ; DAA
    let (mut cpu, mut bus) = setup(&[0x80, 0x27, 0x80, 0x27]);
    cpu.regs.a = 0x15;
    cpu.regs.b = 0x27;
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    assert_eq!(cpu.regs.a, 0x42);
    assert!(!cpu.get_flag(Flag::C));

    cpu.regs.b = 0x58;
    cpu.execute(&mut bus);
    cpu.execute(&mut bus);
    assert_eq!(cpu.regs.a, 0x00);
    assert!(cpu.get_flag(Flag::Z));
    assert!(cpu.get_flag(Flag::C));
}

#[test]
fn cb_swap_and_bit() {
    // SWAP A ; BIT 0,A
    let (mut cpu, mut bus) = setup(&[0xCB, 0x37, 0xCB, 0x47]);
    cpu.regs.a = 0xF1;
    cpu.regs.flags.carry = true;

    assert_eq!(cpu.execute(&mut bus), 8);
    assert_eq!(cpu.regs.a, 0x1F);
    assert!(!cpu.get_flag(Flag::C));

    assert_eq!(cpu.execute(&mut bus), 8);
    assert!(!cpu.get_flag(Flag::Z));
    assert!(cpu.get_flag(Flag::H));
}

#[test]
fn cb_on_hl_costs_two_extra_accesses() {
    // RLC (HL)
    let (mut cpu, mut bus) = setup(&[0xCB, 0x06]);
    cpu.regs.set_hl(0xC000);
    bus.memory[0xC000] = 0x81;

    assert_eq!(cpu.execute(&mut bus), 16);
    assert_eq!(bus.memory[0xC000], 0x03);
    assert!(cpu.get_flag(Flag::C));
}

#[test]
fn conditional_branch_timings() {
    // JR NZ,+2 taken
    let (mut cpu, mut bus) = setup(&[0x20, 0x02]);
    cpu.regs.flags.zero = false;
    assert_eq!(cpu.execute(&mut bus), 12);
    assert_eq!(cpu.regs.pc, 0x0104);

    // JR Z,+2 not taken
    let (mut cpu, mut bus) = setup(&[0x28, 0x02]);
    cpu.regs.flags.zero = false;
    assert_eq!(cpu.execute(&mut bus), 8);
    assert_eq!(cpu.regs.pc, 0x0102);

    // JP C,0x0200 taken / not taken
    let (mut cpu, mut bus) = setup(&[0xDA, 0x00, 0x02]);
    cpu.regs.flags.carry = true;
    assert_eq!(cpu.execute(&mut bus), 16);
    assert_eq!(cpu.regs.pc, 0x0200);
    let (mut cpu, mut bus) = setup(&[0xDA, 0x00, 0x02]);
    cpu.regs.flags.carry = false;
    assert_eq!(cpu.execute(&mut bus), 12);

    // CALL NZ not taken
    let (mut cpu, mut bus) = setup(&[0xC4, 0x00, 0x02]);
    cpu.regs.flags.zero = true;
    assert_eq!(cpu.execute(&mut bus), 12);
    assert_eq!(cpu.regs.sp, 0xFFFE);

    // RET Z taken / not taken
    let (mut cpu, mut bus) = setup(&[0xC8]);
    cpu.regs.flags.zero = true;
    cpu.regs.sp = 0xFFFC;
    bus.memory[0xFFFC] = 0x34;
    bus.memory[0xFFFD] = 0x12;
    assert_eq!(cpu.execute(&mut bus), 20);
    assert_eq!(cpu.regs.pc, 0x1234);
    assert_eq!(cpu.regs.sp, 0xFFFE);

    let (mut cpu, mut bus) = setup(&[0xC8]);
    cpu.regs.flags.zero = false;
    assert_eq!(cpu.execute(&mut bus), 8);
    assert_eq!(cpu.regs.pc, 0x0101);
}

#[test]
fn push_pop_af_masks_flags() {
    // PUSH BC ; POP AF
    let (mut cpu, mut bus) = setup(&[0xC5, 0xF1]);
    cpu.regs.set_bc(0x12FF);

    assert_eq!(cpu.execute(&mut bus), 16);
    assert_eq!(cpu.execute(&mut bus), 12);
    assert_eq!(cpu.regs.af(), 0x12F0);
    assert_eq!(cpu.regs.sp, 0xFFFE);
}

#[test]
fn interrupt_priority_selects_vblank() {
    let (mut cpu, mut bus) = setup(&[0x00]);
    bus.interrupts.write_ie(0x05);
    bus.interrupts.write_if(0x05);
    bus.interrupts.set_ime(true);

    let cycles = cpu.execute(&mut bus);

    // NOP plus the 20-tick dispatch.
    assert_eq!(cycles, 4 + 20);
    assert_eq!(cpu.regs.pc, 0x0040);
    assert_eq!(cpu.regs.sp, 0xFFFC);
    assert_eq!(bus.memory[0xFFFD], 0x01);
    assert_eq!(bus.memory[0xFFFC], 0x01);
    assert_eq!(bus.interrupts.requested(), 0xE4);
    assert!(!bus.interrupts.ime());
}

#[test]
fn ie_overwritten_by_push_cancels_dispatch() {
    let mut cpu = Cpu::new();
    let mut bus = TestBus::default();
    cpu.regs.pc = 0x0200;
    cpu.regs.sp = 0x0000;
    bus.interrupts.write_ie(0x01);
    bus.interrupts.write_if(0x01);
    bus.interrupts.set_ime(true);

    cpu.execute(&mut bus);

    // The high byte of 0x0201 lands on IE and disables VBlank.
    assert_eq!(bus.interrupts.enabled(), 0x02);
    assert_eq!(cpu.regs.pc, 0x0000);
    assert_eq!(bus.interrupts.requested() & 0x01, 0x01);
}

#[test]
fn halt_bug_repeats_next_opcode() {
    // HALT ; INC A ; NOP
    let (mut cpu, mut bus) = setup(&[0x76, 0x3C, 0x00]);
    cpu.regs.a = 0x10;
    bus.interrupts.write_ie(0x04);
    bus.interrupts.write_if(0x04);

    cpu.execute(&mut bus);
    assert!(cpu.halt_bug_pending());
    assert_eq!(cpu.regs.pc, 0x0101);

    cpu.execute(&mut bus);
    assert_eq!(cpu.regs.a, 0x11);
    assert_eq!(cpu.regs.pc, 0x0101);

    cpu.execute(&mut bus);
    assert_eq!(cpu.regs.a, 0x12);
    assert_eq!(cpu.regs.pc, 0x0102);
}

#[test]
fn ei_takes_effect_after_next_instruction() {
    // EI ; NOP ; NOP
    let (mut cpu, mut bus) = setup(&[0xFB, 0x00, 0x00]);
    bus.interrupts.write_ie(0x01);
    bus.interrupts.write_if(0x01);

    assert_eq!(cpu.execute(&mut bus), 4);
    assert!(!bus.interrupts.ime());
    assert_eq!(cpu.regs.pc, 0x0101);

    assert_eq!(cpu.execute(&mut bus), 4 + 20);
    assert_eq!(cpu.regs.pc, 0x0040);
}

#[test]
fn di_cancels_nothing_already_dispatched() {
    // EI ; DI ; NOP
    let (mut cpu, mut bus) = setup(&[0xFB, 0xF3, 0x00]);
    bus.interrupts.write_ie(0x01);
    bus.interrupts.write_if(0x01);

    cpu.execute(&mut bus);
    // The delayed enable fires during the DI fetch, then DI clears it.
    cpu.execute(&mut bus);
    assert!(!bus.interrupts.ime());
    assert_eq!(cpu.regs.pc, 0x0102);
}

#[test]
fn reti_enables_immediately() {
    let (mut cpu, mut bus) = setup(&[0xD9]);
    cpu.regs.sp = 0xFFFC;
    bus.memory[0xFFFC] = 0x00;
    bus.memory[0xFFFD] = 0x03;

    assert_eq!(cpu.execute(&mut bus), 16);
    assert!(bus.interrupts.ime());
    assert_eq!(cpu.regs.pc, 0x0300);
}

#[test]
fn halt_with_ime_skips_to_interrupt() {
    let (mut cpu, mut bus) = setup(&[0x76]);
    bus.interrupts.write_ie(0x04);
    bus.interrupts.set_ime(true);
    bus.scheduler
        .add_event_relative(EventId::PpuMode, 40, Callback::VideoMode)
        .unwrap();
    bus.scheduler
        .add_event_relative(EventId::TimerIncrement, 100, Callback::TimerIncrement)
        .unwrap();

    let cycles = cpu.execute(&mut bus);

    // Fetch, 96 skipped ticks, then the dispatch out of HALT.
    assert_eq!(cycles, 4 + 96 + 20);
    assert_eq!(bus.scheduler.current_tick(), 120);
    assert_eq!(cpu.regs.pc, 0x0050);
    assert_eq!(bus.memory[0xFFFD], 0x01);
    assert_eq!(bus.memory[0xFFFC], 0x01);
    assert_eq!(bus.fault, None);
}

#[test]
fn halt_with_interrupt_already_pending_dispatches_at_once() {
    let (mut cpu, mut bus) = setup(&[0x76]);
    bus.interrupts.write_ie(0x04);
    bus.interrupts.write_if(0x04);
    bus.interrupts.set_ime(true);
    bus.scheduler
        .add_event_relative(EventId::PpuMode, 1000, Callback::VideoMode)
        .unwrap();

    // No event is skipped: fetch plus the dispatch out of HALT.
    assert_eq!(cpu.execute(&mut bus), 4 + 20);
    assert_eq!(cpu.regs.pc, 0x0050);
    assert_eq!(bus.scheduler.len(), 1);
    assert_eq!(bus.scheduler.next_event_tick(), 1000);
}

#[test]
fn halt_without_ime_wakes_without_dispatch() {
    let (mut cpu, mut bus) = setup(&[0x76, 0x00]);
    bus.interrupts.write_ie(0x04);
    bus.scheduler
        .add_event_relative(EventId::TimerIncrement, 64, Callback::TimerIncrement)
        .unwrap();

    assert_eq!(cpu.execute(&mut bus), 64);
    assert_eq!(cpu.regs.pc, 0x0101);
    assert_eq!(bus.interrupts.requested() & 0x04, 0x04);
    assert!(!cpu.halt_bug_pending());
}

#[test]
fn halt_with_nothing_scheduled_reports_empty_heap() {
    let (mut cpu, mut bus) = setup(&[0x76]);
    bus.interrupts.set_ime(true);

    cpu.execute(&mut bus);

    assert_eq!(bus.fault, Some(Fault::EmptyHeap));
}

#[test]
fn halt_gives_up_after_skip_limit() {
    let mut cpu = Cpu::new().with_halt_skip_limit(3);
    let mut bus = TestBus::default();
    bus.memory[0x0100] = 0x76;
    for delta in [10, 20, 30, 40, 50] {
        bus.scheduler
            .add_event_relative(EventId::TimerIncrement, delta, Callback::TimerIncrement)
            .unwrap();
    }

    cpu.execute(&mut bus);

    assert_eq!(bus.fault, Some(Fault::HaltStuck { iterations: 3 }));
    assert_eq!(bus.scheduler.len(), 2);
}

#[test]
fn opcode_hole_locks_cpu() {
    let (mut cpu, mut bus) = setup(&[0xD3]);

    assert_eq!(cpu.execute(&mut bus), 4);
    assert!(cpu.locked());
    assert_eq!(
        bus.fault,
        Some(Fault::UnimplementedOpcode {
            opcode: 0xD3,
            addr: 0x0100
        })
    );
    assert_eq!(cpu.execute(&mut bus), 0);
    assert_eq!(cpu.regs.pc, 0x0101);
}

#[test]
fn ld_hl_sp_offset_flags() {
    // LD HL,SP-1
    let (mut cpu, mut bus) = setup(&[0xF8, 0xFF]);
    cpu.regs.sp = 0x0001;

    assert_eq!(cpu.execute(&mut bus), 12);
    assert_eq!(cpu.regs.hl(), 0x0000);
    assert!(cpu.get_flag(Flag::H));
    assert!(cpu.get_flag(Flag::C));
    assert!(!cpu.get_flag(Flag::Z));
}

#[test]
fn ldi_ldd_step_hl() {
    // LD (HL+),A ; LD A,(HL-)
    let (mut cpu, mut bus) = setup(&[0x22, 0x3A]);
    cpu.regs.set_hl(0xC000);
    cpu.regs.a = 0x5A;
    bus.memory[0xC001] = 0xA5;

    assert_eq!(cpu.execute(&mut bus), 8);
    assert_eq!(bus.memory[0xC000], 0x5A);
    assert_eq!(cpu.regs.hl(), 0xC001);

    assert_eq!(cpu.execute(&mut bus), 8);
    assert_eq!(cpu.regs.a, 0xA5);
    assert_eq!(cpu.regs.hl(), 0xC000);
}
