//! Fetch/execute engine.
//!
//! One [`Machine::clock`] fetches the opcode at `p` and executes it to
//! completion. Bus faults propagate with `?`: the instruction stops at the
//! faulting transfer and the machine halts.

mod alu;
mod stack;

use tracing::{debug, trace};

use crate::{Diagnostic, Event, Fault, HaltReason, Machine, Opcode, RunState, StepReport};

/// Control flow after one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Halt,
}

impl Machine {
    /// Fetches and executes one instruction. A no-op once halted.
    pub fn clock(&mut self) -> StepReport {
        let pc = self.registers.p();
        let mut diagnostics = Vec::new();
        if self.run_state.is_running() {
            match self.step(&mut diagnostics) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Halt) => {
                    debug!(pc, "halting");
                    diagnostics.push(Diagnostic::new(Event::Halting));
                    self.run_state = RunState::Halted(HaltReason::Instruction);
                }
                Err(fault) => self.halt_on_fault(fault, &mut diagnostics),
            }
        }
        StepReport {
            pc,
            diagnostics,
            running: self.run_state.is_running(),
        }
    }

    fn step(&mut self, diagnostics: &mut Vec<Diagnostic>) -> Result<Flow, Fault> {
        let byte = self.pull_at_program_counter(diagnostics)?;
        let opcode = Opcode::from_u8(byte).ok_or(Fault::InvalidOpcode(byte))?;
        trace!(pc = self.registers.p(), ?opcode, "execute");
        self.execute(opcode, diagnostics)
    }

    /// Reads the byte at `p` and advances `p`, even when the read faults.
    fn pull_at_program_counter(&mut self, diagnostics: &mut Vec<Diagnostic>) -> Result<u8, Fault> {
        let pc = self.registers.p();
        let fetched = self.bus.read(pc, diagnostics);
        let next = pc.wrapping_add(1);
        self.registers.set_p(next);
        if next == 0 {
            tracing::warn!("program counter overflowed");
            diagnostics.push(Diagnostic::new(Event::ProgramCounterWrapped));
        }
        fetched
    }

    #[allow(clippy::too_many_lines)]
    fn execute(&mut self, opcode: Opcode, diagnostics: &mut Vec<Diagnostic>) -> Result<Flow, Fault> {
        let regs = &mut self.registers;
        match opcode {
            Opcode::Hlt => return Ok(Flow::Halt),
            Opcode::Nop => {}
            Opcode::Adr => {
                let h = self.pull_at_program_counter(diagnostics)?;
                let l = self.pull_at_program_counter(diagnostics)?;
                self.registers.set_h(h);
                self.registers.set_l(l);
            }
            Opcode::Lda => {
                let value = self.bus.read(regs.r(), diagnostics)?;
                self.registers.set_a(value);
            }
            Opcode::Sta => self.bus.write(regs.r(), regs.a(), diagnostics)?,
            Opcode::Ldb => regs.set_b(regs.a()),
            Opcode::Swp => {
                let a = regs.a();
                regs.set_a(regs.b());
                regs.set_b(a);
            }
            Opcode::Ldh => regs.set_h(regs.a()),
            Opcode::Ldl => regs.set_l(regs.a()),
            Opcode::Sth => regs.set_a(regs.h()),
            Opcode::Stl => regs.set_a(regs.l()),
            Opcode::Ldq => regs.set_q(regs.a()),
            Opcode::Stq => regs.set_a(regs.q()),
            Opcode::Cla => {
                let value = self.pull_at_program_counter(diagnostics)?;
                self.registers.set_a(value);
            }
            Opcode::Clb => {
                let value = self.pull_at_program_counter(diagnostics)?;
                self.registers.set_b(value);
            }
            Opcode::Clq => {
                let value = self.pull_at_program_counter(diagnostics)?;
                self.registers.set_q(value);
            }
            Opcode::Add => regs.set_a_with_carry(alu::add(regs.a(), regs.b(), false)),
            Opcode::Addc => regs.set_a_with_carry(alu::add(regs.a(), regs.b(), regs.c())),
            Opcode::Sub => regs.set_a_with_carry(alu::subtract(regs.a(), regs.b(), false)),
            Opcode::Subc => regs.set_a_with_carry(alu::subtract(regs.a(), regs.b(), regs.c())),
            Opcode::Shl => regs.set_a_with_carry(alu::shift_left(regs.a(), 0)),
            Opcode::Shlc => regs.set_a_with_carry(alu::shift_left(regs.a(), u32::from(regs.c()))),
            Opcode::Shr => regs.set_a_with_carry(alu::shift_right(regs.a(), 0)),
            Opcode::Shrc => regs.set_a_with_carry(alu::shift_right(regs.a(), 128 * u32::from(regs.c()))),
            Opcode::And => regs.set_a(regs.a() & regs.b()),
            Opcode::Or => regs.set_a(regs.a() | regs.b()),
            Opcode::Xor => regs.set_a(regs.a() ^ regs.b()),
            Opcode::Nand => regs.set_a(!(regs.a() & regs.b())),
            Opcode::Nor => regs.set_a(!(regs.a() | regs.b())),
            Opcode::Xnor => regs.set_a(!(regs.a() ^ regs.b())),
            Opcode::Cksm => regs.set_c(alu::parity(regs.a(), false)),
            Opcode::Cksmc => regs.set_c(alu::parity(regs.a(), regs.c())),
            Opcode::Incr => regs.set_q(regs.q().wrapping_add(1)),
            Opcode::Decr => regs.set_q(regs.q().wrapping_sub(1)),
            Opcode::Jmp => regs.set_p(regs.r()),
            Opcode::Jmpc => {
                if regs.c() {
                    regs.set_p(regs.r());
                }
            }
            Opcode::Jmpz => {
                if regs.z() {
                    regs.set_p(regs.r());
                }
            }
            Opcode::Jmpq => {
                if !regs.z() {
                    regs.set_p(regs.r());
                }
            }
            Opcode::Psh => {
                let a = regs.a();
                self.push(a, diagnostics)?;
            }
            Opcode::Pop => {
                let value = self.pop(diagnostics)?;
                self.registers.set_a(value);
            }
            Opcode::Subr => {
                let [high, low] = regs.p().to_be_bytes();
                self.push(high, diagnostics)?;
                self.push(low, diagnostics)?;
                self.registers.set_p(self.registers.r());
            }
            Opcode::Ret => {
                let low = self.pop(diagnostics)?;
                let high = self.pop(diagnostics)?;
                self.registers.set_p(u16::from_be_bytes([high, low]));
            }
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use crate::{
        Access, Event, Fault, HaltReason, Machine, MachineConfig, Memory, MemoryConfig, Opcode,
        Register, RunState, Severity,
    };

    fn machine_with(program: &[u8]) -> Machine {
        let mut machine = Machine::with_config(&MachineConfig::default()).expect("default config");
        let image = (0..=u16::MAX).zip(program.iter().copied());
        assert!(machine.load(image).running);
        machine
    }

    fn set(machine: &mut Machine, register: Register, value: u32) {
        machine.set_value(register, value).expect("writable register");
    }

    #[rstest]
    #[case::add_carry(Opcode::Add, 200, 100, false, 44, true)]
    #[case::add_plain(Opcode::Add, 10, 20, false, 30, false)]
    #[case::addc(Opcode::Addc, 10, 20, true, 31, false)]
    #[case::sub_no_borrow(Opcode::Sub, 9, 4, false, 5, true)]
    #[case::sub_borrow(Opcode::Sub, 4, 9, false, 251, false)]
    #[case::subc(Opcode::Subc, 9, 4, true, 6, true)]
    #[case::shl(Opcode::Shl, 0x81, 0, false, 0x02, true)]
    #[case::shlc(Opcode::Shlc, 0x21, 0, true, 0x84, false)]
    #[case::shr(Opcode::Shr, 0x81, 0, true, 0x40, false)]
    #[case::shrc(Opcode::Shrc, 0x81, 0, true, 0x40, false)]
    #[case::and(Opcode::And, 0b1100, 0b1010, false, 0b1000, false)]
    #[case::or(Opcode::Or, 0b1100, 0b1010, false, 0b1110, false)]
    #[case::xor(Opcode::Xor, 0b1100, 0b1010, false, 0b0110, false)]
    #[case::nand(Opcode::Nand, 0b1100, 0b1010, false, 0xF7, false)]
    #[case::nor(Opcode::Nor, 0b1100, 0b1010, false, 0xF1, false)]
    #[case::xnor(Opcode::Xnor, 0b1100, 0b1010, true, 0xF9, true)]
    #[case::cksm(Opcode::Cksm, 0b0111, 0, false, 0b0111, true)]
    #[case::cksmc(Opcode::Cksmc, 0b0111, 0, true, 0b0111, false)]
    fn alu_opcodes(
        #[case] opcode: Opcode,
        #[case] a: u32,
        #[case] b: u32,
        #[case] carry_in: bool,
        #[case] expected_a: u16,
        #[case] expected_c: bool,
    ) {
        let mut machine = machine_with(&[opcode.id()]);
        set(&mut machine, Register::A, a);
        set(&mut machine, Register::B, b);
        set(&mut machine, Register::C, u32::from(carry_in));
        let report = machine.clock();
        assert!(report.running);
        assert!(report.diagnostics.is_empty());
        assert_eq!(machine.get_value(Register::A), expected_a);
        assert_eq!(machine.get_value(Register::C), u16::from(expected_c));
    }

    #[rstest]
    #[case::ldb(Opcode::Ldb, Register::B, 7)]
    #[case::ldh(Opcode::Ldh, Register::H, 7)]
    #[case::ldl(Opcode::Ldl, Register::L, 7)]
    #[case::ldq(Opcode::Ldq, Register::Q, 7)]
    #[case::sth(Opcode::Sth, Register::A, 1)]
    #[case::stl(Opcode::Stl, Register::A, 2)]
    #[case::stq(Opcode::Stq, Register::A, 3)]
    fn register_moves(#[case] opcode: Opcode, #[case] target: Register, #[case] expected: u16) {
        let mut machine = machine_with(&[opcode.id()]);
        set(&mut machine, Register::A, 7);
        set(&mut machine, Register::H, 1);
        set(&mut machine, Register::L, 2);
        set(&mut machine, Register::Q, 3);
        machine.clock();
        assert_eq!(machine.get_value(target), expected);
    }

    #[test]
    fn swap_exchanges_a_and_b() {
        let mut machine = machine_with(&[Opcode::Swp.id()]);
        set(&mut machine, Register::A, 1);
        set(&mut machine, Register::B, 2);
        machine.clock();
        assert_eq!(machine.get_value(Register::A), 2);
        assert_eq!(machine.get_value(Register::B), 1);
    }

    #[test]
    fn constant_loads_pull_immediates() {
        let mut machine = machine_with(&[13, 5, 14, 3, 15, 9, 20]);
        for _ in 0..4 {
            assert!(machine.clock().running);
        }
        assert_eq!(machine.get_value(Register::A), 8);
        assert_eq!(machine.get_value(Register::C), 0);
        assert_eq!(machine.get_value(Register::Q), 9);
        assert_eq!(machine.get_value(Register::P), 7);
    }

    #[test]
    fn adr_then_memory_transfer() {
        // ADR 0x01 0x00; CLA 42; STA; CLA 0; LDA
        let mut machine = machine_with(&[2, 0x01, 0x00, 13, 42, 4, 13, 0, 3]);
        for _ in 0..5 {
            machine.clock();
        }
        assert_eq!(machine.get_value(Register::R), 0x0100);
        assert_eq!(machine.get_value(Register::A), 42);
    }

    #[test]
    fn counter_wraps_and_drives_zero_flag() {
        let mut machine = machine_with(&[Opcode::Decr.id(), Opcode::Incr.id()]);
        machine.clock();
        assert_eq!(machine.get_value(Register::Q), 255);
        assert_eq!(machine.get_value(Register::Z), 0);
        machine.clock();
        assert_eq!(machine.get_value(Register::Q), 0);
        assert_eq!(machine.get_value(Register::Z), 1);
    }

    #[rstest]
    #[case::jmp(Opcode::Jmp, false, 1, true)]
    #[case::jmpc_taken(Opcode::Jmpc, true, 1, true)]
    #[case::jmpc_skipped(Opcode::Jmpc, false, 1, false)]
    #[case::jmpz_taken(Opcode::Jmpz, false, 0, true)]
    #[case::jmpz_skipped(Opcode::Jmpz, false, 1, false)]
    #[case::jmpq_taken(Opcode::Jmpq, false, 1, true)]
    #[case::jmpq_skipped(Opcode::Jmpq, false, 0, false)]
    fn conditional_jumps(
        #[case] opcode: Opcode,
        #[case] carry: bool,
        #[case] q: u32,
        #[case] taken: bool,
    ) {
        let mut machine = machine_with(&[opcode.id()]);
        set(&mut machine, Register::H, 0x12);
        set(&mut machine, Register::L, 0x34);
        set(&mut machine, Register::C, u32::from(carry));
        set(&mut machine, Register::Q, q);
        machine.clock();
        let expected = if taken { 0x1234 } else { 1 };
        assert_eq!(machine.get_value(Register::P), expected);
    }

    #[test]
    fn push_writes_stack_page_then_decrements() {
        let mut machine = machine_with(&[Opcode::Psh.id(), Opcode::Cla.id(), 0, Opcode::Pop.id()]);
        set(&mut machine, Register::A, 0x77);
        machine.clock();
        assert_eq!(machine.get_value(Register::S), 254);
        machine.clock();
        assert_eq!(machine.get_value(Register::A), 0);
        machine.clock();
        assert_eq!(machine.get_value(Register::A), 0x77);
        assert_eq!(machine.get_value(Register::S), 255);
    }

    #[rstest]
    #[case::psh(Opcode::Psh, 0, 255, Event::StackPointerUnderflow)]
    #[case::pop(Opcode::Pop, 255, 0, Event::StackPointerOverflow)]
    #[case::subr_second_push(Opcode::Subr, 1, 255, Event::StackPointerUnderflow)]
    #[case::ret_second_pop(Opcode::Ret, 254, 0, Event::StackPointerOverflow)]
    fn stack_pointer_wraps_warn(
        #[case] opcode: Opcode,
        #[case] s: u32,
        #[case] expected_s: u16,
        #[case] expected: Event,
    ) {
        let mut machine = machine_with(&[opcode.id()]);
        set(&mut machine, Register::S, s);
        let report = machine.clock();
        assert!(report.running);
        let events: Vec<_> = report.diagnostics.iter().map(|d| d.event).collect();
        assert_eq!(events, vec![expected]);
        assert_eq!(report.diagnostics[0].severity, Severity::Warn);
        assert_eq!(machine.get_value(Register::S), expected_s);
    }

    #[test]
    fn subroutine_call_stops_at_the_first_failed_push() {
        // Memory answers 0x0000..=0x00FF only, so the stack page is unmapped.
        let config = MachineConfig {
            memories: vec![MemoryConfig {
                address_bits: 8,
                range_prefix: Some("00000000".to_owned()),
            }],
        };
        let mut machine = Machine::with_config(&config).expect("valid config");
        // 0: ADR 0x00 0x09; 3: SUBR
        machine.load([(0, 2), (1, 0x00), (2, 0x09), (3, Opcode::Subr.id())]);
        assert!(machine.clock().running);

        let report = machine.clock();
        assert!(!report.running);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(
            machine.run_state().fault(),
            Some(Fault::NoDeviceResponded {
                access: Access::Write,
                address: 0xFFFF
            })
        );
        assert_eq!(machine.get_value(Register::S), 255);
        assert_eq!(machine.get_value(Register::P), 4);
        assert_eq!(machine.get_value(Register::R), 9);
    }

    #[test]
    fn subroutine_round_trip() {
        // 0: ADR 0x00 0x10; 3: SUBR; 4: HLT ... 0x10: CLA 9; 0x12: RET
        let mut program = vec![0_u8; 0x13];
        program[..5].copy_from_slice(&[2, 0x00, 0x10, Opcode::Subr.id(), Opcode::Hlt.id()]);
        program[0x10..0x13].copy_from_slice(&[Opcode::Cla.id(), 9, Opcode::Ret.id()]);
        let mut machine = machine_with(&program);

        machine.clock();
        machine.clock();
        assert_eq!(machine.get_value(Register::P), 0x10);
        assert_eq!(machine.get_value(Register::S), 253);

        machine.clock();
        machine.clock();
        assert_eq!(machine.get_value(Register::P), 4);
        assert_eq!(machine.get_value(Register::S), 255);

        let report = machine.clock();
        assert!(!report.running);
        assert_eq!(machine.get_value(Register::A), 9);
    }

    #[test]
    fn halt_is_terminal() {
        let mut machine = machine_with(&[Opcode::Hlt.id(), Opcode::Cla.id(), 1]);
        let report = machine.clock();
        assert!(!report.running);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].severity, Severity::Info);
        assert_eq!(machine.run_state(), RunState::Halted(HaltReason::Instruction));

        let report = machine.clock();
        assert!(!report.running);
        assert!(report.diagnostics.is_empty());
        assert_eq!(machine.get_value(Register::P), 1);
    }

    #[rstest]
    #[case(16)]
    #[case(19)]
    #[case(46)]
    #[case(255)]
    fn unassigned_opcode_halts_fatally(#[case] id: u8) {
        let mut machine = machine_with(&[id]);
        let report = machine.clock();
        assert!(!report.running);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].severity, Severity::Fatal);
        assert_eq!(
            machine.run_state().fault(),
            Some(Fault::InvalidOpcode(id))
        );
    }

    #[test]
    fn fetch_from_empty_bus_halts() {
        let mut machine = Machine::new();
        let report = machine.clock();
        assert!(!report.running);
        assert_eq!(
            machine.run_state().fault(),
            Some(Fault::NoDeviceResponded {
                access: Access::Read,
                address: 0
            })
        );
        assert_eq!(machine.get_value(Register::P), 1);
    }

    #[test]
    fn program_counter_wrap_warns() {
        let mut machine = machine_with(&[]);
        set(&mut machine, Register::P, 0xFFFF);
        machine
            .bus_mut()
            .write(0xFFFF, Opcode::Nop.id(), &mut Vec::new())
            .expect("memory mounted");
        let report = machine.clock();
        assert!(report.running);
        assert_eq!(report.diagnostics[0].event, Event::ProgramCounterWrapped);
        assert_eq!(machine.get_value(Register::P), 0);
    }

    #[test]
    fn small_memory_mirrors_across_the_bus() {
        let mut machine = Machine::new();
        machine.mount(Box::new(Memory::new(6).expect("valid width")));
        machine.load([(0, Opcode::Cla.id()), (1, 5), (2, Opcode::Hlt.id())]);
        set(&mut machine, Register::P, 64);
        machine.clock();
        assert_eq!(machine.get_value(Register::A), 5);
    }

    proptest! {
        #[test]
        fn push_then_pop_restores_a_and_s(a: u8, s: u8) {
            let mut machine = machine_with(&[Opcode::Psh.id(), Opcode::Cla.id(), 0, Opcode::Pop.id()]);
            set(&mut machine, Register::A, u32::from(a));
            set(&mut machine, Register::S, u32::from(s));
            for _ in 0..3 {
                prop_assert!(machine.clock().running);
            }
            prop_assert_eq!(machine.get_value(Register::A), u16::from(a));
            prop_assert_eq!(machine.get_value(Register::S), u16::from(s));
        }
    }
}
