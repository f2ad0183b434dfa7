//! 6502 CPU core: registers, interrupt servicing, and instruction execution.

use crate::addressing::AddrMode;
use crate::bus::Bus;
use crate::opcodes::{Mnemonic, Opcode, OPCODES};
use crate::status::Status;
use crate::vectors;

/// Faults that abort instruction execution.
///
/// Test ROMs sometimes run into undocumented opcodes on purpose; the policy
/// here is to stop with a diagnostic rather than guess at their behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CpuError {
    /// An opcode outside the documented set was fetched.
    #[error("illegal opcode ${opcode:02X} at ${pc:04X}")]
    IllegalOpcode {
        /// The offending opcode byte.
        opcode: u8,
        /// Address it was fetched from.
        pc: u16,
    },
}

/// Resolved operand location.
struct Target {
    addr: u16,
    page_crossed: bool,
}

/// NES 6502 CPU.
///
/// One [`step`](Cpu::step) executes a single instruction (or services a
/// pending interrupt) and returns the cycles consumed, which the system
/// driver converts into PPU dots.
#[derive(Debug)]
pub struct Cpu {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Stack pointer; the stack lives at $0100 + SP.
    pub sp: u8,
    /// Program counter.
    pub pc: u16,
    /// Status register.
    pub status: Status,
    /// Total cycles executed since reset.
    pub cycles: u64,
    nmi_pending: bool,
    irq_pending: bool,
    /// I-flag value committed at the top of the next step. SEI/CLI/PLP land
    /// here; RTI writes I directly.
    deferred_i: Option<bool>,
}

impl Cpu {
    /// Create a CPU in power-on state. Call [`reset`](Cpu::reset) before
    /// stepping so PC is loaded from the reset vector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: Status::POWER_ON,
            cycles: 0,
            nmi_pending: false,
            irq_pending: false,
            deferred_i: None,
        }
    }

    /// Reset: registers cleared, SP = $FD, P = U|I, PC loaded from $FFFC.
    pub fn reset(&mut self, bus: &mut impl Bus) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFD;
        self.status = Status::POWER_ON;
        self.pc = bus.read_word(vectors::RESET);
        self.cycles = 0;
        self.nmi_pending = false;
        self.irq_pending = false;
        self.deferred_i = None;
    }

    /// Request an NMI. Always serviced at the next step boundary.
    pub fn request_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Request an IRQ. Latched even while I is set; masking is checked when
    /// the CPU reaches the next step boundary.
    pub fn request_irq(&mut self) {
        self.irq_pending = true;
    }

    /// Execute one instruction or service a pending interrupt.
    ///
    /// In order: commit a deferred I-flag change, service NMI (always) or
    /// IRQ (when I is clear), otherwise fetch and execute one opcode.
    /// Returns the cycles consumed.
    ///
    /// # Errors
    ///
    /// [`CpuError::IllegalOpcode`] when an undocumented opcode is fetched;
    /// PC is left past the offending byte.
    pub fn step(&mut self, bus: &mut impl Bus) -> Result<u8, CpuError> {
        if let Some(value) = self.deferred_i.take() {
            self.status.set(Status::I, value);
        }

        if self.nmi_pending {
            self.nmi_pending = false;
            return Ok(self.service_interrupt(bus, vectors::NMI));
        }
        if self.irq_pending && !self.status.contains(Status::I) {
            self.irq_pending = false;
            return Ok(self.service_interrupt(bus, vectors::IRQ));
        }

        let pc = self.pc;
        let opcode = bus.read(pc);
        self.pc = self.pc.wrapping_add(1);

        let Some(decoded) = OPCODES[opcode as usize] else {
            log::error!("illegal opcode ${opcode:02X} at ${pc:04X}");
            return Err(CpuError::IllegalOpcode { opcode, pc });
        };

        let cycles = self.execute(bus, decoded);
        self.cycles += u64::from(cycles);
        Ok(cycles)
    }

    /// Push PC and P (B clear, U set), set I, jump through the vector.
    fn service_interrupt(&mut self, bus: &mut impl Bus, vector: u16) -> u8 {
        self.push_word(bus, self.pc);
        self.push(bus, self.status.to_stack_byte(false));
        self.status.insert(Status::I);
        self.pc = bus.read_word(vector);
        self.cycles += 7;
        7
    }

    // ------------------------------------------------------------------
    // Operand resolution
    // ------------------------------------------------------------------

    fn fetch(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    fn fetch_word(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = u16::from(self.fetch(bus));
        let hi = u16::from(self.fetch(bus));
        hi << 8 | lo
    }

    /// Compute the effective address for a memory operand.
    fn resolve(&mut self, bus: &mut impl Bus, mode: AddrMode) -> Target {
        match mode {
            AddrMode::Immediate => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                Target {
                    addr,
                    page_crossed: false,
                }
            }
            AddrMode::ZeroPage => Target {
                addr: u16::from(self.fetch(bus)),
                page_crossed: false,
            },
            AddrMode::ZeroPageX => Target {
                addr: u16::from(self.fetch(bus).wrapping_add(self.x)),
                page_crossed: false,
            },
            AddrMode::ZeroPageY => Target {
                addr: u16::from(self.fetch(bus).wrapping_add(self.y)),
                page_crossed: false,
            },
            AddrMode::Absolute => Target {
                addr: self.fetch_word(bus),
                page_crossed: false,
            },
            AddrMode::AbsoluteX => {
                let base = self.fetch_word(bus);
                let addr = base.wrapping_add(u16::from(self.x));
                Target {
                    addr,
                    page_crossed: base & 0xFF00 != addr & 0xFF00,
                }
            }
            AddrMode::AbsoluteY => {
                let base = self.fetch_word(bus);
                let addr = base.wrapping_add(u16::from(self.y));
                Target {
                    addr,
                    page_crossed: base & 0xFF00 != addr & 0xFF00,
                }
            }
            AddrMode::Indirect => {
                // JMP only. The pointer read never leaves its page.
                let ptr = self.fetch_word(bus);
                Target {
                    addr: bus.read_word_wrapped(ptr),
                    page_crossed: false,
                }
            }
            AddrMode::IndexedIndirect => {
                let zp = self.fetch(bus).wrapping_add(self.x);
                let lo = u16::from(bus.read(u16::from(zp)));
                let hi = u16::from(bus.read(u16::from(zp.wrapping_add(1))));
                Target {
                    addr: hi << 8 | lo,
                    page_crossed: false,
                }
            }
            AddrMode::IndirectIndexed => {
                let zp = self.fetch(bus);
                let lo = u16::from(bus.read(u16::from(zp)));
                let hi = u16::from(bus.read(u16::from(zp.wrapping_add(1))));
                let base = hi << 8 | lo;
                let addr = base.wrapping_add(u16::from(self.y));
                Target {
                    addr,
                    page_crossed: base & 0xFF00 != addr & 0xFF00,
                }
            }
            AddrMode::Implied | AddrMode::Accumulator | AddrMode::Relative => {
                unreachable!("mode {mode:?} has no memory operand")
            }
        }
    }

    /// Read the operand for a read-type instruction, tracking the penalty.
    fn load(&mut self, bus: &mut impl Bus, op: Opcode, extra: &mut u8) -> u8 {
        let target = self.resolve(bus, op.mode);
        if target.page_crossed && op.page_penalty {
            *extra = 1;
        }
        bus.read(target.addr)
    }

    /// Read-modify-write: the original value is written back once before
    /// the result, as the hardware does.
    fn modify(&mut self, bus: &mut impl Bus, op: Opcode, f: fn(&mut Self, u8) -> u8) {
        let target = self.resolve(bus, op.mode);
        let value = bus.read(target.addr);
        bus.write(target.addr, value);
        let result = f(self, value);
        bus.write(target.addr, result);
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    #[allow(clippy::too_many_lines)] // one arm per mnemonic
    fn execute(&mut self, bus: &mut impl Bus, op: Opcode) -> u8 {
        use Mnemonic::*;

        let mut extra = 0u8;
        match op.mnemonic {
            // Loads
            Lda => {
                self.a = self.load(bus, op, &mut extra);
                self.status.set_zn(self.a);
            }
            Ldx => {
                self.x = self.load(bus, op, &mut extra);
                self.status.set_zn(self.x);
            }
            Ldy => {
                self.y = self.load(bus, op, &mut extra);
                self.status.set_zn(self.y);
            }

            // Stores
            Sta => {
                let target = self.resolve(bus, op.mode);
                bus.write(target.addr, self.a);
            }
            Stx => {
                let target = self.resolve(bus, op.mode);
                bus.write(target.addr, self.x);
            }
            Sty => {
                let target = self.resolve(bus, op.mode);
                bus.write(target.addr, self.y);
            }

            // Transfers
            Tax => {
                self.x = self.a;
                self.status.set_zn(self.x);
            }
            Tay => {
                self.y = self.a;
                self.status.set_zn(self.y);
            }
            Txa => {
                self.a = self.x;
                self.status.set_zn(self.a);
            }
            Tya => {
                self.a = self.y;
                self.status.set_zn(self.a);
            }
            Tsx => {
                self.x = self.sp;
                self.status.set_zn(self.x);
            }
            Txs => self.sp = self.x, // no flags

            // Stack
            Pha => self.push(bus, self.a),
            Php => {
                let byte = self.status.to_stack_byte(true);
                self.push(bus, byte);
            }
            Pla => {
                self.a = self.pop(bus);
                self.status.set_zn(self.a);
            }
            Plp => {
                let pulled = Status::from_stack_byte(self.pop(bus));
                // The I change waits one instruction; everything else lands now.
                self.deferred_i = Some(pulled.contains(Status::I));
                let keep_i = self.status & Status::I;
                self.status = (pulled - Status::I) | keep_i;
            }

            // Logic
            And => {
                self.a &= self.load(bus, op, &mut extra);
                self.status.set_zn(self.a);
            }
            Ora => {
                self.a |= self.load(bus, op, &mut extra);
                self.status.set_zn(self.a);
            }
            Eor => {
                self.a ^= self.load(bus, op, &mut extra);
                self.status.set_zn(self.a);
            }
            Bit => {
                let value = self.load(bus, op, &mut extra);
                self.status.set(Status::Z, self.a & value == 0);
                self.status.set(Status::V, value & 0x40 != 0);
                self.status.set(Status::N, value & 0x80 != 0);
            }

            // Arithmetic (binary mode only; D is ignored)
            Adc => {
                let value = self.load(bus, op, &mut extra);
                self.add(value);
            }
            Sbc => {
                let value = self.load(bus, op, &mut extra);
                self.add(!value);
            }

            // Compares
            Cmp => {
                let value = self.load(bus, op, &mut extra);
                self.compare(self.a, value);
            }
            Cpx => {
                let value = self.load(bus, op, &mut extra);
                self.compare(self.x, value);
            }
            Cpy => {
                let value = self.load(bus, op, &mut extra);
                self.compare(self.y, value);
            }

            // Increment/decrement
            Inc => self.modify(bus, op, |cpu, v| {
                let r = v.wrapping_add(1);
                cpu.status.set_zn(r);
                r
            }),
            Dec => self.modify(bus, op, |cpu, v| {
                let r = v.wrapping_sub(1);
                cpu.status.set_zn(r);
                r
            }),
            Inx => {
                self.x = self.x.wrapping_add(1);
                self.status.set_zn(self.x);
            }
            Iny => {
                self.y = self.y.wrapping_add(1);
                self.status.set_zn(self.y);
            }
            Dex => {
                self.x = self.x.wrapping_sub(1);
                self.status.set_zn(self.x);
            }
            Dey => {
                self.y = self.y.wrapping_sub(1);
                self.status.set_zn(self.y);
            }

            // Shifts and rotates
            Asl => {
                if op.mode == AddrMode::Accumulator {
                    let value = self.a;
                    self.a = self.asl_value(value);
                } else {
                    self.modify(bus, op, Self::asl_value);
                }
            }
            Lsr => {
                if op.mode == AddrMode::Accumulator {
                    let value = self.a;
                    self.a = self.lsr_value(value);
                } else {
                    self.modify(bus, op, Self::lsr_value);
                }
            }
            Rol => {
                if op.mode == AddrMode::Accumulator {
                    let value = self.a;
                    self.a = self.rol_value(value);
                } else {
                    self.modify(bus, op, Self::rol_value);
                }
            }
            Ror => {
                if op.mode == AddrMode::Accumulator {
                    let value = self.a;
                    self.a = self.ror_value(value);
                } else {
                    self.modify(bus, op, Self::ror_value);
                }
            }

            // Jumps and subroutines
            Jmp => {
                let target = self.resolve(bus, op.mode);
                self.pc = target.addr;
            }
            Jsr => {
                let target = self.fetch_word(bus);
                // Push the address of the last operand byte; RTS adds 1.
                self.push_word(bus, self.pc.wrapping_sub(1));
                self.pc = target;
            }
            Rts => {
                self.pc = self.pop_word(bus).wrapping_add(1);
            }
            Rti => {
                // Unlike PLP, RTI restores I immediately.
                self.status = Status::from_stack_byte(self.pop(bus));
                self.deferred_i = None;
                self.pc = self.pop_word(bus);
            }
            Brk => {
                // BRK is two bytes; the padding byte is skipped.
                self.pc = self.pc.wrapping_add(1);
                self.push_word(bus, self.pc);
                self.push(bus, self.status.to_stack_byte(true));
                self.status.insert(Status::I);
                self.pc = bus.read_word(vectors::IRQ);
            }

            // Branches
            Bcc => extra = self.branch(bus, !self.status.contains(Status::C)),
            Bcs => extra = self.branch(bus, self.status.contains(Status::C)),
            Bne => extra = self.branch(bus, !self.status.contains(Status::Z)),
            Beq => extra = self.branch(bus, self.status.contains(Status::Z)),
            Bpl => extra = self.branch(bus, !self.status.contains(Status::N)),
            Bmi => extra = self.branch(bus, self.status.contains(Status::N)),
            Bvc => extra = self.branch(bus, !self.status.contains(Status::V)),
            Bvs => extra = self.branch(bus, self.status.contains(Status::V)),

            // Flags. SEI and CLI defer the I change by one instruction.
            Clc => self.status.remove(Status::C),
            Sec => self.status.insert(Status::C),
            Cld => self.status.remove(Status::D),
            Sed => self.status.insert(Status::D),
            Clv => self.status.remove(Status::V),
            Cli => self.deferred_i = Some(false),
            Sei => self.deferred_i = Some(true),

            Nop => {}
        }

        op.cycles + extra
    }

    /// Shared ADC core; SBC passes the inverted operand.
    fn add(&mut self, value: u8) {
        let carry_in = u16::from(self.status.contains(Status::C));
        let sum = u16::from(self.a) + u16::from(value) + carry_in;
        let result = sum as u8;

        self.status.set(Status::C, sum > 0xFF);
        // Signed overflow: both inputs share a sign the result lacks.
        self.status
            .set(Status::V, (self.a ^ result) & (value ^ result) & 0x80 != 0);
        self.a = result;
        self.status.set_zn(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.status.set(Status::C, register >= value);
        self.status.set_zn(register.wrapping_sub(value));
    }

    fn asl_value(&mut self, value: u8) -> u8 {
        self.status.set(Status::C, value & 0x80 != 0);
        let result = value << 1;
        self.status.set_zn(result);
        result
    }

    fn lsr_value(&mut self, value: u8) -> u8 {
        self.status.set(Status::C, value & 0x01 != 0);
        let result = value >> 1;
        self.status.set_zn(result);
        result
    }

    fn rol_value(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.status.contains(Status::C));
        self.status.set(Status::C, value & 0x80 != 0);
        let result = value << 1 | carry_in;
        self.status.set_zn(result);
        result
    }

    fn ror_value(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.status.contains(Status::C));
        self.status.set(Status::C, value & 0x01 != 0);
        let result = value >> 1 | carry_in << 7;
        self.status.set_zn(result);
        result
    }

    /// Take or skip a branch; returns the extra cycles (0, 1, or 2).
    fn branch(&mut self, bus: &mut impl Bus, taken: bool) -> u8 {
        let offset = self.fetch(bus) as i8;
        if !taken {
            return 0;
        }
        let from = self.pc;
        self.pc = self.pc.wrapping_add(offset as u16);
        if from & 0xFF00 == self.pc & 0xFF00 {
            1
        } else {
            2
        }
    }

    // ------------------------------------------------------------------
    // Stack
    // ------------------------------------------------------------------

    pub(crate) fn push(&mut self, bus: &mut impl Bus, value: u8) {
        bus.write(0x0100 | u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    pub(crate) fn pop(&mut self, bus: &mut impl Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 | u16::from(self.sp))
    }

    /// Push a word, high byte first.
    pub(crate) fn push_word(&mut self, bus: &mut impl Bus, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, (value & 0xFF) as u8);
    }

    /// Pop a word, low byte first.
    pub(crate) fn pop_word(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = u16::from(self.pop(bus));
        let hi = u16::from(self.pop(bus));
        hi << 8 | lo
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlatBus {
        mem: Box<[u8; 0x10000]>,
    }

    impl FlatBus {
        fn new() -> Self {
            Self {
                mem: Box::new([0; 0x10000]),
            }
        }

        /// Place a program at $8000 and point the reset vector at it.
        fn with_program(program: &[u8]) -> (Cpu, Self) {
            let mut bus = Self::new();
            bus.mem[0x8000..0x8000 + program.len()].copy_from_slice(program);
            bus.mem[0xFFFC] = 0x00;
            bus.mem[0xFFFD] = 0x80;
            let mut cpu = Cpu::new();
            cpu.reset(&mut bus);
            (cpu, bus)
        }
    }

    impl Bus for FlatBus {
        fn read(&mut self, addr: u16) -> u8 {
            self.mem[addr as usize]
        }

        fn write(&mut self, addr: u16, value: u8) {
            self.mem[addr as usize] = value;
        }
    }

    fn step(cpu: &mut Cpu, bus: &mut FlatBus) -> u8 {
        cpu.step(bus).expect("legal opcode")
    }

    #[test]
    fn reset_state() {
        let (cpu, _) = FlatBus::with_program(&[0xEA]);
        assert_eq!(cpu.pc, 0x8000);
        assert_eq!(cpu.sp, 0xFD);
        assert_eq!(cpu.status, Status::POWER_ON);
        assert_eq!(cpu.cycles, 0);
    }

    #[test]
    fn lda_immediate_flags_and_cycles() {
        // LDA #$00, LDA #$80, LDA #$7F
        let (mut cpu, mut bus) =
            FlatBus::with_program(&[0xA9, 0x00, 0xA9, 0x80, 0xA9, 0x7F]);

        step(&mut cpu, &mut bus);
        assert!(cpu.status.contains(Status::Z));
        step(&mut cpu, &mut bus);
        assert!(cpu.status.contains(Status::N));
        step(&mut cpu, &mut bus);

        assert_eq!(cpu.a, 0x7F);
        assert!(!cpu.status.contains(Status::Z));
        assert!(!cpu.status.contains(Status::N));
        assert_eq!(cpu.cycles, 6);
    }

    #[test]
    fn adc_signed_overflow() {
        // A=$50 + $50 -> $A0, V set, C clear
        let (mut cpu, mut bus) = FlatBus::with_program(&[0x69, 0x50]);
        cpu.a = 0x50;
        step(&mut cpu, &mut bus);

        assert_eq!(cpu.a, 0xA0);
        assert!(!cpu.status.contains(Status::C));
        assert!(cpu.status.contains(Status::V));
        assert!(cpu.status.contains(Status::N));
        assert!(!cpu.status.contains(Status::Z));
    }

    #[test]
    fn sbc_borrow() {
        // A=$50 - $B0 with C=1 -> $A0, borrow (C clear), V set
        let (mut cpu, mut bus) = FlatBus::with_program(&[0xE9, 0xB0]);
        cpu.a = 0x50;
        cpu.status.insert(Status::C);
        step(&mut cpu, &mut bus);

        assert_eq!(cpu.a, 0xA0);
        assert!(!cpu.status.contains(Status::C));
        assert!(cpu.status.contains(Status::V));
        assert!(cpu.status.contains(Status::N));
    }

    #[test]
    fn jsr_rts_stack_shape() {
        // JSR $8005 / BRK BRK / RTS
        let (mut cpu, mut bus) =
            FlatBus::with_program(&[0x20, 0x05, 0x80, 0x00, 0x00, 0x60]);

        let cycles = step(&mut cpu, &mut bus);
        assert_eq!(cycles, 6);
        assert_eq!(cpu.pc, 0x8005);
        assert_eq!(cpu.sp, 0xFB);
        assert_eq!(bus.mem[0x01FD], 0x80);
        assert_eq!(bus.mem[0x01FC], 0x02);

        let cycles = step(&mut cpu, &mut bus);
        assert_eq!(cycles, 6);
        assert_eq!(cpu.pc, 0x8003);
        assert_eq!(cpu.sp, 0xFD);
    }

    #[test]
    fn jmp_indirect_page_wrap() {
        // JMP ($30FF) with $30FF=$80, $3000=$50, $3100=$40 lands at $5080
        let (mut cpu, mut bus) = FlatBus::with_program(&[0x6C, 0xFF, 0x30]);
        bus.mem[0x30FF] = 0x80;
        bus.mem[0x3000] = 0x50;
        bus.mem[0x3100] = 0x40;

        let cycles = step(&mut cpu, &mut bus);
        assert_eq!(cycles, 5);
        assert_eq!(cpu.pc, 0x5080);
    }

    #[test]
    fn page_cross_penalty_on_reads() {
        // LDA $80FF,X with X=1 crosses into $8100
        let (mut cpu, mut bus) = FlatBus::with_program(&[0xBD, 0xFF, 0x80]);
        bus.mem[0x8100] = 0x42;
        cpu.x = 1;

        assert_eq!(step(&mut cpu, &mut bus), 5);
        assert_eq!(cpu.a, 0x42);

        // Same read without the crossing costs 4
        let (mut cpu, mut bus) = FlatBus::with_program(&[0xBD, 0x00, 0x90]);
        bus.mem[0x9001] = 0x24;
        cpu.x = 1;
        assert_eq!(step(&mut cpu, &mut bus), 4);
        assert_eq!(cpu.a, 0x24);
    }

    #[test]
    fn rmw_absolute_x_fixed_cycles_and_dummy_write() {
        struct Recorder {
            inner: FlatBus,
            writes: Vec<(u16, u8)>,
        }
        impl Bus for Recorder {
            fn read(&mut self, addr: u16) -> u8 {
                self.inner.read(addr)
            }
            fn write(&mut self, addr: u16, value: u8) {
                self.writes.push((addr, value));
                self.inner.write(addr, value);
            }
        }

        // INC $80FF,X with X=1: always 7 cycles despite the page cross
        let (mut cpu, inner) = FlatBus::with_program(&[0xFE, 0xFF, 0x80]);
        let mut bus = Recorder {
            inner,
            writes: Vec::new(),
        };
        bus.inner.mem[0x8100] = 0x41;
        cpu.x = 1;

        assert_eq!(cpu.step(&mut bus).unwrap(), 7);
        // Original value written back before the result
        assert_eq!(bus.writes, vec![(0x8100, 0x41), (0x8100, 0x42)]);
    }

    #[test]
    fn branch_cycles() {
        // BNE not taken: 2
        let (mut cpu, mut bus) = FlatBus::with_program(&[0xD0, 0x10]);
        cpu.status.insert(Status::Z);
        assert_eq!(step(&mut cpu, &mut bus), 2);

        // BNE taken within the page: 3
        let (mut cpu, mut bus) = FlatBus::with_program(&[0xD0, 0x10]);
        cpu.status.remove(Status::Z);
        assert_eq!(step(&mut cpu, &mut bus), 3);
        assert_eq!(cpu.pc, 0x8012);

        // BNE taken across a page: 4
        let (mut cpu, mut bus) = FlatBus::with_program(&[0xD0, 0x80]);
        cpu.status.remove(Status::Z);
        assert_eq!(step(&mut cpu, &mut bus), 4);
    }

    #[test]
    fn zero_page_indexed_wraps() {
        // LDA $FF,X with X=2 reads $0001, not $0101
        let (mut cpu, mut bus) = FlatBus::with_program(&[0xB5, 0xFF]);
        bus.mem[0x0001] = 0x99;
        bus.mem[0x0101] = 0x11;
        cpu.x = 2;
        step(&mut cpu, &mut bus);
        assert_eq!(cpu.a, 0x99);
    }

    #[test]
    fn indirect_indexed_pointer_wraps() {
        // LDA ($FF),Y: pointer low at $FF, high at $00
        let (mut cpu, mut bus) = FlatBus::with_program(&[0xB1, 0xFF]);
        bus.mem[0x00FF] = 0x00;
        bus.mem[0x0000] = 0x20;
        bus.mem[0x2003] = 0x77;
        cpu.y = 3;
        step(&mut cpu, &mut bus);
        assert_eq!(cpu.a, 0x77);
    }

    #[test]
    fn illegal_opcode_reports_pc() {
        let (mut cpu, mut bus) = FlatBus::with_program(&[0x02]);
        assert_eq!(
            cpu.step(&mut bus),
            Err(CpuError::IllegalOpcode {
                opcode: 0x02,
                pc: 0x8000
            })
        );
    }

    #[test]
    fn brk_and_rti_round_trip() {
        // BRK at $8000, handler at $9000 runs RTI
        let (mut cpu, mut bus) = FlatBus::with_program(&[0x00]);
        bus.mem[0xFFFE] = 0x00;
        bus.mem[0xFFFF] = 0x90;
        bus.mem[0x9000] = 0x40; // RTI
        cpu.status.insert(Status::C);

        let cycles = step(&mut cpu, &mut bus);
        assert_eq!(cycles, 7);
        assert_eq!(cpu.pc, 0x9000);
        assert_eq!(cpu.sp, 0xFA);
        assert!(cpu.status.contains(Status::I));
        // Pushed status has B and U set
        assert_eq!(bus.mem[0x01FB] & 0x30, 0x30);
        // Pushed PC skips the padding byte
        assert_eq!(bus.mem[0x01FD], 0x80);
        assert_eq!(bus.mem[0x01FC], 0x02);

        step(&mut cpu, &mut bus);
        assert_eq!(cpu.pc, 0x8002);
        assert_eq!(cpu.sp, 0xFD);
        assert!(cpu.status.contains(Status::C));
        // The pulled byte had B set, but B never lands in the live P
        assert!(!cpu.status.contains(Status::B));
    }

    #[test]
    fn nmi_service() {
        let (mut cpu, mut bus) = FlatBus::with_program(&[0xEA, 0xEA]);
        bus.mem[0xFFFA] = 0x00;
        bus.mem[0xFFFB] = 0xA0;

        cpu.request_nmi();
        let cycles = step(&mut cpu, &mut bus);
        assert_eq!(cycles, 7);
        assert_eq!(cpu.pc, 0xA000);
        assert!(cpu.status.contains(Status::I));
        // Interrupt entry pushes with B clear, U set
        assert_eq!(bus.mem[0x01FB] & 0x30, 0x20);
    }

    #[test]
    fn irq_respects_i_flag_and_stays_latched() {
        let (mut cpu, mut bus) = FlatBus::with_program(&[0xEA, 0x58, 0xEA, 0xEA]);
        bus.mem[0xFFFE] = 0x00;
        bus.mem[0xFFFF] = 0xB0;

        // Reset leaves I set, so the IRQ is held pending
        cpu.request_irq();
        step(&mut cpu, &mut bus); // NOP
        assert_eq!(cpu.pc, 0x8001);

        // CLI defers the change; it lands at the top of the next step and
        // the latched IRQ is serviced at that same boundary.
        step(&mut cpu, &mut bus); // CLI
        assert!(cpu.status.contains(Status::I));

        let cycles = step(&mut cpu, &mut bus);
        assert_eq!(cycles, 7);
        assert_eq!(cpu.pc, 0xB000);
    }

    #[test]
    fn sei_commit_masks_irq_at_next_boundary() {
        // SEI's deferred change commits before the interrupt check of the
        // following step, so an IRQ latched after SEI stays pending.
        let (mut cpu, mut bus) = FlatBus::with_program(&[0x78, 0xEA, 0xEA]);
        bus.mem[0xFFFE] = 0x00;
        bus.mem[0xFFFF] = 0xC0;
        cpu.status.remove(Status::I);

        step(&mut cpu, &mut bus); // SEI (deferred)
        assert!(!cpu.status.contains(Status::I));
        cpu.request_irq();
        step(&mut cpu, &mut bus); // commit I=1, then NOP at $8001
        assert!(cpu.status.contains(Status::I));
        assert_eq!(cpu.pc, 0x8002);
    }

    #[test]
    fn irq_pending_at_sei_step_preempts_it() {
        // The interrupt check runs before the fetch, so an IRQ that is
        // already pending when SEI would execute wins.
        let (mut cpu, mut bus) = FlatBus::with_program(&[0x78]);
        bus.mem[0xFFFE] = 0x00;
        bus.mem[0xFFFF] = 0xC0;
        cpu.status.remove(Status::I);

        cpu.request_irq();
        let cycles = step(&mut cpu, &mut bus);
        assert_eq!(cycles, 7);
        assert_eq!(cpu.pc, 0xC000);
    }

    #[test]
    fn rti_restores_i_immediately() {
        // Handler clears I via RTI; an IRQ latched during the handler is
        // taken on the very next step.
        let (mut cpu, mut bus) = FlatBus::with_program(&[0xEA]);
        bus.mem[0xFFFE] = 0x00;
        bus.mem[0xFFFF] = 0xB0;
        bus.mem[0xB000] = 0x40; // RTI

        cpu.status.remove(Status::I);
        cpu.request_irq();
        step(&mut cpu, &mut bus); // take IRQ, I now set
        assert_eq!(cpu.pc, 0xB000);

        cpu.request_irq();
        step(&mut cpu, &mut bus); // RTI restores I=0 immediately
        assert!(!cpu.status.contains(Status::I));
        let cycles = step(&mut cpu, &mut bus);
        assert_eq!(cycles, 7); // IRQ taken without a one-instruction delay
    }

    #[test]
    fn stack_pointer_deltas() {
        let (mut cpu, mut bus) = FlatBus::with_program(&[0x48, 0x08, 0x68, 0x28]);
        let sp0 = cpu.sp;
        step(&mut cpu, &mut bus); // PHA
        assert_eq!(cpu.sp, sp0.wrapping_sub(1));
        step(&mut cpu, &mut bus); // PHP
        assert_eq!(cpu.sp, sp0.wrapping_sub(2));
        step(&mut cpu, &mut bus); // PLA
        assert_eq!(cpu.sp, sp0.wrapping_sub(1));
        step(&mut cpu, &mut bus); // PLP
        assert_eq!(cpu.sp, sp0);
    }

    #[test]
    fn compare_carry_semantics() {
        let (mut cpu, mut bus) = FlatBus::with_program(&[0xC9, 0x40]);
        cpu.a = 0x40;
        step(&mut cpu, &mut bus);
        assert!(cpu.status.contains(Status::C));
        assert!(cpu.status.contains(Status::Z));

        let (mut cpu, mut bus) = FlatBus::with_program(&[0xC9, 0x41]);
        cpu.a = 0x40;
        step(&mut cpu, &mut bus);
        assert!(!cpu.status.contains(Status::C));
    }

    #[test]
    fn rotate_through_carry() {
        let (mut cpu, mut bus) = FlatBus::with_program(&[0x2A, 0x6A]);
        cpu.a = 0x80;
        cpu.status.remove(Status::C);

        step(&mut cpu, &mut bus); // ROL A: $80 -> $00, C=1
        assert_eq!(cpu.a, 0x00);
        assert!(cpu.status.contains(Status::C));
        assert!(cpu.status.contains(Status::Z));

        step(&mut cpu, &mut bus); // ROR A: $00 with C=1 -> $80, C=0
        assert_eq!(cpu.a, 0x80);
        assert!(!cpu.status.contains(Status::C));
        assert!(cpu.status.contains(Status::N));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn adc_matches_wide_arithmetic(a: u8, operand: u8, carry: bool) {
                let (mut cpu, mut bus) = FlatBus::with_program(&[0x69, operand]);
                cpu.a = a;
                cpu.status.set(Status::C, carry);
                cpu.step(&mut bus).unwrap();

                let wide = u16::from(a) + u16::from(operand) + u16::from(carry);
                prop_assert_eq!(cpu.a, (wide & 0xFF) as u8);
                prop_assert_eq!(cpu.status.contains(Status::C), wide > 0xFF);
                prop_assert_eq!(cpu.status.contains(Status::Z), cpu.a == 0);
                prop_assert_eq!(cpu.status.contains(Status::N), cpu.a & 0x80 != 0);
            }

            #[test]
            fn sbc_matches_inverted_add(a: u8, operand: u8, carry: bool) {
                let (mut cpu, mut bus) = FlatBus::with_program(&[0xE9, operand]);
                cpu.a = a;
                cpu.status.set(Status::C, carry);
                cpu.step(&mut bus).unwrap();

                let wide = u16::from(a) + u16::from(!operand) + u16::from(carry);
                prop_assert_eq!(cpu.a, (wide & 0xFF) as u8);
                prop_assert_eq!(cpu.status.contains(Status::C), wide > 0xFF);
            }

            #[test]
            fn loads_never_touch_sp(value: u8) {
                let (mut cpu, mut bus) = FlatBus::with_program(&[0xA9, value]);
                let sp = cpu.sp;
                cpu.step(&mut bus).unwrap();
                prop_assert_eq!(cpu.sp, sp);
            }
        }
    }
}
