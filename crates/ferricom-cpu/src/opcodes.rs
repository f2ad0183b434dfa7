//! Opcode decode table.
//!
//! The 256-entry table maps an opcode byte to its mnemonic, addressing
//! mode, base cycle count, and whether the documented page-crossing penalty
//! applies. Only the 151 documented opcodes are present; the remaining
//! entries are `None`, and the CPU reports executing one as an
//! [`IllegalOpcode`](crate::CpuError::IllegalOpcode) fault.

use crate::addressing::AddrMode;

/// Instruction mnemonic, used for execution dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)] // variants are the standard 6502 mnemonics
pub enum Mnemonic {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx,
    Iny, Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp,
    Rol, Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay,
    Tsx, Txa, Txs, Tya,
}

/// Decoded opcode entry.
#[derive(Debug, Clone, Copy)]
pub struct Opcode {
    /// Instruction mnemonic.
    pub mnemonic: Mnemonic,
    /// Addressing mode.
    pub mode: AddrMode,
    /// Base cycle count from the documented table.
    pub cycles: u8,
    /// One extra cycle when the effective address crosses a page.
    pub page_penalty: bool,
}

const fn op(mnemonic: Mnemonic, mode: AddrMode, cycles: u8, page_penalty: bool) -> Option<Opcode> {
    Some(Opcode {
        mnemonic,
        mode,
        cycles,
        page_penalty,
    })
}

/// Decode table for all 256 opcode bytes; `None` marks undocumented opcodes.
pub const OPCODES: [Option<Opcode>; 256] = {
    use AddrMode::{
        Absolute as Abs, AbsoluteX as Abx, AbsoluteY as Aby, Accumulator as Acc,
        Immediate as Imm, Implied as Imp, IndexedIndirect as Izx, Indirect as Ind,
        IndirectIndexed as Izy, Relative as Rel, ZeroPage as Zpg, ZeroPageX as Zpx,
        ZeroPageY as Zpy,
    };
    use Mnemonic::*;

    let mut t: [Option<Opcode>; 256] = [None; 256];

    // Load/store
    t[0xA9] = op(Lda, Imm, 2, false);
    t[0xA5] = op(Lda, Zpg, 3, false);
    t[0xB5] = op(Lda, Zpx, 4, false);
    t[0xAD] = op(Lda, Abs, 4, false);
    t[0xBD] = op(Lda, Abx, 4, true);
    t[0xB9] = op(Lda, Aby, 4, true);
    t[0xA1] = op(Lda, Izx, 6, false);
    t[0xB1] = op(Lda, Izy, 5, true);
    t[0xA2] = op(Ldx, Imm, 2, false);
    t[0xA6] = op(Ldx, Zpg, 3, false);
    t[0xB6] = op(Ldx, Zpy, 4, false);
    t[0xAE] = op(Ldx, Abs, 4, false);
    t[0xBE] = op(Ldx, Aby, 4, true);
    t[0xA0] = op(Ldy, Imm, 2, false);
    t[0xA4] = op(Ldy, Zpg, 3, false);
    t[0xB4] = op(Ldy, Zpx, 4, false);
    t[0xAC] = op(Ldy, Abs, 4, false);
    t[0xBC] = op(Ldy, Abx, 4, true);
    t[0x85] = op(Sta, Zpg, 3, false);
    t[0x95] = op(Sta, Zpx, 4, false);
    t[0x8D] = op(Sta, Abs, 4, false);
    t[0x9D] = op(Sta, Abx, 5, false);
    t[0x99] = op(Sta, Aby, 5, false);
    t[0x81] = op(Sta, Izx, 6, false);
    t[0x91] = op(Sta, Izy, 6, false);
    t[0x86] = op(Stx, Zpg, 3, false);
    t[0x96] = op(Stx, Zpy, 4, false);
    t[0x8E] = op(Stx, Abs, 4, false);
    t[0x84] = op(Sty, Zpg, 3, false);
    t[0x94] = op(Sty, Zpx, 4, false);
    t[0x8C] = op(Sty, Abs, 4, false);

    // Register transfers
    t[0xAA] = op(Tax, Imp, 2, false);
    t[0xA8] = op(Tay, Imp, 2, false);
    t[0xBA] = op(Tsx, Imp, 2, false);
    t[0x8A] = op(Txa, Imp, 2, false);
    t[0x9A] = op(Txs, Imp, 2, false);
    t[0x98] = op(Tya, Imp, 2, false);

    // Stack
    t[0x48] = op(Pha, Imp, 3, false);
    t[0x08] = op(Php, Imp, 3, false);
    t[0x68] = op(Pla, Imp, 4, false);
    t[0x28] = op(Plp, Imp, 4, false);

    // Logic
    t[0x29] = op(And, Imm, 2, false);
    t[0x25] = op(And, Zpg, 3, false);
    t[0x35] = op(And, Zpx, 4, false);
    t[0x2D] = op(And, Abs, 4, false);
    t[0x3D] = op(And, Abx, 4, true);
    t[0x39] = op(And, Aby, 4, true);
    t[0x21] = op(And, Izx, 6, false);
    t[0x31] = op(And, Izy, 5, true);
    t[0x09] = op(Ora, Imm, 2, false);
    t[0x05] = op(Ora, Zpg, 3, false);
    t[0x15] = op(Ora, Zpx, 4, false);
    t[0x0D] = op(Ora, Abs, 4, false);
    t[0x1D] = op(Ora, Abx, 4, true);
    t[0x19] = op(Ora, Aby, 4, true);
    t[0x01] = op(Ora, Izx, 6, false);
    t[0x11] = op(Ora, Izy, 5, true);
    t[0x49] = op(Eor, Imm, 2, false);
    t[0x45] = op(Eor, Zpg, 3, false);
    t[0x55] = op(Eor, Zpx, 4, false);
    t[0x4D] = op(Eor, Abs, 4, false);
    t[0x5D] = op(Eor, Abx, 4, true);
    t[0x59] = op(Eor, Aby, 4, true);
    t[0x41] = op(Eor, Izx, 6, false);
    t[0x51] = op(Eor, Izy, 5, true);
    t[0x24] = op(Bit, Zpg, 3, false);
    t[0x2C] = op(Bit, Abs, 4, false);

    // Arithmetic
    t[0x69] = op(Adc, Imm, 2, false);
    t[0x65] = op(Adc, Zpg, 3, false);
    t[0x75] = op(Adc, Zpx, 4, false);
    t[0x6D] = op(Adc, Abs, 4, false);
    t[0x7D] = op(Adc, Abx, 4, true);
    t[0x79] = op(Adc, Aby, 4, true);
    t[0x61] = op(Adc, Izx, 6, false);
    t[0x71] = op(Adc, Izy, 5, true);
    t[0xE9] = op(Sbc, Imm, 2, false);
    t[0xE5] = op(Sbc, Zpg, 3, false);
    t[0xF5] = op(Sbc, Zpx, 4, false);
    t[0xED] = op(Sbc, Abs, 4, false);
    t[0xFD] = op(Sbc, Abx, 4, true);
    t[0xF9] = op(Sbc, Aby, 4, true);
    t[0xE1] = op(Sbc, Izx, 6, false);
    t[0xF1] = op(Sbc, Izy, 5, true);

    // Compare
    t[0xC9] = op(Cmp, Imm, 2, false);
    t[0xC5] = op(Cmp, Zpg, 3, false);
    t[0xD5] = op(Cmp, Zpx, 4, false);
    t[0xCD] = op(Cmp, Abs, 4, false);
    t[0xDD] = op(Cmp, Abx, 4, true);
    t[0xD9] = op(Cmp, Aby, 4, true);
    t[0xC1] = op(Cmp, Izx, 6, false);
    t[0xD1] = op(Cmp, Izy, 5, true);
    t[0xE0] = op(Cpx, Imm, 2, false);
    t[0xE4] = op(Cpx, Zpg, 3, false);
    t[0xEC] = op(Cpx, Abs, 4, false);
    t[0xC0] = op(Cpy, Imm, 2, false);
    t[0xC4] = op(Cpy, Zpg, 3, false);
    t[0xCC] = op(Cpy, Abs, 4, false);

    // Increment/decrement
    t[0xE6] = op(Inc, Zpg, 5, false);
    t[0xF6] = op(Inc, Zpx, 6, false);
    t[0xEE] = op(Inc, Abs, 6, false);
    t[0xFE] = op(Inc, Abx, 7, false);
    t[0xC6] = op(Dec, Zpg, 5, false);
    t[0xD6] = op(Dec, Zpx, 6, false);
    t[0xCE] = op(Dec, Abs, 6, false);
    t[0xDE] = op(Dec, Abx, 7, false);
    t[0xE8] = op(Inx, Imp, 2, false);
    t[0xC8] = op(Iny, Imp, 2, false);
    t[0xCA] = op(Dex, Imp, 2, false);
    t[0x88] = op(Dey, Imp, 2, false);

    // Shifts/rotates
    t[0x0A] = op(Asl, Acc, 2, false);
    t[0x06] = op(Asl, Zpg, 5, false);
    t[0x16] = op(Asl, Zpx, 6, false);
    t[0x0E] = op(Asl, Abs, 6, false);
    t[0x1E] = op(Asl, Abx, 7, false);
    t[0x4A] = op(Lsr, Acc, 2, false);
    t[0x46] = op(Lsr, Zpg, 5, false);
    t[0x56] = op(Lsr, Zpx, 6, false);
    t[0x4E] = op(Lsr, Abs, 6, false);
    t[0x5E] = op(Lsr, Abx, 7, false);
    t[0x2A] = op(Rol, Acc, 2, false);
    t[0x26] = op(Rol, Zpg, 5, false);
    t[0x36] = op(Rol, Zpx, 6, false);
    t[0x2E] = op(Rol, Abs, 6, false);
    t[0x3E] = op(Rol, Abx, 7, false);
    t[0x6A] = op(Ror, Acc, 2, false);
    t[0x66] = op(Ror, Zpg, 5, false);
    t[0x76] = op(Ror, Zpx, 6, false);
    t[0x6E] = op(Ror, Abs, 6, false);
    t[0x7E] = op(Ror, Abx, 7, false);

    // Jumps and subroutines
    t[0x4C] = op(Jmp, Abs, 3, false);
    t[0x6C] = op(Jmp, Ind, 5, false);
    t[0x20] = op(Jsr, Abs, 6, false);
    t[0x60] = op(Rts, Imp, 6, false);
    t[0x40] = op(Rti, Imp, 6, false);
    t[0x00] = op(Brk, Imp, 7, false);

    // Branches (2 cycles, +1 taken, +1 page cross)
    t[0x90] = op(Bcc, Rel, 2, false);
    t[0xB0] = op(Bcs, Rel, 2, false);
    t[0xF0] = op(Beq, Rel, 2, false);
    t[0xD0] = op(Bne, Rel, 2, false);
    t[0x30] = op(Bmi, Rel, 2, false);
    t[0x10] = op(Bpl, Rel, 2, false);
    t[0x50] = op(Bvc, Rel, 2, false);
    t[0x70] = op(Bvs, Rel, 2, false);

    // Flag operations
    t[0x18] = op(Clc, Imp, 2, false);
    t[0xD8] = op(Cld, Imp, 2, false);
    t[0x58] = op(Cli, Imp, 2, false);
    t[0xB8] = op(Clv, Imp, 2, false);
    t[0x38] = op(Sec, Imp, 2, false);
    t[0xF8] = op(Sed, Imp, 2, false);
    t[0x78] = op(Sei, Imp, 2, false);

    t[0xEA] = op(Nop, Imp, 2, false);

    t
};
