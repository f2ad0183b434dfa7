//! CPU status register (P).
//!
//! ```text
//! 7  6  5  4  3  2  1  0
//! N  V  U  B  D  I  Z  C
//! │  │  │  │  │  │  │  └─ Carry
//! │  │  │  │  │  │  └──── Zero
//! │  │  │  │  │  └─────── Interrupt Disable
//! │  │  │  │  └────────── Decimal (ignored by NES arithmetic)
//! │  │  │  └───────────── Break (only meaningful on the stack)
//! │  │  └──────────────── Unused (reads as 1 on the stack)
//! │  └─────────────────── Overflow
//! └────────────────────── Negative
//! ```
//!
//! B and U are not physical flag bits: every pushed copy of P has U set,
//! B is set only by PHP and BRK pushes, and a pulled P ignores both.

use bitflags::bitflags;

bitflags! {
    /// CPU status register flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Status: u8 {
        /// Carry.
        const C = 1 << 0;
        /// Zero.
        const Z = 1 << 1;
        /// Interrupt disable (masks IRQ; NMI is unaffected).
        const I = 1 << 2;
        /// Decimal mode. Latches but has no arithmetic effect on the NES.
        const D = 1 << 3;
        /// Break. Set on PHP/BRK pushes, clear on IRQ/NMI pushes.
        const B = 1 << 4;
        /// Unused. Always set when P is pushed.
        const U = 1 << 5;
        /// Signed overflow.
        const V = 1 << 6;
        /// Negative (bit 7 of the last result).
        const N = 1 << 7;
    }
}

impl Status {
    /// Status at power-on and after reset: I and U set.
    pub const POWER_ON: Self = Self::I.union(Self::U);

    /// Update Z and N from a result byte.
    #[inline]
    pub fn set_zn(&mut self, value: u8) {
        self.set(Self::Z, value == 0);
        self.set(Self::N, value & 0x80 != 0);
    }

    /// Byte pushed to the stack: U always set, B only for PHP/BRK.
    #[must_use]
    #[inline]
    pub const fn to_stack_byte(self, brk: bool) -> u8 {
        let byte = self.bits() | Self::U.bits();
        if brk { byte | Self::B.bits() } else { byte }
    }

    /// Status restored from a stack byte: B discarded, U forced set.
    #[must_use]
    #[inline]
    pub fn from_stack_byte(byte: u8) -> Self {
        Self::from_bits_truncate(byte & !Self::B.bits()) | Self::U
    }
}
