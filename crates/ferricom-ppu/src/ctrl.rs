//! PPU control register ($2000).
//!
//! ```text
//! 7  6  5  4  3  2  1  0
//! V  P  H  B  S  I  N  N
//! |  |  |  |  |  |  +--+-- Base nametable select
//! |  |  |  |  |  +-------- VRAM increment (0: +1, 1: +32)
//! |  |  |  |  +----------- Sprite pattern table for 8x8 sprites
//! |  |  |  +-------------- Background pattern table
//! |  |  +----------------- Sprite size (0: 8x8, 1: 8x16)
//! |  +-------------------- Master/slave select (unused here)
//! +----------------------- Raise NMI at the start of VBlank
//! ```

use bitflags::bitflags;

bitflags! {
    /// PPUCTRL flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Ctrl: u8 {
        /// Nametable select bit 0.
        const NAMETABLE_LO = 1 << 0;
        /// Nametable select bit 1.
        const NAMETABLE_HI = 1 << 1;
        /// VRAM address increment: 1 across, 32 down.
        const VRAM_INCREMENT = 1 << 2;
        /// Sprite pattern table for 8x8 sprites.
        const SPRITE_TABLE = 1 << 3;
        /// Background pattern table.
        const BG_TABLE = 1 << 4;
        /// 8x16 sprite mode.
        const SPRITE_SIZE = 1 << 5;
        /// Master/slave select.
        const MASTER_SLAVE = 1 << 6;
        /// NMI on VBlank.
        const NMI_ENABLE = 1 << 7;
    }
}

impl Ctrl {
    /// VRAM address step applied after each PPUDATA access.
    #[must_use]
    #[inline]
    pub const fn vram_increment(self) -> u16 {
        if self.contains(Self::VRAM_INCREMENT) { 32 } else { 1 }
    }

    /// Pattern table base for background tiles.
    #[must_use]
    #[inline]
    pub const fn bg_table(self) -> u16 {
        if self.contains(Self::BG_TABLE) { 0x1000 } else { 0x0000 }
    }

    /// Pattern table base for 8x8 sprites (8x16 sprites pick per-tile).
    #[must_use]
    #[inline]
    pub const fn sprite_table(self) -> u16 {
        if self.contains(Self::SPRITE_TABLE) { 0x1000 } else { 0x0000 }
    }

    /// Sprite height in pixels: 8 or 16.
    #[must_use]
    #[inline]
    pub const fn sprite_height(self) -> u16 {
        if self.contains(Self::SPRITE_SIZE) { 16 } else { 8 }
    }

    /// Whether VBlank raises an NMI.
    #[must_use]
    #[inline]
    pub const fn nmi_enabled(self) -> bool {
        self.contains(Self::NMI_ENABLE)
    }
}
