//! PPU mask register ($2001).

use bitflags::bitflags;

bitflags! {
    /// PPUMASK flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Mask: u8 {
        /// Greyscale output.
        const GREYSCALE = 1 << 0;
        /// Show background in the leftmost 8 pixels.
        const BG_LEFT = 1 << 1;
        /// Show sprites in the leftmost 8 pixels.
        const SPRITES_LEFT = 1 << 2;
        /// Background rendering enable.
        const BG_ENABLE = 1 << 3;
        /// Sprite rendering enable.
        const SPRITES_ENABLE = 1 << 4;
        /// Emphasize red.
        const EMPHASIZE_RED = 1 << 5;
        /// Emphasize green.
        const EMPHASIZE_GREEN = 1 << 6;
        /// Emphasize blue.
        const EMPHASIZE_BLUE = 1 << 7;
    }
}

impl Mask {
    /// Background layer enabled.
    #[must_use]
    #[inline]
    pub const fn show_background(self) -> bool {
        self.contains(Self::BG_ENABLE)
    }

    /// Sprite layer enabled.
    #[must_use]
    #[inline]
    pub const fn show_sprites(self) -> bool {
        self.contains(Self::SPRITES_ENABLE)
    }

    /// Either layer enabled; gates the scroll/fetch machinery.
    #[must_use]
    #[inline]
    pub const fn rendering_enabled(self) -> bool {
        self.intersects(Self::BG_ENABLE.union(Self::SPRITES_ENABLE))
    }

    /// Background visible in columns 0-7.
    #[must_use]
    #[inline]
    pub const fn background_left(self) -> bool {
        self.contains(Self::BG_LEFT)
    }

    /// Sprites visible in columns 0-7.
    #[must_use]
    #[inline]
    pub const fn sprites_left(self) -> bool {
        self.contains(Self::SPRITES_LEFT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendering_enable_is_either_layer() {
        assert!(!Mask::empty().rendering_enabled());
        assert!(Mask::BG_ENABLE.rendering_enabled());
        assert!(Mask::SPRITES_ENABLE.rendering_enabled());
        assert!((Mask::BG_ENABLE | Mask::SPRITES_ENABLE).rendering_enabled());
    }
}
