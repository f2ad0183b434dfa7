//! Per-scanline sprite evaluation and pixel selection.
//!
//! At the end of each rendering scanline the PPU scans OAM for sprites
//! intersecting the next scanline, keeps the first eight in OAM order, and
//! fetches their pattern rows. During the next scanline the selected units
//! answer per-pixel queries; the first opaque unit in OAM order wins.

use crate::oam::{Oam, Sprite, SpriteAttr};
use ferricom_cart::Cartridge;

/// A sprite selected for the current scanline, with its pattern row.
#[derive(Debug, Clone, Copy)]
struct SpriteUnit {
    x: u8,
    attr: SpriteAttr,
    pattern_lo: u8,
    pattern_hi: u8,
    is_sprite_zero: bool,
}

/// Result of a sprite pixel query.
#[derive(Debug, Clone, Copy)]
pub struct SpritePixel {
    /// 2-bit pattern value, never 0.
    pub pattern: u8,
    /// Sprite palette number (4-7).
    pub palette: u8,
    /// Sprite draws behind an opaque background pixel.
    pub behind_background: bool,
    /// The pixel came from OAM entry 0.
    pub is_sprite_zero: bool,
}

/// Outcome of evaluating OAM for one scanline.
#[derive(Debug, Default)]
pub struct ScanlineSprites {
    units: Vec<SpriteUnit>,
    /// More than eight sprites intersected the scanline.
    pub overflow: bool,
}

impl ScanlineSprites {
    /// Empty set; no sprites render until the first evaluation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            units: Vec::with_capacity(8),
            overflow: false,
        }
    }

    /// Scan OAM for sprites intersecting `scanline`, keeping the first
    /// eight in OAM order and fetching their pattern rows from CHR.
    pub fn evaluate(&mut self, oam: &Oam, cart: &Cartridge, scanline: u16, ctrl: crate::Ctrl) {
        self.units.clear();
        self.overflow = false;

        let height = ctrl.sprite_height();
        for index in 0..64 {
            let sprite = oam.sprite(index);
            // Stored Y is the top scanline minus 1
            let top = u16::from(sprite.y).wrapping_add(1);
            if scanline < top || scanline >= top + height {
                continue;
            }
            if self.units.len() == 8 {
                self.overflow = true;
                break;
            }

            let mut row = scanline - top;
            if sprite.attr.contains(SpriteAttr::FLIP_V) {
                row = height - 1 - row;
            }

            let (pattern_lo, pattern_hi) = fetch_row(cart, ctrl, &sprite, row);
            let (pattern_lo, pattern_hi) = if sprite.attr.contains(SpriteAttr::FLIP_H) {
                (pattern_lo.reverse_bits(), pattern_hi.reverse_bits())
            } else {
                (pattern_lo, pattern_hi)
            };

            self.units.push(SpriteUnit {
                x: sprite.x,
                attr: sprite.attr,
                pattern_lo,
                pattern_hi,
                is_sprite_zero: index == 0,
            });
        }
    }

    /// Drop all units (used when rendering is disabled mid-frame).
    pub fn clear(&mut self) {
        self.units.clear();
        self.overflow = false;
    }

    /// First opaque sprite pixel at screen column `x`, in OAM order.
    #[must_use]
    pub fn pixel_at(&self, x: u16) -> Option<SpritePixel> {
        for unit in &self.units {
            let left = u16::from(unit.x);
            if x < left || x >= left + 8 {
                continue;
            }
            let bit = 7 - (x - left);
            let lo = u8::from(unit.pattern_lo >> bit & 1 != 0);
            let hi = u8::from(unit.pattern_hi >> bit & 1 != 0);
            let pattern = hi << 1 | lo;
            if pattern == 0 {
                continue;
            }
            return Some(SpritePixel {
                pattern,
                palette: unit.attr.palette(),
                behind_background: unit.attr.contains(SpriteAttr::BEHIND_BACKGROUND),
                is_sprite_zero: unit.is_sprite_zero,
            });
        }
        None
    }
}

/// Fetch one pattern row for a sprite, handling 8x16 tile selection.
fn fetch_row(cart: &Cartridge, ctrl: crate::Ctrl, sprite: &Sprite, row: u16) -> (u8, u8) {
    let addr = if ctrl.sprite_height() == 16 {
        // Bit 0 of the tile index picks the pattern table; the pair of
        // tiles stacks vertically.
        let table = u16::from(sprite.tile & 0x01) * 0x1000;
        let tile = u16::from(sprite.tile & 0xFE) + u16::from(row >= 8);
        table + tile * 16 + (row & 0x07)
    } else {
        ctrl.sprite_table() + u16::from(sprite.tile) * 16 + row
    };
    (cart.chr_read(addr), cart.chr_read(addr + 8))
}
