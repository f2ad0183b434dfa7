//! NES 2C02 PPU emulation.
//!
//! Scanline-based renderer for the NES picture processor: background tile
//! pipeline with the standard v/t/x/w scroll register dynamics, per-scanline
//! sprite evaluation with priority and sprite-0 hit, palette RAM with its
//! hardware aliases, and the CPU-facing register file at $2000-$2007.
//!
//! The PPU runs three dots per CPU cycle; the system driver calls
//! [`Ppu::clock`] accordingly and watches [`Ppu::take_nmi_request`] and
//! [`Ppu::take_frame_done`] for VBlank and frame boundaries. Pattern table
//! accesses are routed to the [`ferricom_cart::Cartridge`] passed into each
//! call; nametable and palette memory live inside the PPU.

mod background;
mod ctrl;
mod mask;
mod oam;
mod palette;
mod ppu;
mod scroll;
mod sprite;
mod status;
mod vram;

pub use ctrl::Ctrl;
pub use mask::Mask;
pub use oam::{Oam, Sprite, SpriteAttr};
pub use palette::{argb, MASTER_PALETTE};
pub use ppu::{Ppu, FRAME_HEIGHT, FRAME_WIDTH};
pub use scroll::Scroll;
pub use sprite::{ScanlineSprites, SpritePixel};
pub use status::PpuStatus;
pub use vram::Vram;
