//! NES cartridge handling.
//!
//! This crate owns everything the rest of the emulator needs to know about a
//! game cartridge: parsing the iNES container format, validating the image
//! against NROM (mapper 0) constraints, and serving read-only PRG/CHR byte
//! access with the NROM address masking applied.
//!
//! # Memory Map
//!
//! ```text
//! CPU:
//! $8000-$FFFF: PRG-ROM (a 16KB image mirrors into both halves)
//!
//! PPU:
//! $0000-$1FFF: 8KB CHR-ROM, or CHR-RAM when the header declares no CHR
//! ```

mod cartridge;
mod ines;
mod mirroring;

pub use cartridge::Cartridge;
pub use ines::{Rom, RomError, RomHeader};
pub use mirroring::Mirroring;
