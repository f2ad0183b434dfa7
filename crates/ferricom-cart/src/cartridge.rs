//! Cartridge image with NROM (mapper 0) addressing.
//!
//! NROM has no bank switching: the PRG image maps directly into
//! $8000-$FFFF and the CHR image into the PPU pattern tables. A 16KB PRG
//! image (NROM-128) appears twice, so the reset vector at $FFFC resolves
//! into the single bank.

use crate::{Mirroring, Rom, RomError};

/// An immutable cartridge image plus its board wiring (mirroring).
///
/// PRG is read-only; CHR is writable only when the ROM declared no CHR
/// banks and the board therefore carries 8KB of CHR-RAM.
#[derive(Debug, Clone)]
pub struct Cartridge {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_writable: bool,
    mapper: u8,
    mirroring: Mirroring,
}

impl Cartridge {
    /// Build a cartridge from a parsed ROM, validating NROM constraints.
    ///
    /// # Errors
    ///
    /// Returns [`RomError::InvalidPrgSize`] unless the PRG image is 16KB or
    /// 32KB, and [`RomError::InvalidChrSize`] unless CHR is 8KB or absent.
    pub fn from_rom(rom: Rom) -> Result<Self, RomError> {
        if rom.prg_rom.len() != 16 * 1024 && rom.prg_rom.len() != 32 * 1024 {
            return Err(RomError::InvalidPrgSize(rom.prg_rom.len()));
        }

        let chr_writable = rom.chr_rom.is_empty();
        let chr = if chr_writable {
            vec![0; 8 * 1024]
        } else if rom.chr_rom.len() == 8 * 1024 {
            rom.chr_rom
        } else {
            return Err(RomError::InvalidChrSize(rom.chr_rom.len()));
        };

        Ok(Self {
            prg_rom: rom.prg_rom,
            chr,
            chr_writable,
            mapper: rom.header.mapper,
            mirroring: rom.header.mirroring,
        })
    }

    /// Load a cartridge straight from `.nes` file bytes.
    ///
    /// # Errors
    ///
    /// Propagates [`RomError`] from parsing or NROM validation.
    pub fn load(data: &[u8]) -> Result<Self, RomError> {
        Self::from_rom(Rom::load(data)?)
    }

    /// Read a PRG byte for a CPU address in $8000-$FFFF.
    ///
    /// The offset is masked by `prg_len - 1`, so a 16KB image mirrors into
    /// the upper bank.
    #[must_use]
    #[inline]
    pub fn prg_read(&self, addr: u16) -> u8 {
        let offset = (addr as usize).wrapping_sub(0x8000) & (self.prg_rom.len() - 1);
        self.prg_rom[offset]
    }

    /// Read a CHR byte for a PPU address in $0000-$1FFF.
    #[must_use]
    #[inline]
    pub fn chr_read(&self, addr: u16) -> u8 {
        self.chr[(addr & 0x1FFF) as usize]
    }

    /// Write a CHR byte. Silently dropped on CHR-ROM boards.
    #[inline]
    pub fn chr_write(&mut self, addr: u16, value: u8) {
        if self.chr_writable {
            self.chr[(addr & 0x1FFF) as usize] = value;
        }
    }

    /// PRG-ROM size in bytes.
    #[must_use]
    pub fn prg_size(&self) -> usize {
        self.prg_rom.len()
    }

    /// Mapper number declared by the header.
    #[must_use]
    pub fn mapper(&self) -> u8 {
        self.mapper
    }

    /// Nametable mirroring fixed by the board.
    #[must_use]
    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}
