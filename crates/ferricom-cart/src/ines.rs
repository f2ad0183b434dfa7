//! iNES file format parsing.
//!
//! The iNES container is a 16-byte header followed by an optional 512-byte
//! trainer, the PRG-ROM banks, and the CHR-ROM banks:
//!
//! ```text
//! Byte 0-3: Magic "NES" followed by MS-DOS EOF (0x4E 0x45 0x53 0x1A)
//! Byte 4:   PRG-ROM size in 16KB units
//! Byte 5:   CHR-ROM size in 8KB units (0 means the board carries CHR-RAM)
//! Byte 6:   Flags 6 (mirroring, battery, trainer, mapper low nibble)
//! Byte 7:   Flags 7 (mapper high nibble)
//! ```

use crate::Mirroring;

/// Errors raised while parsing an iNES file.
#[derive(Debug, thiserror::Error)]
pub enum RomError {
    /// File is too small to contain the 16-byte header.
    #[error("ROM file too small: expected at least 16 bytes, got {0}")]
    FileTooSmall(usize),

    /// The header does not start with the iNES magic number.
    #[error("invalid iNES magic number: expected [4E 45 53 1A], got {0:02X?}")]
    InvalidMagic([u8; 4]),

    /// The header declares zero PRG banks.
    #[error("PRG-ROM size cannot be 0")]
    EmptyPrg,

    /// The file is shorter than the header-declared PRG/CHR payload.
    #[error("ROM file truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes the header says the file should hold.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },

    /// PRG image size is not valid for NROM (16KB or 32KB).
    #[error("NROM requires a 16KB or 32KB PRG-ROM, got {0} bytes")]
    InvalidPrgSize(usize),

    /// CHR image size is not valid for NROM (8KB, or 0 for CHR-RAM).
    #[error("NROM requires an 8KB CHR-ROM (or none), got {0} bytes")]
    InvalidChrSize(usize),
}

/// Parsed iNES header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomHeader {
    /// PRG-ROM size in bytes.
    pub prg_rom_size: usize,
    /// CHR-ROM size in bytes (0 indicates CHR-RAM).
    pub chr_rom_size: usize,
    /// Mapper number from the flag 6/7 high nibbles.
    pub mapper: u8,
    /// Nametable mirroring mode.
    pub mirroring: Mirroring,
    /// 512-byte trainer present before PRG-ROM.
    pub has_trainer: bool,
}

impl RomHeader {
    /// iNES magic number: "NES" followed by MS-DOS EOF.
    const MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];

    /// Parse the first 16 bytes of an iNES file.
    ///
    /// # Errors
    ///
    /// Returns [`RomError`] if the data is shorter than a header, the magic
    /// number is wrong, or the header declares zero PRG banks.
    pub fn parse(data: &[u8]) -> Result<Self, RomError> {
        if data.len() < 16 {
            return Err(RomError::FileTooSmall(data.len()));
        }

        let magic = [data[0], data[1], data[2], data[3]];
        if magic != Self::MAGIC {
            return Err(RomError::InvalidMagic(magic));
        }

        let prg_rom_size = data[4] as usize * 16 * 1024;
        let chr_rom_size = data[5] as usize * 8 * 1024;
        if prg_rom_size == 0 {
            return Err(RomError::EmptyPrg);
        }

        let mirroring = if data[6] & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        let has_trainer = data[6] & 0x04 != 0;
        let mapper = (data[7] & 0xF0) | (data[6] >> 4);

        Ok(Self {
            prg_rom_size,
            chr_rom_size,
            mapper,
            mirroring,
            has_trainer,
        })
    }
}

/// A fully loaded iNES file: header plus PRG/CHR payloads.
#[derive(Debug, Clone)]
pub struct Rom {
    /// Parsed header.
    pub header: RomHeader,
    /// PRG-ROM bytes (program code).
    pub prg_rom: Vec<u8>,
    /// CHR-ROM bytes (graphics), empty when the board uses CHR-RAM.
    pub chr_rom: Vec<u8>,
}

impl Rom {
    /// Load a ROM from the raw bytes of a `.nes` file.
    ///
    /// The trainer block, when present, is skipped without interpretation.
    /// A mapper other than 0 is accepted with a warning; execution then
    /// proceeds with NROM semantics and the game's behavior is undefined.
    ///
    /// # Errors
    ///
    /// Returns [`RomError`] if the header is malformed or the file is
    /// shorter than the PRG/CHR sizes it declares.
    pub fn load(data: &[u8]) -> Result<Self, RomError> {
        let header = RomHeader::parse(data)?;

        if header.mapper != 0 {
            log::warn!(
                "unsupported mapper {}: continuing with NROM semantics",
                header.mapper
            );
        }

        let mut offset = 16;
        if header.has_trainer {
            offset += 512;
        }

        let expected = offset + header.prg_rom_size + header.chr_rom_size;
        if data.len() < expected {
            return Err(RomError::Truncated {
                expected,
                actual: data.len(),
            });
        }

        let prg_rom = data[offset..offset + header.prg_rom_size].to_vec();
        offset += header.prg_rom_size;
        let chr_rom = data[offset..offset + header.chr_rom_size].to_vec();

        Ok(Self {
            header,
            prg_rom,
            chr_rom,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(prg_banks: u8, chr_banks: u8, flags6: u8, flags7: u8) -> Vec<u8> {
        let mut data = vec![0x4E, 0x45, 0x53, 0x1A, prg_banks, chr_banks, flags6, flags7];
        data.extend_from_slice(&[0; 8]);
        data
    }

    fn rom_bytes(prg_banks: u8, chr_banks: u8, flags6: u8) -> Vec<u8> {
        let mut data = header_bytes(prg_banks, chr_banks, flags6, 0);
        data.extend(std::iter::repeat(0xEA).take(prg_banks as usize * 16 * 1024));
        data.extend(std::iter::repeat(0x55).take(chr_banks as usize * 8 * 1024));
        data
    }

    #[test]
    fn parses_valid_header() {
        let header = RomHeader::parse(&header_bytes(2, 1, 0x01, 0)).unwrap();
        assert_eq!(header.prg_rom_size, 32 * 1024);
        assert_eq!(header.chr_rom_size, 8 * 1024);
        assert_eq!(header.mapper, 0);
        assert_eq!(header.mirroring, Mirroring::Vertical);
        assert!(!header.has_trainer);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = header_bytes(1, 1, 0, 0);
        data[3] = 0x00;
        assert!(matches!(
            RomHeader::parse(&data),
            Err(RomError::InvalidMagic(_))
        ));
    }

    #[test]
    fn rejects_short_file() {
        assert!(matches!(
            RomHeader::parse(&[0x4E, 0x45, 0x53]),
            Err(RomError::FileTooSmall(3))
        ));
    }

    #[test]
    fn rejects_zero_prg() {
        assert!(matches!(
            RomHeader::parse(&header_bytes(0, 1, 0, 0)),
            Err(RomError::EmptyPrg)
        ));
    }

    #[test]
    fn mapper_nibbles_combine() {
        let header = RomHeader::parse(&header_bytes(1, 1, 0x40, 0x20)).unwrap();
        assert_eq!(header.mapper, 0x24);
    }

    #[test]
    fn loads_prg_and_chr() {
        let rom = Rom::load(&rom_bytes(1, 1, 0)).unwrap();
        assert_eq!(rom.prg_rom.len(), 16 * 1024);
        assert_eq!(rom.chr_rom.len(), 8 * 1024);
        assert_eq!(rom.prg_rom[0], 0xEA);
        assert_eq!(rom.chr_rom[0], 0x55);
    }

    #[test]
    fn trainer_block_is_skipped() {
        let mut data = header_bytes(1, 0, 0x04, 0);
        data.extend(std::iter::repeat(0xFF).take(512));
        data.extend(std::iter::repeat(0x42).take(16 * 1024));

        let rom = Rom::load(&data).unwrap();
        assert!(rom.header.has_trainer);
        assert_eq!(rom.prg_rom[0], 0x42);
    }

    #[test]
    fn rejects_truncated_payload() {
        let mut data = header_bytes(2, 1, 0, 0);
        data.extend(std::iter::repeat(0).take(1024));
        assert!(matches!(
            Rom::load(&data),
            Err(RomError::Truncated { .. })
        ));
    }
}
