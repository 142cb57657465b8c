//! Cartridge ROM file format and header parsing (spec §6). The core treats
//! cartridge loading as an external collaborator; this module's only job is
//! to validate the documented header contract and hand back a [`Mapper`]
//! the bus can route through — at this milestone, always a
//! [`RomOnlyMapper`], since cartridge type `0x00` is the only mandatory one.

use num_enum::TryFromPrimitive;
use std::convert::TryFrom;

use crate::error::CartridgeError;
use crate::mapper::RomOnlyMapper;

/// Cartridge-type byte at header offset `0x147`. Recognizing the full table
/// (not just `ROM_ONLY`) lets [`load`] report precisely which mapper a ROM
/// asked for when rejecting it.
#[allow(non_camel_case_types)]
#[derive(TryFromPrimitive, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum CartridgeType {
    ROM_ONLY = 0x00,
    MBC1 = 0x01,
    MBC1_RAM = 0x02,
    MBC1_RAM_BATTERY = 0x03,
    MBC2 = 0x05,
    MBC2_BATTERY = 0x06,
    ROM_RAM = 0x08,
    ROM_RAM_BATTERY = 0x09,
    MMM01 = 0x0B,
    MMM01_RAM = 0x0C,
    MMM01_RAM_BATTERY = 0x0D,
    MBC3_TIMER_BATTERY = 0x0F,
    MBC3_TIMER_RAM_BATTERY = 0x10,
    MBC3 = 0x11,
    MBC3_RAM = 0x12,
    MBC3_RAM_BATTERY = 0x13,
    MBC5 = 0x19,
    MBC5_RAM = 0x1A,
    MBC5_RAM_BATTERY = 0x1B,
    MBC5_RUMBLE = 0x1C,
    MBC5_RUMBLE_RAM = 0x1D,
    MBC5_RUMBLE_RAM_BATTERY = 0x1E,
    POCKET_CAMERA = 0xFC,
    BANDAI_TAMA5 = 0xFD,
    HuC3 = 0xFE,
    HuC1_RAM_BATTERY = 0xFF,
}

/// ROM-size byte at header offset `0x148`.
#[derive(TryFromPrimitive, Debug, Copy, Clone)]
#[repr(u8)]
pub enum RomSize {
    Banks2 = 0x00,
    Banks4 = 0x01,
    Banks8 = 0x02,
    Banks16 = 0x03,
    Banks32 = 0x04,
    Banks64 = 0x05,
    Banks128 = 0x06,
    Banks256 = 0x07,
    Banks512 = 0x08,
}

/// RAM-size byte at header offset `0x149`.
#[derive(TryFromPrimitive, Debug, Copy, Clone)]
#[repr(u8)]
pub enum RamSize {
    RamNone = 0x00,
    Ram2Kb = 0x01,
    Ram8Kb = 0x02,
    Ram32Kb = 0x03,
    Ram128Kb = 0x04,
    Ram64Kb = 0x05,
}

/// The parsed fields of the `0x0100-0x014F` header window.
pub struct Header {
    pub title: String,
    pub cartridge_type: Option<CartridgeType>,
    pub rom_size: Option<RomSize>,
    pub ram_size: Option<RamSize>,
    pub checksum_valid: bool,
}

impl Header {
    /// Parses the header out of a full ROM image. `rom` must be at least
    /// `0x150` bytes long — callers validate overall ROM size first.
    pub fn parse(rom: &[u8]) -> Header {
        let title = rom[0x134..0x144]
            .iter()
            .copied()
            .take_while(|b| *b != 0)
            .map(char::from)
            .collect::<String>();

        let checksum = header_checksum(rom);

        Header {
            title,
            cartridge_type: CartridgeType::try_from(rom[0x147]).ok(),
            rom_size: RomSize::try_from(rom[0x148]).ok(),
            ram_size: RamSize::try_from(rom[0x149]).ok(),
            checksum_valid: checksum == rom[0x14D],
        }
    }
}

/// `x = 0; for i in 0x134..=0x14C: x = x - rom[i] - 1; x & 0xFF` (spec §6).
fn header_checksum(rom: &[u8]) -> u8 {
    let mut x = 0u8;
    for &byte in &rom[0x134..=0x14C] {
        x = x.wrapping_sub(byte).wrapping_sub(1);
    }
    x
}

fn is_valid_rom_size(len: usize) -> bool {
    (0x8000..=0x80_0000).contains(&len) && len.is_power_of_two()
}

/// Validates a raw ROM image against the documented header contract and
/// hands back a mapper. Only `ROM_ONLY` cartridges are accepted; anything
/// else is a precise, named [`CartridgeError::UnsupportedMapper`].
pub fn load(rom: Vec<u8>) -> Result<RomOnlyMapper, CartridgeError> {
    if !is_valid_rom_size(rom.len()) {
        return Err(CartridgeError::InvalidSize { len: rom.len() });
    }

    let header = Header::parse(&rom);

    if !header.checksum_valid {
        log::warn!("cartridge '{}' has an invalid header checksum", header.title);
        return Err(CartridgeError::BadHeaderChecksum {
            expected: rom[0x14D],
            actual: header_checksum(&rom),
        });
    }

    match header.cartridge_type {
        Some(CartridgeType::ROM_ONLY) => {}
        Some(other) => {
            return Err(CartridgeError::UnsupportedMapper {
                code: other as u8,
            })
        }
        None => {
            return Err(CartridgeError::UnsupportedMapper {
                code: rom[0x147],
            })
        }
    }

    if rom.len() != 0x8000 {
        return Err(CartridgeError::InvalidSize { len: rom.len() });
    }

    log::trace!("loaded ROM-only cartridge '{}'", header.title);
    Ok(RomOnlyMapper::new(rom.into_boxed_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom_with_header(ctype: u8) -> Vec<u8> {
        let mut rom = vec![0u8; 0x8000];
        rom[0x134..0x144].copy_from_slice(b"TESTGAME\0\0\0\0\0\0\0\0");
        rom[0x147] = ctype;
        rom[0x148] = 0x00;
        rom[0x149] = 0x00;
        rom[0x14D] = header_checksum(&rom);
        rom
    }

    #[test]
    fn accepts_a_well_formed_rom_only_cartridge() {
        let rom = rom_with_header(0x00);
        assert!(load(rom).is_ok());
    }

    #[test]
    fn rejects_wrong_size() {
        let rom = vec![0u8; 0x1234];
        assert!(matches!(load(rom), Err(CartridgeError::InvalidSize { .. })));
    }

    #[test]
    fn rejects_bad_checksum() {
        let mut rom = rom_with_header(0x00);
        rom[0x14D] ^= 0xFF;
        assert!(matches!(
            load(rom),
            Err(CartridgeError::BadHeaderChecksum { .. })
        ));
    }

    #[test]
    fn rejects_unsupported_mapper() {
        let rom = rom_with_header(0x01); // MBC1
        assert!(matches!(
            load(rom),
            Err(CartridgeError::UnsupportedMapper { code: 0x01 })
        ));
    }

    #[test]
    fn title_is_parsed_up_to_the_nul_terminator() {
        let rom = rom_with_header(0x00);
        let header = Header::parse(&rom);
        assert_eq!(header.title, "TESTGAME");
    }
}
