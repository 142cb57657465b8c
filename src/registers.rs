//! Storage and accessors for the SM83 register file. See [`Registers`].

use bitflags::bitflags;

/// The eight 8-bit registers, addressable individually and as four 16-bit
/// pairs. Each pair is stored as a single `u16`; halves are read/written
/// through [`Registers::get_r8`]/[`Registers::set_r8`] so no byte order of
/// the host platform ever leaks to callers.
#[derive(Default)]
pub struct Registers {
    a: u8,
    flags: Flags,
    bc: u16,
    de: u16,
    hl: u16,
    sp: u16,
    pc: u16,
}

bitflags! {
    /// `F`, the flag register. Only the upper nibble is meaningful; the
    /// lower nibble always reads back as zero (see [`Registers::set_r16`]
    /// for the `AF` write path that enforces this).
    #[derive(Default)]
    pub struct Flags: u8 {
        const Z = 0b_1000_0000;
        const N = 0b_0100_0000;
        const H = 0b_0010_0000;
        const C = 0b_0001_0000;
    }
}

/// The `r8` operand class (spec §4.3.2), minus `[HL]` — that one is not a
/// register at all and is modeled separately as [`crate::cpu::Operand8`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum R8 {
    B,
    C,
    D,
    E,
    H,
    L,
    A,
}

/// The `r16` operand class: general-purpose 16-bit registers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum R16 {
    BC,
    DE,
    HL,
    SP,
}

/// The `r16stk` operand class, used by PUSH/POP.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum R16Stk {
    BC,
    DE,
    HL,
    AF,
}

/// The `r16mem` operand class: address-only, with HL auto-increment/decrement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum R16Mem {
    BC,
    DE,
    HLIncr,
    HLDecr,
}

/// The `cond` operand class used by conditional jumps, calls and returns.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cond {
    NZ,
    Z,
    NC,
    C,
}

impl Registers {
    pub fn new() -> Registers {
        Registers::default()
    }

    pub fn get_r8(&self, r: R8) -> u8 {
        match r {
            R8::A => self.a,
            R8::B => self.bc.to_le_bytes()[1],
            R8::C => self.bc.to_le_bytes()[0],
            R8::D => self.de.to_le_bytes()[1],
            R8::E => self.de.to_le_bytes()[0],
            R8::H => self.hl.to_le_bytes()[1],
            R8::L => self.hl.to_le_bytes()[0],
        }
    }

    pub fn set_r8(&mut self, r: R8, val: u8) {
        if let R8::A = r {
            self.a = val;
            return;
        }

        let r16 = match r {
            R8::B | R8::C => &mut self.bc,
            R8::D | R8::E => &mut self.de,
            R8::H | R8::L => &mut self.hl,
            R8::A => unreachable!(),
        };

        let mut bytes = r16.to_le_bytes();
        match r {
            R8::B | R8::D | R8::H => bytes[1] = val,
            R8::C | R8::E | R8::L => bytes[0] = val,
            R8::A => unreachable!(),
        }

        *r16 = u16::from_le_bytes(bytes);
    }

    pub fn get_r16(&self, rr: R16) -> u16 {
        match rr {
            R16::BC => self.bc,
            R16::DE => self.de,
            R16::HL => self.hl,
            R16::SP => self.sp,
        }
    }

    pub fn set_r16(&mut self, rr: R16, val: u16) {
        match rr {
            R16::BC => self.bc = val,
            R16::DE => self.de = val,
            R16::HL => self.hl = val,
            R16::SP => self.sp = val,
        }
    }

    pub fn get_r16stk(&self, rr: R16Stk) -> u16 {
        match rr {
            R16Stk::BC => self.bc,
            R16Stk::DE => self.de,
            R16Stk::HL => self.hl,
            R16Stk::AF => u16::from_le_bytes([self.flags.bits(), self.a]),
        }
    }

    /// Popping into `AF` forces the low nibble of `F` back to zero no matter
    /// what bits were actually on the stack (spec §8 scenario 6).
    pub fn set_r16stk(&mut self, rr: R16Stk, val: u16) {
        match rr {
            R16Stk::BC => self.bc = val,
            R16Stk::DE => self.de = val,
            R16Stk::HL => self.hl = val,
            R16Stk::AF => {
                let bytes = val.to_le_bytes();
                self.flags = Flags::from_bits_truncate(bytes[0]);
                self.a = bytes[1];
            }
        }
    }

    pub fn hl(&self) -> u16 {
        self.hl
    }

    pub fn set_hl(&mut self, val: u16) {
        self.hl = val;
    }

    pub fn sp(&self) -> u16 {
        self.sp
    }

    pub fn set_sp(&mut self, val: u16) {
        self.sp = val;
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn set_pc(&mut self, val: u16) {
        self.pc = val;
    }

    pub fn a(&self) -> u8 {
        self.a
    }

    pub fn set_a(&mut self, val: u8) {
        self.a = val;
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.flags
    }
}

impl R16Mem {
    /// Resolves the addressed register pair (`HL` for the two auto-stepping
    /// variants) without performing the post-increment/-decrement itself —
    /// callers apply that after the bus access completes, in whichever
    /// M-cycle the micro-sequence says it's free to happen.
    pub fn reg(self) -> R16 {
        match self {
            R16Mem::BC => R16::BC,
            R16Mem::DE => R16::DE,
            R16Mem::HLIncr | R16Mem::HLDecr => R16::HL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_pair_round_trip() {
        for pair in [R16::BC, R16::DE, R16::HL, R16::SP] {
            let mut reg = Registers::new();
            for v in [0x0000u16, 0x00FFu16, 0xFF00u16, 0x1234u16, 0xFFFFu16] {
                reg.set_r16(pair, v);
                assert_eq!(reg.get_r16(pair), v);
            }
        }
    }

    #[test]
    fn half_register_writes_are_visible_through_the_pair() {
        let mut reg = Registers::new();
        reg.set_r8(R8::B, 0x12);
        reg.set_r8(R8::C, 0x34);
        assert_eq!(reg.get_r16(R16::BC), 0x1234);

        reg.set_r16(R16::BC, 0xABCD);
        assert_eq!(reg.get_r8(R8::B), 0xAB);
        assert_eq!(reg.get_r8(R8::C), 0xCD);
    }

    #[test]
    fn f_low_nibble_is_always_zero() {
        let mut reg = Registers::new();
        for byte in 0u16..=0xFF {
            reg.set_r16stk(R16Stk::AF, (byte << 8) | 0xFF);
            assert_eq!(reg.get_r16stk(R16Stk::AF) & 0x000F, 0);
        }
    }
}
