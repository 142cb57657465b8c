//! Storage for the `IF`/`IE` registers and the interrupt-priority scan used
//! by the dispatch sequence in spec §4.3.5.

use crate::util::BitOps;

/// All five interrupt sources, in dispatch-priority order (lowest bit
/// wins when more than one is pending simultaneously).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Interrupt {
    VBlank,
    LcdStat,
    Timer,
    Serial,
    Joypad,
}

impl Interrupt {
    pub fn bit(self) -> u8 {
        match self {
            Interrupt::VBlank => 0,
            Interrupt::LcdStat => 1,
            Interrupt::Timer => 2,
            Interrupt::Serial => 3,
            Interrupt::Joypad => 4,
        }
    }

    pub fn mask(self) -> u8 {
        1 << self.bit()
    }

    /// The handler vector this interrupt dispatches to: `0x40 + index * 8`.
    pub fn vector(self) -> u16 {
        0x40 + (self.bit() as u16) * 8
    }

    fn from_bit(bit: u8) -> Interrupt {
        match bit {
            0 => Interrupt::VBlank,
            1 => Interrupt::LcdStat,
            2 => Interrupt::Timer,
            3 => Interrupt::Serial,
            4 => Interrupt::Joypad,
            _ => unreachable!("interrupt bit out of range"),
        }
    }
}

/// The top three bits of `IF` are unused and always read back as 1.
const IF_MASK: u8 = 0b_1110_0000;

/// Storage for `IF` (`0xFF0F`) and `IE` (`0xFFFF`), plus the priority query
/// the CPU uses between instructions.
pub struct InterruptRegs {
    if_reg: u8,
    ie_reg: u8,
}

impl InterruptRegs {
    pub fn new() -> InterruptRegs {
        InterruptRegs {
            if_reg: IF_MASK,
            ie_reg: 0x00,
        }
    }

    pub fn read_if(&self) -> u8 {
        self.if_reg
    }

    pub fn write_if(&mut self, val: u8) {
        self.if_reg = val | IF_MASK;
    }

    pub fn read_ie(&self) -> u8 {
        self.ie_reg
    }

    pub fn write_ie(&mut self, val: u8) {
        self.ie_reg = val;
    }

    pub fn request(&mut self, interrupt: Interrupt) {
        self.if_reg |= interrupt.mask();
    }

    pub fn clear(&mut self, interrupt: Interrupt) {
        self.if_reg &= !interrupt.mask();
    }

    /// Any `IE & IF` bit set, regardless of `IME` — used to wake the CPU
    /// from `HALT` (spec §4.3.4, §4.3.5: recognition ignores `IME`, only
    /// dispatch requires it).
    pub fn any_pending(&self) -> bool {
        self.if_reg & self.ie_reg & 0x1F != 0
    }

    /// The highest-priority pending-and-enabled interrupt, if any.
    pub fn highest_priority(&self) -> Option<Interrupt> {
        let pending = self.if_reg & self.ie_reg & 0x1F;
        (0..5).find(|&bit| pending.bit(bit)).map(Interrupt::from_bit)
    }
}

impl Default for InterruptRegs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn if_register_always_reads_top_bits_set() {
        let mut ir = InterruptRegs::new();
        ir.write_if(0x00);
        assert_eq!(ir.read_if(), IF_MASK);
    }

    #[test]
    fn priority_favors_lower_bit() {
        let mut ir = InterruptRegs::new();
        ir.write_ie(0xFF);
        ir.request(Interrupt::Timer);
        ir.request(Interrupt::VBlank);
        assert_eq!(ir.highest_priority(), Some(Interrupt::VBlank));
    }

    #[test]
    fn disabled_interrupt_is_not_reported() {
        let mut ir = InterruptRegs::new();
        ir.write_ie(0x00);
        ir.request(Interrupt::VBlank);
        assert_eq!(ir.highest_priority(), None);
        assert!(!ir.any_pending());
    }

    #[test]
    fn clear_removes_only_that_bit() {
        let mut ir = InterruptRegs::new();
        ir.write_ie(0xFF);
        ir.request(Interrupt::VBlank);
        ir.request(Interrupt::Timer);
        ir.clear(Interrupt::VBlank);
        assert_eq!(ir.highest_priority(), Some(Interrupt::Timer));
    }
}
