//! A cycle-accurate SM83 (Sharp LR35902 / Game Boy CPU) interpreter core.
//!
//! [`Cpu::step`] advances the machine by exactly one M-cycle, issuing at
//! most one external bus access in the process (spec §4.3.1). Everything
//! else here exists to give that one method something to run against: a
//! [`Bus`] implementation ([`MemoryBus`]), the [`Mapper`] it routes ROM/RAM
//! accesses through, and a [`cartridge::Header`] parser to build one from a
//! raw ROM image.

mod cartridge;
pub mod cpu;
mod error;
mod interrupt;
mod mapper;
mod registers;
mod util;

pub mod bus;

pub use bus::{Bus, MemoryBus};
pub use cartridge::{CartridgeType, Header, RamSize, RomSize, load};
pub use cpu::{Cond, Cpu, Operand8, R16Mem, R16Stk};
pub use error::CartridgeError;
pub use interrupt::{Interrupt, InterruptRegs};
pub use mapper::{Mapper, RomOnlyMapper};
pub use registers::{Flags, R8, R16, Registers};
